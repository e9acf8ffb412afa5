//! Shock Sim - Circulatory Shock Simulation for Clinical Education
//!
//! A deterministic, tick-based model of a patient in shock. Each tick runs
//! the archetype's untreated progression, the composed effect of running
//! interventions, autonomic compensation and lab kinetics, then hands the
//! new state to the outcome state machine.

pub mod core;
pub mod outcome;
pub mod patient;
pub mod physiology;
pub mod shock;
pub mod simulation;
pub mod treatment;
