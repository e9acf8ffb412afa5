//! Physiological state model: vitals, hemodynamics, labs, fluid balance

pub mod delta;
pub mod field;
pub mod fluids;
pub mod hemodynamics;
pub mod labs;
pub mod ranges;
pub mod vitals;

pub use delta::VitalsDelta;
pub use field::PhysioField;
pub use fluids::{FluidBalance, FluidInfusion, FluidOutput};
pub use hemodynamics::HemodynamicState;
pub use labs::{Chemistry, Gasometry, Hematology, LabTimestamps, LabValues};
pub use ranges::Bounds;
pub use vitals::VitalSigns;
