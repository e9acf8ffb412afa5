//! Controlled randomization of a baseline profile
//!
//! Every field gets a bounded percentage jitter from the variance table.
//! The archetype's defining pattern is reasserted afterwards so a jittered
//! patient is still diagnosable, then lab relationships are restored.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::physiology::field::PhysioField;
use crate::physiology::ranges::{henderson_hasselbalch_ph, henderson_hasselbalch_pco2, HARD_PCO2};
use crate::shock::{ShockProfile, ShockType};

/// Maximum relative jitter per field (0.12 = ±12 %)
pub const VARIANCE_TABLE: [(PhysioField, f64); 24] = [
    (PhysioField::HeartRate, 0.12),
    (PhysioField::Systolic, 0.08),
    (PhysioField::Diastolic, 0.08),
    (PhysioField::Spo2, 0.02),
    (PhysioField::RespiratoryRate, 0.12),
    (PhysioField::Temperature, 0.01),
    (PhysioField::Cvp, 0.15),
    (PhysioField::Pcwp, 0.12),
    (PhysioField::Pvr, 0.15),
    (PhysioField::CardiacOutput, 0.12),
    (PhysioField::Svr, 0.12),
    (PhysioField::Contractility, 0.10),
    (PhysioField::Ph, 0.03),
    (PhysioField::Po2, 0.10),
    (PhysioField::Hco3, 0.08),
    (PhysioField::Lactate, 0.20),
    (PhysioField::Hemoglobin, 0.08),
    (PhysioField::Wbc, 0.15),
    (PhysioField::Platelets, 0.15),
    (PhysioField::Potassium, 0.06),
    (PhysioField::Sodium, 0.02),
    (PhysioField::Magnesium, 0.08),
    (PhysioField::Creatinine, 0.12),
    (PhysioField::Urea, 0.12),
];

/// Jitter `profile` with a seeded generator, or from entropy when `seed`
/// is `None`. `variance_scale` comes from the case difficulty.
pub fn randomize(profile: &ShockProfile, shock_type: ShockType, seed: Option<u64>, variance_scale: f64) -> ShockProfile {
    let mut rng = match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };
    randomize_with(profile, shock_type, variance_scale, &mut rng)
}

pub fn randomize_with<R: Rng>(
    profile: &ShockProfile,
    shock_type: ShockType,
    variance_scale: f64,
    rng: &mut R,
) -> ShockProfile {
    let mut out = profile.clone();
    let scale = variance_scale.max(0.0);

    for (field, variance) in VARIANCE_TABLE {
        // Draw even for absent fields so the stream does not depend on
        // which catheters are in place
        let factor = 1.0 + rng.gen_range(-1.0..=1.0) * variance * scale;
        if let Some(value) = out.field(field) {
            out.set_field(field, value * factor);
        }
    }
    out.vitals.clamp();

    shock_type.enforce_presentation(&mut out.vitals, &mut out.labs);
    reassert_lab_relationships(&mut out);
    out.refresh_derived();
    out
}

/// pCO2 follows pH and HCO3; if that pushes pCO2 out of range, pH gives way.
/// Hematocrit is reset by the lab clamp.
fn reassert_lab_relationships(profile: &mut ShockProfile) {
    let gas = &mut profile.labs.gasometry;
    gas.pco2 = HARD_PCO2.clamp(henderson_hasselbalch_pco2(gas.hco3, gas.ph));
    gas.ph = henderson_hasselbalch_ph(gas.hco3, gas.pco2);
    profile.labs.clamp();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shock::DistributiveSubtype;

    #[test]
    fn test_seeded_is_reproducible() {
        let base = ShockType::Cardiogenic.baseline_profile();
        let a = randomize(&base, ShockType::Cardiogenic, Some(42), 1.0);
        let b = randomize(&base, ShockType::Cardiogenic, Some(42), 1.0);
        let c = randomize(&base, ShockType::Cardiogenic, Some(43), 1.0);
        assert_eq!(a, b);
        assert_ne!(a.vitals, c.vitals);
    }

    #[test]
    fn test_jitter_is_bounded() {
        let base = ShockType::Distributive(DistributiveSubtype::Septic).baseline_profile();
        for seed in 0..50 {
            let out = randomize(&base, ShockType::Distributive(DistributiveSubtype::Septic), Some(seed), 1.0);
            let hr = out.vitals.heart_rate;
            assert!(hr >= base.vitals.heart_rate * 0.88 - 1e-9 && hr <= base.vitals.heart_rate * 1.12 + 1e-9);
            assert!(out.vitals.svr <= 800.0);
            assert!(out.vitals.cardiac_output >= 4.5);
        }
    }

    #[test]
    fn test_zero_variance_keeps_baseline() {
        let base = ShockType::Hypovolemic.baseline_profile();
        let out = randomize(&base, ShockType::Hypovolemic, Some(1), 0.0);
        assert_eq!(out.vitals, base.vitals);
    }

    #[test]
    fn test_lab_relationships_restored() {
        let base = ShockType::Mixed.baseline_profile();
        for seed in 0..20 {
            let out = randomize(&base, ShockType::Mixed, Some(seed), 1.4);
            let g = &out.labs.gasometry;
            assert!((henderson_hasselbalch_ph(g.hco3, g.pco2) - g.ph).abs() < 1e-6);
            let h = &out.labs.hematology;
            assert!((h.hematocrit - 3.0 * h.hemoglobin).abs() < 1e-9);
        }
    }
}
