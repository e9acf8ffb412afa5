//! Laboratory values: blood gas, hematology and chemistry panels

use serde::{Deserialize, Serialize};

use crate::core::types::Minutes;
use crate::physiology::ranges::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gasometry {
    pub ph: f64,
    pub pco2: f64,
    pub po2: f64,
    pub hco3: f64,
    /// mmol/L
    pub lactate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hematology {
    /// g/dL
    pub hemoglobin: f64,
    /// %
    pub hematocrit: f64,
    /// ×10³/µL
    pub wbc: f64,
    /// ×10³/µL
    pub platelets: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chemistry {
    pub potassium: f64,
    pub sodium: f64,
    pub magnesium: f64,
    pub chloride: f64,
    /// mg/dL
    pub creatinine: f64,
    /// mg/dL
    pub urea: f64,
}

/// Simulated minute at which each panel was last refreshed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabTimestamps {
    pub gasometry: Minutes,
    pub hematology: Minutes,
    pub chemistry: Minutes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabValues {
    pub gasometry: Gasometry,
    pub hematology: Hematology,
    pub chemistry: Chemistry,
    pub updated_at: LabTimestamps,
}

/// Urea (mg/dL) to blood urea nitrogen (mg/dL)
pub const UREA_TO_BUN: f64 = 0.467;

impl LabValues {
    pub fn normal() -> Self {
        let mut labs = Self {
            gasometry: Gasometry {
                ph: 7.40,
                pco2: 40.0,
                po2: 95.0,
                hco3: 24.0,
                lactate: 1.0,
            },
            hematology: Hematology {
                hemoglobin: 14.0,
                hematocrit: 42.0,
                wbc: 7.5,
                platelets: 250.0,
            },
            chemistry: Chemistry {
                potassium: 4.2,
                sodium: 140.0,
                magnesium: 2.0,
                chloride: 102.0,
                creatinine: 0.9,
                urea: 30.0,
            },
            updated_at: LabTimestamps::default(),
        };
        labs.clamp();
        labs
    }

    /// Hematocrit follows hemoglobin (Hct = 3 × Hb)
    pub fn reassert_hematocrit(&mut self) {
        self.hematology.hematocrit = 3.0 * self.hematology.hemoglobin;
    }

    /// BUN:creatinine ratio, 0.0 when creatinine is 0
    pub fn bun_creatinine_ratio(&self) -> f64 {
        safe_div(self.chemistry.urea * UREA_TO_BUN, self.chemistry.creatinine, 0.0)
    }

    /// Anion gap (Na - Cl - HCO3)
    pub fn anion_gap(&self) -> f64 {
        self.chemistry.sodium - self.chemistry.chloride - self.gasometry.hco3
    }

    /// Base excess estimate (Van Slyke, simplified)
    pub fn base_excess(&self) -> f64 {
        0.93 * (self.gasometry.hco3 - 24.4 + 14.8 * (self.gasometry.ph - 7.4))
    }

    /// Clamp every field to hard bounds and reassert Hct = 3 × Hb
    pub fn clamp(&mut self) {
        let g = &mut self.gasometry;
        g.ph = HARD_PH.clamp(g.ph);
        g.pco2 = HARD_PCO2.clamp(g.pco2);
        g.po2 = HARD_PO2.clamp(g.po2);
        g.hco3 = HARD_HCO3.clamp(g.hco3);
        g.lactate = HARD_LACTATE.clamp(g.lactate);

        let h = &mut self.hematology;
        h.hemoglobin = HARD_HEMOGLOBIN.clamp(h.hemoglobin);
        h.wbc = HARD_WBC.clamp(h.wbc);
        h.platelets = HARD_PLATELETS.clamp(h.platelets);

        let c = &mut self.chemistry;
        c.potassium = HARD_POTASSIUM.clamp(c.potassium);
        c.sodium = HARD_SODIUM.clamp(c.sodium);
        c.magnesium = HARD_MAGNESIUM.clamp(c.magnesium);
        c.chloride = HARD_CHLORIDE.clamp(c.chloride);
        c.creatinine = HARD_CREATININE.clamp(c.creatinine);
        c.urea = HARD_UREA.clamp(c.urea);

        self.reassert_hematocrit();
    }

    pub fn within_hard_bounds(&self) -> bool {
        let g = &self.gasometry;
        let h = &self.hematology;
        let c = &self.chemistry;
        HARD_PH.contains(g.ph)
            && HARD_PCO2.contains(g.pco2)
            && HARD_PO2.contains(g.po2)
            && HARD_HCO3.contains(g.hco3)
            && HARD_LACTATE.contains(g.lactate)
            && HARD_HEMOGLOBIN.contains(h.hemoglobin)
            && (h.hematocrit - 3.0 * h.hemoglobin).abs() < 1e-6
            && HARD_WBC.contains(h.wbc)
            && HARD_PLATELETS.contains(h.platelets)
            && HARD_POTASSIUM.contains(c.potassium)
            && HARD_SODIUM.contains(c.sodium)
            && HARD_MAGNESIUM.contains(c.magnesium)
            && HARD_CHLORIDE.contains(c.chloride)
            && HARD_CREATININE.contains(c.creatinine)
            && HARD_UREA.contains(c.urea)
    }

    pub fn touch(&mut self, now: Minutes) {
        self.updated_at = LabTimestamps {
            gasometry: now,
            hematology: now,
            chemistry: now,
        };
    }
}

impl Default for LabValues {
    fn default() -> Self {
        Self::normal()
    }
}

/// Approximate PaO2 from SpO2 (inverse oxyhemoglobin curve, piecewise)
pub fn po2_from_spo2(spo2: f64) -> f64 {
    let points = [
        (40.0, 25.0),
        (60.0, 32.0),
        (75.0, 40.0),
        (85.0, 50.0),
        (90.0, 60.0),
        (94.0, 75.0),
        (97.0, 95.0),
        (99.0, 150.0),
        (100.0, 300.0),
    ];
    let s = HARD_SPO2.clamp(spo2);
    for window in points.windows(2) {
        let (s0, p0) = window[0];
        let (s1, p1) = window[1];
        if s <= s1 {
            return p0 + (p1 - p0) * (s - s0) / (s1 - s0);
        }
    }
    300.0
}
