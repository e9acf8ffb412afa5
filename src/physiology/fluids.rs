//! Fluid balance bookkeeping

use serde::{Deserialize, Serialize};

/// Volumes infused during one tick, by class (mL)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FluidInfusion {
    pub crystalloid: f64,
    pub colloid: f64,
    pub blood: f64,
}

impl FluidInfusion {
    pub fn total(&self) -> f64 {
        self.crystalloid + self.colloid + self.blood
    }

    pub fn add(&mut self, other: &FluidInfusion) {
        self.crystalloid += other.crystalloid;
        self.colloid += other.colloid;
        self.blood += other.blood;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FluidOutput {
    pub urine: f64,
    pub insensible: f64,
    /// Ongoing hemorrhage
    pub blood_loss: f64,
}

impl FluidOutput {
    pub fn total(&self) -> f64 {
        self.urine + self.insensible + self.blood_loss
    }
}

/// Running totals since case start (mL)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FluidBalance {
    pub total_input: f64,
    pub total_output: f64,
    pub net_balance: f64,
    pub input: FluidInfusion,
    pub output: FluidOutput,
    /// Urine over the last tick, mL/h
    pub urine_rate_ml_h: f64,
}

impl FluidBalance {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one tick of input and output and refresh the totals
    pub fn record(&mut self, infused: &FluidInfusion, out: &FluidOutput, dt: f64) {
        self.input.add(infused);
        self.output.urine += out.urine;
        self.output.insensible += out.insensible;
        self.output.blood_loss += out.blood_loss;
        self.total_input = self.input.total();
        self.total_output = self.output.total();
        self.net_balance = self.total_input - self.total_output;
        if dt > 0.0 {
            self.urine_rate_ml_h = out.urine / dt * 60.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_net_balance_is_input_minus_output() {
        let mut balance = FluidBalance::new();
        let infused = FluidInfusion {
            crystalloid: 500.0,
            blood: 300.0,
            ..Default::default()
        };
        let out = FluidOutput {
            urine: 50.0,
            insensible: 10.0,
            blood_loss: 0.0,
        };
        balance.record(&infused, &out, 60.0);
        assert_eq!(balance.total_input, 800.0);
        assert_eq!(balance.total_output, 60.0);
        assert_eq!(balance.net_balance, 740.0);
        assert_eq!(balance.urine_rate_ml_h, 50.0);
    }
}
