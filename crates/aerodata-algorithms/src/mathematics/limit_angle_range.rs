//! Fold angles into the [0, 360) range.

use aerodata_core::metadata::{AlgorithmMetadata, AttrValue, VariableMetadata};
use aerodata_core::{now_iso, Algorithm, AlgorithmCore, CoreResult};
use ndarray::ArrayD;

use crate::expect_inputs;

/// Limits angles of arbitrary sign and magnitude to [0, 360) degrees.
pub struct LimitAngleRange {
    core: AlgorithmCore,
}

impl LimitAngleRange {
    pub fn new() -> LimitAngleRange {
        let output = VariableMetadata::new([
            ("units", AttrValue::from("deg")),
            ("long_name", "".into()),
            ("standard_name", "".into()),
            ("Category", AttrValue::Strs(vec!["".to_string()])),
        ]);
        let metadata = AlgorithmMetadata::new([
            ("Inputs", AttrValue::from(&["angle"][..])),
            ("InputTypes", AttrValue::from(&["vector"][..])),
            ("Outputs", AttrValue::from(&["angle_limited"][..])),
            ("Purpose", "Limit angles to the range between 0 and 360 degrees".into()),
            ("Category", "Mathematics".into()),
            ("Processor", "LimitAngleRange".into()),
            ("ProcessorDate", "2012-09-20".into()),
            ("ProcessorVersion", "1.1".into()),
            ("DateProcessed", now_iso().into()),
        ]);
        LimitAngleRange {
            core: AlgorithmCore::define(metadata, vec![Some("deg")], vec![output]),
        }
    }
}

impl Default for LimitAngleRange {
    fn default() -> Self {
        Self::new()
    }
}

impl Algorithm for LimitAngleRange {
    fn core(&self) -> &AlgorithmCore {
        &self.core
    }

    fn kernel(&self, inputs: &[ArrayD<f64>]) -> CoreResult<Vec<ArrayD<f64>>> {
        let [angle] = expect_inputs::<1>(inputs, "LimitAngleRange")?;
        Ok(vec![angle.mapv(|a| a.rem_euclid(360.0))])
    }
}
