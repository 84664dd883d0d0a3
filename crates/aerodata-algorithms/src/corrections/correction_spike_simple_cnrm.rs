//! Simple spike detection and correction.

use aerodata_core::metadata::{AlgorithmMetadata, AttrValue, VariableMetadata};
use aerodata_core::{now_iso, Algorithm, AlgorithmCore, CoreResult};
use ndarray::{ArrayD, IxDyn};

use crate::{expect_inputs, scalar};

/// Detects samples departing from both neighbours by more than a
/// threshold, in the same direction, and replaces them with the mean of
/// the surrounding values. Not suited to naturally discontinuous signals.
///
/// Inputs: `X` (any units), `S0` (threshold, same units as `X`,
/// positive). Output: `X_corr` (input units).
pub struct CorrectionSpikeSimpleCnrm {
    core: AlgorithmCore,
}

impl CorrectionSpikeSimpleCnrm {
    pub fn new() -> CorrectionSpikeSimpleCnrm {
        let output = VariableMetadata::new([
            ("units", AttrValue::from("input0")),
            ("long_name", "input0 corrected".into()),
            ("standard_name", "input0".into()),
            ("Category", AttrValue::Strs(vec!["".to_string()])),
        ]);
        let metadata = AlgorithmMetadata::new([
            ("Inputs", AttrValue::from(&["X", "S0"][..])),
            ("InputTypes", AttrValue::from(&["vector", "coeff"][..])),
            (
                "InputDescription",
                AttrValue::from(
                    &[
                        "Parameter for analysis",
                        "Spike detection threshold (same units as X, must be positive)",
                    ][..],
                ),
            ),
            ("Outputs", AttrValue::from(&["X_corr"][..])),
            ("OutputUnits", AttrValue::from(&["input0"][..])),
            ("OutputTypes", AttrValue::from(&["vector"][..])),
            (
                "OutputDescription",
                AttrValue::from(&["Parameter with corrections applied"][..]),
            ),
            (
                "Purpose",
                "Detects and corrects spikes which exceed a specific threshold".into(),
            ),
            (
                "Description",
                "This algorithm detects spikes exceeding a specified threshold and corrects \
                 the spike with a mean of the surrounding values. This algorithm does not \
                 apply well to variables that are naturally discontinuous"
                    .into(),
            ),
            ("Category", "Corrections".into()),
            ("Source", "CNRM/GMEI/TRAMM".into()),
            ("Processor", "CorrectionSpikeSimpleCnrm".into()),
            ("ProcessorDate", "2012-02-07".into()),
            ("ProcessorVersion", "1.1".into()),
            ("DateProcessed", now_iso().into()),
        ]);
        CorrectionSpikeSimpleCnrm {
            core: AlgorithmCore::define(metadata, vec![None, None], vec![output]),
        }
    }
}

impl Default for CorrectionSpikeSimpleCnrm {
    fn default() -> Self {
        Self::new()
    }
}

impl Algorithm for CorrectionSpikeSimpleCnrm {
    fn core(&self) -> &AlgorithmCore {
        &self.core
    }

    fn kernel(&self, inputs: &[ArrayD<f64>]) -> CoreResult<Vec<ArrayD<f64>>> {
        let [x, s0] = expect_inputs::<2>(inputs, "CorrectionSpikeSimpleCnrm")?;
        let s0 = scalar(s0, "S0")?;
        let x: Vec<f64> = x.iter().copied().collect();
        let mut corrected = x.clone();

        for i in 1..x.len().saturating_sub(1) {
            let to_prev = x[i] - x[i - 1];
            let to_next = x[i] - x[i + 1];
            if to_prev.abs() > s0 && to_next.abs() > s0 && to_prev * to_next > 0.0 {
                corrected[i] = (x[i - 1] + x[i + 1]) / 2.0;
            }
        }
        Ok(vec![ArrayD::from_shape_vec(
            IxDyn(&[corrected.len()]),
            corrected,
        )
        .map_err(|e| aerodata_core::CoreError::Shape(e.to_string()))?])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aerodata_core::Quantity;

    #[test]
    fn test_spike_removed() {
        let alg = CorrectionSpikeSimpleCnrm::new();
        let mut x = Quantity::new(vec![1.0, 1.1, 9.0, 1.2, 1.3], "hPa").unwrap();
        x.metadata.insert("standard_name", "air_pressure");
        x.metadata.insert("long_name", "static pressure");
        let out = alg.run_single(&[(&x).into(), 2.0.into()]).unwrap();

        assert!((out.value()[[2]] - (1.1 + 1.2) / 2.0).abs() < 1e-12);
        assert_eq!(out.value()[[0]], 1.0);
        // Output metadata mirrors the corrected input.
        assert_eq!(out.metadata.get_str("units"), Some("hPa"));
        assert_eq!(
            out.metadata.get_str("long_name"),
            Some("static pressure corrected")
        );
        assert_eq!(out.metadata.get_str("standard_name"), Some("air_pressure"));
    }

    #[test]
    fn test_step_change_untouched() {
        // A genuine level shift departs from only one neighbour.
        let alg = CorrectionSpikeSimpleCnrm::new();
        let x = Quantity::new(vec![1.0, 1.0, 9.0, 9.0, 9.0], "m").unwrap();
        let out = alg.run_single(&[x.into(), 2.0.into()]).unwrap();
        assert_eq!(out.value()[[2]], 9.0);
    }
}
