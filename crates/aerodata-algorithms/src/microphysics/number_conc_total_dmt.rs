//! Total number concentration from a particle sampling probe.

use aerodata_core::metadata::{AlgorithmMetadata, AttrValue, VariableMetadata};
use aerodata_core::{now_iso, Algorithm, AlgorithmCore, CoreError, CoreResult};
use ndarray::{ArrayD, Axis};

use crate::expect_inputs;

/// Sums per-bin number concentrations over the size axis.
///
/// Input: `c_i` (cm⁻³, shaped `[time, bins]`). Output: `N` (cm⁻³).
pub struct NumberConcTotalDmt {
    core: AlgorithmCore,
}

impl NumberConcTotalDmt {
    pub fn new() -> NumberConcTotalDmt {
        let output = VariableMetadata::new([
            ("units", AttrValue::from("cm^-3")),
            ("long_name", "total number concentration".into()),
            ("standard_name", "".into()),
            ("Category", AttrValue::Strs(vec!["Microphysics".to_string()])),
        ]);
        let metadata = AlgorithmMetadata::new([
            ("Inputs", AttrValue::from(&["c_i"][..])),
            ("InputTypes", AttrValue::from(&["array[time, bins]"][..])),
            (
                "InputDescription",
                AttrValue::from(&["Number concentration of hydrometeors in size category i"][..]),
            ),
            ("Outputs", AttrValue::from(&["N"][..])),
            ("OutputDescription", AttrValue::from(&["Total number concentration"][..])),
            (
                "Purpose",
                "Calculation of total number concentration given distribution of particle \
                 counts from a particle sampling probe"
                    .into(),
            ),
            ("Category", "Microphysics".into()),
            ("Processor", "NumberConcTotalDmt".into()),
            ("ProcessorDate", "2012-02-10".into()),
            ("ProcessorVersion", "1.0".into()),
            ("DateProcessed", now_iso().into()),
        ]);
        NumberConcTotalDmt {
            core: AlgorithmCore::define(metadata, vec![Some("cm^-3")], vec![output]),
        }
    }
}

impl Default for NumberConcTotalDmt {
    fn default() -> Self {
        Self::new()
    }
}

impl Algorithm for NumberConcTotalDmt {
    fn core(&self) -> &AlgorithmCore {
        &self.core
    }

    fn kernel(&self, inputs: &[ArrayD<f64>]) -> CoreResult<Vec<ArrayD<f64>>> {
        let [c_i] = expect_inputs::<1>(inputs, "NumberConcTotalDmt")?;
        if c_i.ndim() != 2 {
            return Err(CoreError::Shape(format!(
                "NumberConcTotalDmt expects a [time, bins] array, got shape {:?}",
                c_i.shape()
            )));
        }
        Ok(vec![c_i.sum_axis(Axis(1))])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aerodata_core::Quantity;
    use ndarray::IxDyn;

    #[test]
    fn test_sums_over_bins() {
        let alg = NumberConcTotalDmt::new();
        let data =
            ArrayD::from_shape_vec(IxDyn(&[2, 3]), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let q = Quantity::new(data, "cm^-3").unwrap();
        let n = alg.run_single(&[q.into()]).unwrap();
        assert_eq!(n.shape(), &[2]);
        assert_eq!(n.value()[[0]], 6.0);
        assert_eq!(n.value()[[1]], 15.0);
    }

    #[test]
    fn test_rejects_vector_input() {
        let alg = NumberConcTotalDmt::new();
        let q = Quantity::new(vec![1.0, 2.0], "cm^-3").unwrap();
        assert!(alg.run(&[q.into()]).is_err());
    }
}
