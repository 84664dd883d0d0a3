//! First derivative of a parameter with respect to time.

use aerodata_core::metadata::{AlgorithmMetadata, AttrValue, VariableMetadata};
use aerodata_core::{now_iso, Algorithm, AlgorithmCore, CoreError, CoreResult};
use ndarray::{ArrayD, IxDyn};

use crate::{expect_inputs, same_shape};

/// Calculates the first derivative of a generic parameter with respect to
/// time. The derivative is centred everywhere except at the first and
/// last samples, which use one-sided differences.
///
/// Inputs: `x` (any units), `t` (s). Output: `x_dot` (input units per
/// second, templated as `input0/s`).
pub struct DerivativeWrtTime {
    core: AlgorithmCore,
}

impl DerivativeWrtTime {
    pub fn new() -> DerivativeWrtTime {
        let output = VariableMetadata::new([
            ("units", AttrValue::from("input0/s")),
            ("long_name", "first derivative of input0".into()),
            ("standard_name", "".into()),
            ("Category", AttrValue::Strs(vec!["".to_string()])),
        ]);
        let metadata = AlgorithmMetadata::new([
            ("Inputs", AttrValue::from(&["x", "t"][..])),
            ("InputTypes", AttrValue::from(&["vector", "vector"][..])),
            (
                "InputDescription",
                AttrValue::from(&["Parameter to calculate first derivative", "Time signal"][..]),
            ),
            ("Outputs", AttrValue::from(&["x_dot"][..])),
            ("OutputUnits", AttrValue::from(&["input0/s"][..])),
            ("OutputTypes", AttrValue::from(&["vector"][..])),
            ("OutputDescription", AttrValue::from(&["First derivative of x"][..])),
            ("Purpose", "Calculate first derivative of a generic parameter".into()),
            (
                "Description",
                "Calculates the first derivative of a generic parameter wrt time. \
                 Calculations of this derivative are centered for all except the first and \
                 last values in the vector"
                    .into(),
            ),
            ("Category", "Mathematics".into()),
            ("Processor", "DerivativeWrtTime".into()),
            ("ProcessorDate", "2012-06-22".into()),
            ("ProcessorVersion", "1.2".into()),
            ("DateProcessed", now_iso().into()),
        ]);
        DerivativeWrtTime {
            core: AlgorithmCore::define(metadata, vec![None, Some("s")], vec![output]),
        }
    }
}

impl Default for DerivativeWrtTime {
    fn default() -> Self {
        Self::new()
    }
}

impl Algorithm for DerivativeWrtTime {
    fn core(&self) -> &AlgorithmCore {
        &self.core
    }

    fn kernel(&self, inputs: &[ArrayD<f64>]) -> CoreResult<Vec<ArrayD<f64>>> {
        let [x, t] = expect_inputs::<2>(inputs, "DerivativeWrtTime")?;
        same_shape(&[x, t], "DerivativeWrtTime")?;
        let n = x.len();
        if n < 2 {
            return Err(CoreError::Shape(
                "DerivativeWrtTime needs at least two samples".to_string(),
            ));
        }
        let x = x.iter().copied().collect::<Vec<f64>>();
        let t = t.iter().copied().collect::<Vec<f64>>();

        let mut x_dot = Vec::with_capacity(n);
        for i in 0..n {
            let up = (i + 1).min(n - 1);
            let down = i.saturating_sub(1);
            x_dot.push((x[up] - x[down]) / (t[up] - t[down]));
        }
        Ok(vec![ArrayD::from_shape_vec(IxDyn(&[n]), x_dot)
            .map_err(|e| CoreError::Shape(e.to_string()))?])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aerodata_core::Quantity;

    #[test]
    fn test_linear_signal_constant_slope() {
        let alg = DerivativeWrtTime::new();
        let x = Quantity::new(vec![0.0, 2.0, 4.0, 6.0], "m").unwrap();
        let t = Quantity::new(vec![0.0, 1.0, 2.0, 3.0], "s").unwrap();
        let x_dot = alg.run_single(&[x.into(), t.into()]).unwrap();
        for v in x_dot.value() {
            assert!((v - 2.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_output_units_templated() {
        let alg = DerivativeWrtTime::new();
        let x = Quantity::new(vec![0.0, 1.0], "hPa").unwrap();
        let t = Quantity::new(vec![0.0, 60.0], "s").unwrap();
        let x_dot = alg.run_single(&[x.into(), t.into()]).unwrap();
        assert_eq!(x_dot.metadata.get_str("units"), Some("hPa/s"));
    }

    #[test]
    fn test_time_units_converted_to_seconds() {
        let alg = DerivativeWrtTime::new();
        let x = Quantity::new(vec![0.0, 60.0], "m").unwrap();
        let t_min = Quantity::new(vec![0.0, 1.0], "min").unwrap();
        let x_dot = alg.run_single(&[x.into(), t_min.into()]).unwrap();
        assert!((x_dot.value()[[0]] - 1.0).abs() < 1e-12);
    }
}
