//! One-dimensional piecewise linear interpolation.

use aerodata_core::metadata::{AlgorithmMetadata, AttrValue, VariableMetadata};
use aerodata_core::{now_iso, Algorithm, AlgorithmCore, CoreError, CoreResult};
use ndarray::{ArrayD, IxDyn};

use crate::{expect_inputs, same_shape};

/// Calculates the piecewise linear interpolation of a variable onto a new
/// coordinate axis.
///
/// Inputs: `x` (coordinates, increasing), `f` (data points), `x_interp`
/// (new coordinates). Values outside the source axis clamp to the edge
/// data points unless explicit bounds are set with
/// [`InterpolationLinear::with_bounds`].
pub struct InterpolationLinear {
    core: AlgorithmCore,
    left: Option<f64>,
    right: Option<f64>,
}

impl InterpolationLinear {
    pub fn new() -> InterpolationLinear {
        let output = VariableMetadata::new([
            ("units", AttrValue::from("input1")),
            ("long_name", "".into()),
            ("standard_name", "".into()),
            ("Category", AttrValue::Strs(vec!["".to_string()])),
        ]);
        let metadata = AlgorithmMetadata::new([
            ("Inputs", AttrValue::from(&["x", "f", "x_interp"][..])),
            (
                "InputTypes",
                AttrValue::from(&["vector", "vector", "vector"][..]),
            ),
            (
                "InputDescription",
                AttrValue::from(
                    &[
                        "x-coordinates of the data points (must be increasing)",
                        "Data points to interpolate",
                        "New set of coordinates to use in interpolation",
                    ][..],
                ),
            ),
            ("Outputs", AttrValue::from(&["f_interp"][..])),
            ("OutputDescription", AttrValue::from(&["Interpolated values of f"][..])),
            ("Purpose", "Calculate linear interpolation of a variable".into()),
            (
                "Description",
                "Calculates the one-dimensional piecewise linear interpolation of a \
                 variable between two coordinate systems"
                    .into(),
            ),
            ("Category", "Transforms".into()),
            ("Processor", "InterpolationLinear".into()),
            ("ProcessorDate", "2012-02-07".into()),
            ("ProcessorVersion", "1.1".into()),
            ("DateProcessed", now_iso().into()),
        ]);
        InterpolationLinear {
            core: AlgorithmCore::define(metadata, vec![None, None, None], vec![output]),
            left: None,
            right: None,
        }
    }

    /// Values to return below and above the source axis instead of the
    /// edge data points.
    pub fn with_bounds(mut self, left: Option<f64>, right: Option<f64>) -> InterpolationLinear {
        self.left = left;
        self.right = right;
        self
    }
}

impl Default for InterpolationLinear {
    fn default() -> Self {
        Self::new()
    }
}

impl Algorithm for InterpolationLinear {
    fn core(&self) -> &AlgorithmCore {
        &self.core
    }

    fn kernel(&self, inputs: &[ArrayD<f64>]) -> CoreResult<Vec<ArrayD<f64>>> {
        let [x, f, x_interp] = expect_inputs::<3>(inputs, "InterpolationLinear")?;
        same_shape(&[x, f], "InterpolationLinear")?;
        let x: Vec<f64> = x.iter().copied().collect();
        let f: Vec<f64> = f.iter().copied().collect();
        if x.is_empty() {
            return Err(CoreError::Shape(
                "InterpolationLinear needs at least one data point".to_string(),
            ));
        }
        if x.windows(2).any(|w| w[1] <= w[0]) {
            return Err(CoreError::Shape(
                "InterpolationLinear requires strictly increasing x-coordinates".to_string(),
            ));
        }

        let left = self.left.unwrap_or(f[0]);
        let right = self.right.unwrap_or(f[f.len() - 1]);

        let f_interp: Vec<f64> = x_interp
            .iter()
            .map(|&xv| {
                if xv < x[0] {
                    left
                } else if xv > x[x.len() - 1] {
                    right
                } else {
                    // partition_point gives the first knot >= xv.
                    let upper = x.partition_point(|&k| k < xv).min(x.len() - 1);
                    if x[upper] == xv || upper == 0 {
                        f[upper]
                    } else {
                        let lower = upper - 1;
                        f[lower]
                            + (xv - x[lower]) * (f[upper] - f[lower]) / (x[upper] - x[lower])
                    }
                }
            })
            .collect();

        Ok(vec![ArrayD::from_shape_vec(
            IxDyn(&[f_interp.len()]),
            f_interp,
        )
        .map_err(|e| CoreError::Shape(e.to_string()))?])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aerodata_core::Quantity;

    #[test]
    fn test_interpolates_midpoints() {
        let alg = InterpolationLinear::new();
        let x = Quantity::new(vec![0.0, 1.0, 2.0], "s").unwrap();
        let f = Quantity::new(vec![0.0, 10.0, 40.0], "m").unwrap();
        let xi = Quantity::new(vec![0.5, 1.5], "s").unwrap();
        let out = alg.run_single(&[x.into(), f.into(), xi.into()]).unwrap();
        assert!((out.value()[[0]] - 5.0).abs() < 1e-12);
        assert!((out.value()[[1]] - 25.0).abs() < 1e-12);
        // Output units follow the interpolated data.
        assert_eq!(out.metadata.get_str("units"), Some("m"));
    }

    #[test]
    fn test_clamps_to_edges_by_default() {
        let alg = InterpolationLinear::new();
        let x = Quantity::new(vec![0.0, 1.0], "s").unwrap();
        let f = Quantity::new(vec![3.0, 7.0], "m").unwrap();
        let xi = Quantity::new(vec![-1.0, 2.0], "s").unwrap();
        let out = alg.run_single(&[x.into(), f.into(), xi.into()]).unwrap();
        assert_eq!(out.value()[[0]], 3.0);
        assert_eq!(out.value()[[1]], 7.0);
    }

    #[test]
    fn test_explicit_bounds() {
        // Zero is a legitimate bound value and must not fall back to the
        // edge data points.
        let alg = InterpolationLinear::new().with_bounds(Some(0.0), Some(-1.0));
        let x = Quantity::new(vec![0.0, 1.0], "s").unwrap();
        let f = Quantity::new(vec![3.0, 7.0], "m").unwrap();
        let xi = Quantity::new(vec![-1.0, 2.0], "s").unwrap();
        let out = alg.run_single(&[x.into(), f.into(), xi.into()]).unwrap();
        assert_eq!(out.value()[[0]], 0.0);
        assert_eq!(out.value()[[1]], -1.0);
    }

    #[test]
    fn test_rejects_decreasing_axis() {
        let alg = InterpolationLinear::new();
        let x = Quantity::new(vec![1.0, 0.0], "s").unwrap();
        let f = Quantity::new(vec![3.0, 7.0], "m").unwrap();
        let xi = Quantity::new(vec![0.5], "s").unwrap();
        assert!(alg.run(&[x.into(), f.into(), xi.into()]).is_err());
    }
}
