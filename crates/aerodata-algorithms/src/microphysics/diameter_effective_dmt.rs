//! Effective diameter of a size distribution.

use aerodata_core::metadata::{AlgorithmMetadata, AttrValue, VariableMetadata};
use aerodata_core::{now_iso, Algorithm, AlgorithmCore, CoreError, CoreResult};
use ndarray::ArrayD;

use crate::expect_inputs;

/// Ratio of the third to the second moment of a particle size
/// distribution.
///
/// Inputs: `n_i` (cm⁻³, `[time, bins]`), `d_i` (µm, bin centre
/// diameters). Output: `D_e` (µm).
pub struct DiameterEffectiveDmt {
    core: AlgorithmCore,
}

impl DiameterEffectiveDmt {
    pub fn new() -> DiameterEffectiveDmt {
        let output = VariableMetadata::new([
            ("units", AttrValue::from("um")),
            ("long_name", "Effective Diameter".into()),
            ("standard_name", "".into()),
            ("Category", AttrValue::Strs(vec!["Microphysics".to_string()])),
        ]);
        let metadata = AlgorithmMetadata::new([
            ("Inputs", AttrValue::from(&["n_i", "d_i"][..])),
            (
                "InputTypes",
                AttrValue::from(&["array[time, bins]", "vector"][..]),
            ),
            ("Outputs", AttrValue::from(&["D_e"][..])),
            (
                "Purpose",
                "Calculation of effective diameter from a particle size distribution".into(),
            ),
            ("Category", "Microphysics".into()),
            ("Processor", "DiameterEffectiveDmt".into()),
            ("ProcessorDate", "2012-02-10".into()),
            ("ProcessorVersion", "1.0".into()),
            ("DateProcessed", now_iso().into()),
        ]);
        DiameterEffectiveDmt {
            core: AlgorithmCore::define(metadata, vec![Some("cm^-3"), Some("um")], vec![output]),
        }
    }
}

impl Default for DiameterEffectiveDmt {
    fn default() -> Self {
        Self::new()
    }
}

impl Algorithm for DiameterEffectiveDmt {
    fn core(&self) -> &AlgorithmCore {
        &self.core
    }

    fn kernel(&self, inputs: &[ArrayD<f64>]) -> CoreResult<Vec<ArrayD<f64>>> {
        let [n_i, d_i] = expect_inputs::<2>(inputs, "DiameterEffectiveDmt")?;
        if n_i.ndim() != 2 || d_i.ndim() != 1 {
            return Err(CoreError::Shape(format!(
                "DiameterEffectiveDmt expects [time, bins] and [bins], got {:?} and {:?}",
                n_i.shape(),
                d_i.shape()
            )));
        }
        let bins = n_i.shape()[1];
        if d_i.len() != bins {
            return Err(CoreError::Shape(format!(
                "DiameterEffectiveDmt has {} bins of concentration but {} diameters",
                bins,
                d_i.len()
            )));
        }

        let times = n_i.shape()[0];
        let mut d_e = Vec::with_capacity(times);
        for row in n_i.rows() {
            let mut third = 0.0;
            let mut second = 0.0;
            for (n, d) in row.iter().zip(d_i.iter()) {
                third += n * d.powi(3);
                second += n * d.powi(2);
            }
            d_e.push(third / second);
        }
        Ok(vec![ArrayD::from_shape_vec(
            ndarray::IxDyn(&[times]),
            d_e,
        )
        .map_err(|e| CoreError::Shape(e.to_string()))?])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aerodata_core::Quantity;
    use ndarray::IxDyn;

    #[test]
    fn test_monodisperse_distribution() {
        // A single occupied bin gives back that bin's diameter.
        let alg = DiameterEffectiveDmt::new();
        let n = ArrayD::from_shape_vec(IxDyn(&[1, 3]), vec![0.0, 5.0, 0.0]).unwrap();
        let n = Quantity::new(n, "cm^-3").unwrap();
        let d = Quantity::new(vec![10.0, 20.0, 30.0], "um").unwrap();
        let d_e = alg.run_single(&[n.into(), d.into()]).unwrap();
        assert!((d_e.value()[[0]] - 20.0).abs() < 1e-12);
        assert_eq!(d_e.units(), "um");
    }

    #[test]
    fn test_weighted_towards_large_particles() {
        let alg = DiameterEffectiveDmt::new();
        let n = ArrayD::from_shape_vec(IxDyn(&[1, 2]), vec![1.0, 1.0]).unwrap();
        let n = Quantity::new(n, "cm^-3").unwrap();
        let d = Quantity::new(vec![10.0, 30.0], "um").unwrap();
        let d_e = alg.run_single(&[n.into(), d.into()]).unwrap();
        let expected = (10.0_f64.powi(3) + 30.0_f64.powi(3)) / (10.0_f64.powi(2) + 30.0_f64.powi(2));
        assert!((d_e.value()[[0]] - expected).abs() < 1e-9);
    }
}
