//! Potential temperature.

use aerodata_core::metadata::{AlgorithmMetadata, AttrValue, VariableMetadata};
use aerodata_core::{now_iso, Algorithm, AlgorithmCore, CoreResult};
use ndarray::{ArrayD, Zip};

use crate::{expect_inputs, same_shape, scalar};

/// Calculates potential temperature given static temperature, pressure
/// and the ratio of the gas constant to the specific heat of air.
///
/// Inputs: `T_s` (K or °C), `P_s` (hPa), `Racpa` (dimensionless).
/// Output: `theta` (K). Reference: Triplet-Roche.
pub struct TempPotentialCnrm {
    core: AlgorithmCore,
}

impl TempPotentialCnrm {
    pub fn new() -> TempPotentialCnrm {
        let output = VariableMetadata::new([
            ("units", AttrValue::from("K")),
            ("long_name", "potential temperature".into()),
            ("standard_name", "air_potential_temperature".into()),
            (
                "Category",
                AttrValue::Strs(vec!["Thermodynamics".to_string(), "Atmos State".to_string()]),
            ),
        ]);
        let metadata = AlgorithmMetadata::new([
            ("Inputs", AttrValue::from(&["T_s", "P_s", "Racpa"][..])),
            ("InputTypes", AttrValue::from(&["vector", "vector", "coeff"][..])),
            (
                "InputDescription",
                AttrValue::from(
                    &[
                        "Static temperature",
                        "Static pressure",
                        "Gas constant of air divided by specific heat at constant pressure",
                    ][..],
                ),
            ),
            ("Outputs", AttrValue::from(&["theta"][..])),
            ("OutputUnits", AttrValue::from(&["K"][..])),
            ("OutputTypes", AttrValue::from(&["vector"][..])),
            ("OutputDescription", AttrValue::from(&["Potential temperature"][..])),
            ("Purpose", "Calculates potential temperature".into()),
            (
                "Description",
                "Calculates potential temperature given static temperature, pressure, and \
                 the ratio of gas constant and specific heat of air"
                    .into(),
            ),
            ("Category", "Thermodynamics".into()),
            ("Source", "CNRM/GMEI/TRAMM".into()),
            ("References", "Triplet-Roche".into()),
            ("Processor", "TempPotentialCnrm".into()),
            ("ProcessorDate", "2011-05-27".into()),
            ("ProcessorVersion", "1.0".into()),
            ("DateProcessed", now_iso().into()),
        ]);
        TempPotentialCnrm {
            core: AlgorithmCore::define(
                metadata,
                vec![Some("K"), Some("hPa"), Some("")],
                vec![output],
            ),
        }
    }
}

impl Default for TempPotentialCnrm {
    fn default() -> Self {
        Self::new()
    }
}

impl Algorithm for TempPotentialCnrm {
    fn core(&self) -> &AlgorithmCore {
        &self.core
    }

    fn kernel(&self, inputs: &[ArrayD<f64>]) -> CoreResult<Vec<ArrayD<f64>>> {
        let [t_s, p_s, racpa] = expect_inputs::<3>(inputs, "TempPotentialCnrm")?;
        same_shape(&[t_s, p_s], "TempPotentialCnrm")?;
        let racpa = scalar(racpa, "Racpa")?;
        let theta = Zip::from(t_s)
            .and(p_s)
            .map_collect(|&t, &p| t * (1000.0 / p).powf(racpa));
        Ok(vec![theta])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aerodata_core::Quantity;

    #[test]
    fn test_theta_at_reference_pressure() {
        let alg = TempPotentialCnrm::new();
        let t = Quantity::new(vec![280.0], "K").unwrap();
        let p = Quantity::new(vec![1000.0], "hPa").unwrap();
        let theta = alg.run_single(&[t.into(), p.into(), 0.286.into()]).unwrap();
        assert!((theta.value()[[0]] - 280.0).abs() < 1e-12);
    }

    #[test]
    fn test_theta_increases_aloft() {
        let alg = TempPotentialCnrm::new();
        let t = Quantity::new(vec![250.0], "K").unwrap();
        let p = Quantity::new(vec![500.0], "hPa").unwrap();
        let theta = alg.run_single(&[t.into(), p.into(), 0.286.into()]).unwrap();
        let expected = 250.0 * (1000.0_f64 / 500.0).powf(0.286);
        assert!((theta.value()[[0]] - expected).abs() < 1e-9);
    }
}
