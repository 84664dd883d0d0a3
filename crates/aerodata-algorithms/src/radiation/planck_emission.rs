//! Blackbody radiance at a given wavelength and temperature.

use aerodata_core::metadata::{AlgorithmMetadata, AttrValue, VariableMetadata};
use aerodata_core::{now_iso, Algorithm, AlgorithmCore, CoreResult};
use ndarray::ArrayD;

use crate::{expect_inputs, scalar};

/// Planck constant, J s.
pub(crate) const H: f64 = 6.626_069_57e-34;
/// Boltzmann constant, J/K.
pub(crate) const KB: f64 = 1.3806e-23;
/// Speed of light, m/s.
pub(crate) const C: f64 = 2.997_925e8;

/// Calculates the radiance of a surface at a given wavelength from its
/// temperature, per Planck's law.
///
/// Inputs: `T` (K), `Lambda` (nm). Output: `rad` (W m⁻² sr⁻¹ nm⁻¹).
/// Source: Andre Ehrlich, Leipzig Institute for Meteorology.
pub struct PlanckEmission {
    core: AlgorithmCore,
}

impl PlanckEmission {
    pub fn new() -> PlanckEmission {
        let output = VariableMetadata::new([
            ("units", AttrValue::from("W m^-2 sr^-1 nm^-1")),
            ("long_name", "radiance".into()),
            ("standard_name", "".into()),
            ("Category", AttrValue::Strs(vec!["Radiation".to_string()])),
        ]);
        let metadata = AlgorithmMetadata::new([
            ("Inputs", AttrValue::from(&["T", "Lambda"][..])),
            ("InputTypes", AttrValue::from(&["vector", "coeff"][..])),
            (
                "InputDescription",
                AttrValue::from(&["Temperature", "Wavelength"][..]),
            ),
            ("Outputs", AttrValue::from(&["rad"][..])),
            ("OutputUnits", AttrValue::from(&["W m^-2 sr^-1 nm^-1"][..])),
            ("OutputTypes", AttrValue::from(&["vector"][..])),
            ("OutputDescription", AttrValue::from(&["Black body radiance"][..])),
            (
                "Purpose",
                "Calculates the radiance of a surface at a given wavelength given its \
                 temperature"
                    .into(),
            ),
            ("Category", "Radiation".into()),
            (
                "Source",
                "Andre Ehrlich, Leipzig Institute for Meteorology".into(),
            ),
            ("Processor", "PlanckEmission".into()),
            ("ProcessorDate", "2013-02-17".into()),
            ("ProcessorVersion", "1.2".into()),
            ("DateProcessed", now_iso().into()),
        ]);
        PlanckEmission {
            core: AlgorithmCore::define(metadata, vec![Some("K"), Some("nm")], vec![output]),
        }
    }
}

impl Default for PlanckEmission {
    fn default() -> Self {
        Self::new()
    }
}

impl Algorithm for PlanckEmission {
    fn core(&self) -> &AlgorithmCore {
        &self.core
    }

    fn kernel(&self, inputs: &[ArrayD<f64>]) -> CoreResult<Vec<ArrayD<f64>>> {
        let [t, lambda] = expect_inputs::<2>(inputs, "PlanckEmission")?;
        let l = scalar(lambda, "Lambda")? * 1e-9;
        // Spectral radiance per metre, scaled to per nanometre.
        let rad = t.mapv(|t| {
            2.0 * H * C.powi(2) / (l.powi(5) * ((H * C / (l * KB * t)).exp() - 1.0)) * 1e-9
        });
        Ok(vec![rad])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aerodata_core::Quantity;

    #[test]
    fn test_planck_hotter_is_brighter() {
        let alg = PlanckEmission::new();
        let t = Quantity::new(vec![280.0, 300.0], "K").unwrap();
        let rad = alg.run_single(&[t.into(), 10000.0.into()]).unwrap();
        assert!(rad.value()[[1]] > rad.value()[[0]]);
        assert!(rad.value()[[0]] > 0.0);
    }

    #[test]
    fn test_planck_known_value() {
        // 300 K at 10 um, evaluated directly from the law.
        let alg = PlanckEmission::new();
        let t = Quantity::new(vec![300.0], "K").unwrap();
        let rad = alg.run_single(&[t.into(), 10000.0.into()]).unwrap();

        let l: f64 = 1e-5;
        let expected =
            2.0 * H * C.powi(2) / (l.powi(5) * ((H * C / (l * KB * 300.0)).exp() - 1.0)) * 1e-9;
        assert!((rad.value()[[0]] - expected).abs() < expected * 1e-12);
    }
}
