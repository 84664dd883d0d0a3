//! Blackbody temperature from measured radiance.

use aerodata_core::metadata::{AlgorithmMetadata, AttrValue, VariableMetadata};
use aerodata_core::{now_iso, Algorithm, AlgorithmCore, CoreResult};
use ndarray::ArrayD;

use crate::radiation::planck_emission::{C, H, KB};
use crate::{expect_inputs, scalar};

/// Inverts Planck's law: the temperature a blackbody must have to emit
/// the given radiance at a specific wavelength.
///
/// Inputs: `rad` (W m⁻² sr⁻¹ nm⁻¹), `Lambda` (nm). Output: `T` (K).
/// Source: Andre Ehrlich, Leipzig Institute for Meteorology.
pub struct TempBlackbody {
    core: AlgorithmCore,
}

impl TempBlackbody {
    pub fn new() -> TempBlackbody {
        let output = VariableMetadata::new([
            ("units", AttrValue::from("K")),
            ("long_name", "blackbody temperature".into()),
            ("standard_name", "".into()),
            ("Category", AttrValue::Strs(vec!["Radiation".to_string()])),
        ]);
        let metadata = AlgorithmMetadata::new([
            ("Inputs", AttrValue::from(&["rad", "Lambda"][..])),
            ("InputTypes", AttrValue::from(&["vector", "coeff"][..])),
            (
                "InputDescription",
                AttrValue::from(&["Blackbody radiance", "Wavelength"][..]),
            ),
            ("Outputs", AttrValue::from(&["T"][..])),
            ("OutputUnits", AttrValue::from(&["K"][..])),
            ("OutputTypes", AttrValue::from(&["vector"][..])),
            ("OutputDescription", AttrValue::from(&["Temperature"][..])),
            (
                "Purpose",
                "Calculates the blackbody temperature for a given radiance at a specific \
                 wavelength"
                    .into(),
            ),
            ("Category", "Radiation".into()),
            (
                "Source",
                "Andre Ehrlich, Leipzig Institute for Meteorology".into(),
            ),
            ("Processor", "TempBlackbody".into()),
            ("ProcessorDate", "2013-02-17".into()),
            ("ProcessorVersion", "1.2".into()),
            ("DateProcessed", now_iso().into()),
        ]);
        TempBlackbody {
            core: AlgorithmCore::define(
                metadata,
                vec![Some("W m^-2 sr^-1 nm^-1"), Some("nm")],
                vec![output],
            ),
        }
    }
}

impl Default for TempBlackbody {
    fn default() -> Self {
        Self::new()
    }
}

impl Algorithm for TempBlackbody {
    fn core(&self) -> &AlgorithmCore {
        &self.core
    }

    fn kernel(&self, inputs: &[ArrayD<f64>]) -> CoreResult<Vec<ArrayD<f64>>> {
        let [rad, lambda] = expect_inputs::<2>(inputs, "TempBlackbody")?;
        let l = scalar(lambda, "Lambda")? * 1e-9;
        // Radiance arrives per nanometre; the inversion wants per metre.
        let t = rad.mapv(|r| {
            let r = r * 1e9;
            H * C / (KB * l * (2.0 * H * C.powi(2) / (l.powi(5) * r) + 1.0).ln())
        });
        Ok(vec![t])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::radiation::PlanckEmission;
    use aerodata_core::Quantity;

    #[test]
    fn test_inverts_planck_emission() {
        let forward = PlanckEmission::new();
        let inverse = TempBlackbody::new();

        let t = Quantity::new(vec![250.0, 288.15, 320.0], "K").unwrap();
        let rad = forward
            .run_single(&[t.clone().into(), 11000.0.into()])
            .unwrap();
        let recovered = inverse.run_single(&[rad.into(), 11000.0.into()]).unwrap();

        for (a, b) in t.value().iter().zip(recovered.value().iter()) {
            assert!((a - b).abs() < 1e-6, "{} vs {}", a, b);
        }
        assert_eq!(recovered.units(), "K");
    }
}
