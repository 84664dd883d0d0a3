//! Virtual temperature from static temperature and mixing ratio.

use aerodata_core::metadata::{AlgorithmMetadata, AttrValue, VariableMetadata};
use aerodata_core::{now_iso, Algorithm, AlgorithmCore, CoreResult};
use ndarray::{ArrayD, Zip};

use crate::{expect_inputs, same_shape};

/// Ratio of the gas constants of water vapour and dry air.
const RV_RA: f64 = 1.608;

/// Calculates virtual temperature given static temperature and water
/// vapour mixing ratio.
///
/// Inputs: `T_s` (K or °C), `r` (g/kg). Output: `T_v` (K).
/// Reference: Triplet-Roche, page 56.
pub struct TempVirtualCnrm {
    core: AlgorithmCore,
}

impl TempVirtualCnrm {
    pub fn new() -> TempVirtualCnrm {
        let output = VariableMetadata::new([
            ("units", AttrValue::from("K")),
            ("long_name", "virtual temperature".into()),
            ("standard_name", "virtual_temperature".into()),
            (
                "Category",
                AttrValue::Strs(vec!["Thermodynamics".to_string(), "Atmos State".to_string()]),
            ),
        ]);
        let metadata = AlgorithmMetadata::new([
            ("Inputs", AttrValue::from(&["T_s", "r"][..])),
            ("InputTypes", AttrValue::from(&["vector", "vector"][..])),
            (
                "InputDescription",
                AttrValue::from(&["Static temperature", "Water vapor mixing ratio"][..]),
            ),
            ("Outputs", AttrValue::from(&["T_v"][..])),
            ("OutputUnits", AttrValue::from(&["K"][..])),
            ("OutputTypes", AttrValue::from(&["vector"][..])),
            ("OutputDescription", AttrValue::from(&["Virtual temperature"][..])),
            ("Purpose", "Calculate virtual temperature".into()),
            (
                "Description",
                "Calculates virtual temperature given static pressure and mixing ratio".into(),
            ),
            ("Category", "Thermodynamics".into()),
            ("Source", "CNRM/GMEI/TRAMM".into()),
            ("References", "Triplet-Roche, page 56".into()),
            ("Processor", "TempVirtualCnrm".into()),
            ("ProcessorDate", "2011-05-27".into()),
            ("ProcessorVersion", "1.0".into()),
            ("DateProcessed", now_iso().into()),
        ]);
        TempVirtualCnrm {
            core: AlgorithmCore::define(metadata, vec![Some("K"), Some("g/kg")], vec![output]),
        }
    }
}

impl Default for TempVirtualCnrm {
    fn default() -> Self {
        Self::new()
    }
}

impl Algorithm for TempVirtualCnrm {
    fn core(&self) -> &AlgorithmCore {
        &self.core
    }

    fn kernel(&self, inputs: &[ArrayD<f64>]) -> CoreResult<Vec<ArrayD<f64>>> {
        let [t_s, r] = expect_inputs::<2>(inputs, "TempVirtualCnrm")?;
        same_shape(&[t_s, r], "TempVirtualCnrm")?;
        // Mixing ratio arrives in g/kg; the formula wants kg/kg.
        let t_v = Zip::from(t_s).and(r).map_collect(|&t, &r| {
            let r = r * 1e-3;
            t * (1.0 + RV_RA * r) / (1.0 + r)
        });
        Ok(vec![t_v])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aerodata_core::Quantity;

    #[test]
    fn test_dry_air_unchanged() {
        let alg = TempVirtualCnrm::new();
        let t = Quantity::new(vec![288.15], "K").unwrap();
        let r = Quantity::new(vec![0.0], "g/kg").unwrap();
        let t_v = alg.run_single(&[t.into(), r.into()]).unwrap();
        assert!((t_v.value()[[0]] - 288.15).abs() < 1e-12);
    }

    #[test]
    fn test_moist_air_warmer() {
        let alg = TempVirtualCnrm::new();
        let t = Quantity::new(vec![288.15], "K").unwrap();
        let r = Quantity::new(vec![10.0], "g/kg").unwrap();
        let t_v = alg.run_single(&[t.into(), r.into()]).unwrap();
        let expected = 288.15 * (1.0 + 1.608 * 0.01) / (1.0 + 0.01);
        assert!((t_v.value()[[0]] - expected).abs() < 1e-9);
        assert!(t_v.value()[[0]] > 288.15);
    }
}
