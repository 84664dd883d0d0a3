//! Density of dry air from the perfect gas equation of state.

use aerodata_core::metadata::{AlgorithmMetadata, AttrValue, VariableMetadata};
use aerodata_core::{now_iso, Algorithm, AlgorithmCore, CoreResult};
use ndarray::{ArrayD, Zip};

use crate::{expect_inputs, same_shape};

/// Specific gas constant of dry air, J/kg/K.
const R_A: f64 = 287.05;

/// Calculates density of dry air given static temperature and pressure.
/// With virtual temperature instead of static, this yields the density of
/// humid air.
///
/// Inputs: `P_s` (hPa), `T_s` (K or °C). Output: `rho` (kg/m³).
pub struct DensityDryAirCnrm {
    core: AlgorithmCore,
}

impl DensityDryAirCnrm {
    pub fn new() -> DensityDryAirCnrm {
        let output = VariableMetadata::new([
            ("units", AttrValue::from("kg/m^3")),
            ("long_name", "density".into()),
            ("standard_name", "air_density".into()),
            (
                "Category",
                AttrValue::Strs(vec!["Thermodynamics".to_string(), "Atmos State".to_string()]),
            ),
        ]);
        let metadata = AlgorithmMetadata::new([
            ("Inputs", AttrValue::from(&["P_s", "T_s"][..])),
            ("InputTypes", AttrValue::from(&["vector", "vector"][..])),
            (
                "InputDescription",
                AttrValue::from(&["Static pressure", "Static temperature"][..]),
            ),
            ("Outputs", AttrValue::from(&["rho"][..])),
            ("OutputUnits", AttrValue::from(&["kg/m^3"][..])),
            ("OutputTypes", AttrValue::from(&["vector"][..])),
            ("OutputDescription", AttrValue::from(&["Density"][..])),
            ("Purpose", "Calculates density of dry air".into()),
            (
                "Description",
                "Calculates density of dry air given static temperature and pressure. If \
                 virtual temperature is used instead of static, this algorithm calculates \
                 density of humid air"
                    .into(),
            ),
            ("Category", "Thermodynamics".into()),
            ("Source", "CNRM/GMEI/TRAMM".into()),
            (
                "References",
                "Equation of state for a perfect gas, Triplet-Roche, page 34".into(),
            ),
            ("Processor", "DensityDryAirCnrm".into()),
            ("ProcessorDate", "2012-01-27".into()),
            ("ProcessorVersion", "1.0".into()),
            ("DateProcessed", now_iso().into()),
        ]);
        DensityDryAirCnrm {
            core: AlgorithmCore::define(metadata, vec![Some("hPa"), Some("K")], vec![output]),
        }
    }
}

impl Default for DensityDryAirCnrm {
    fn default() -> Self {
        Self::new()
    }
}

impl Algorithm for DensityDryAirCnrm {
    fn core(&self) -> &AlgorithmCore {
        &self.core
    }

    fn kernel(&self, inputs: &[ArrayD<f64>]) -> CoreResult<Vec<ArrayD<f64>>> {
        let [p_s, t_s] = expect_inputs::<2>(inputs, "DensityDryAirCnrm")?;
        same_shape(&[p_s, t_s], "DensityDryAirCnrm")?;
        let rho = Zip::from(p_s)
            .and(t_s)
            .map_collect(|&p, &t| (p * 100.0) / (R_A * t));
        Ok(vec![rho])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aerodata_core::Quantity;

    #[test]
    fn test_density_sea_level() {
        let alg = DensityDryAirCnrm::new();
        let p = Quantity::new(vec![1013.25], "hPa").unwrap();
        let t = Quantity::new(vec![288.15], "K").unwrap();
        let rho = alg.run_single(&[p.into(), t.into()]).unwrap();
        assert!((rho.value()[[0]] - 1.225).abs() < 1e-3);
        assert_eq!(rho.units(), "kg/m^3");
    }

    #[test]
    fn test_density_pressure_units_reconciled() {
        let alg = DensityDryAirCnrm::new();
        let p_hpa = Quantity::new(vec![1000.0], "hPa").unwrap();
        let p_pa = Quantity::new(vec![100000.0], "Pa").unwrap();
        let t = Quantity::new(vec![280.0], "K").unwrap();
        let a = alg.run_single(&[p_hpa.into(), (&t).into()]).unwrap();
        let b = alg.run_single(&[p_pa.into(), t.into()]).unwrap();
        assert!((a.value()[[0]] - b.value()[[0]]).abs() < 1e-12);
    }
}
