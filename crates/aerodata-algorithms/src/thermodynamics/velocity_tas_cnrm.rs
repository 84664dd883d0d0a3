//! True airspeed using St Venant's formula.

use aerodata_core::metadata::{AlgorithmMetadata, AttrValue, VariableMetadata};
use aerodata_core::{now_iso, Algorithm, AlgorithmCore, CoreResult};
use ndarray::{ArrayD, Zip};

use crate::{expect_inputs, same_shape, scalar};

/// Calculates true airspeed from static temperature, static pressure and
/// dynamic pressure.
///
/// Inputs: `T_s` (K or °C), `P_s` (hPa), `dP` (hPa), `cpa` (J/K/kg, dry
/// air is 1004), `Racpa` (R_a/c_pa, dimensionless). Output: `V_p` (m/s).
///
/// Source: CNRM/GMEI/TRAMM. References: "Mecanique des fluides",
/// S. Candel, Dunod; Bulletin NCAR/RAF Nr 23, Feb 87, Lenschow and
/// Spyers-Duran.
pub struct VelocityTasCnrm {
    core: AlgorithmCore,
}

impl VelocityTasCnrm {
    pub fn new() -> VelocityTasCnrm {
        let output = VariableMetadata::new([
            ("units", AttrValue::from("m/s")),
            ("long_name", "True Air Speed".into()),
            ("standard_name", "platform_speed_wrt_air".into()),
            (
                "Category",
                AttrValue::Strs(vec!["Thermodynamics".to_string(), "Aircraft State".to_string()]),
            ),
        ]);
        let metadata = AlgorithmMetadata::new([
            ("Inputs", AttrValue::from(&["T_s", "P_s", "dP", "cpa", "Racpa"][..])),
            (
                "InputTypes",
                AttrValue::from(&["vector", "vector", "vector", "coeff", "coeff"][..]),
            ),
            (
                "InputDescription",
                AttrValue::from(
                    &[
                        "Static temperature",
                        "Static pressure",
                        "Dynamic pressure",
                        "Specific heat of air at constant pressure",
                        "R_a/c_pa",
                    ][..],
                ),
            ),
            ("Outputs", AttrValue::from(&["V_p"][..])),
            ("OutputUnits", AttrValue::from(&["m/s"][..])),
            ("OutputTypes", AttrValue::from(&["vector"][..])),
            ("OutputDescription", AttrValue::from(&["True airspeed"][..])),
            ("Purpose", "Calculate true airspeed".into()),
            (
                "Description",
                "Calculates true airspeed based on static temperature, static pressure and \
                 dynamic pressure using St Venant's formula"
                    .into(),
            ),
            ("Category", "Thermodynamics".into()),
            ("Source", "CNRM/GMEI/TRAMM".into()),
            (
                "References",
                "Mecanique des fluides, S. Candel, Dunod; Bulletin NCAR/RAF Nr 23, Feb 87"
                    .into(),
            ),
            ("Processor", "VelocityTasCnrm".into()),
            ("ProcessorDate", "2012-01-27".into()),
            ("ProcessorVersion", "1.0".into()),
            ("DateProcessed", now_iso().into()),
        ]);
        VelocityTasCnrm {
            core: AlgorithmCore::define(
                metadata,
                vec![Some("K"), Some("hPa"), Some("hPa"), Some("J/K/kg"), Some("")],
                vec![output],
            ),
        }
    }
}

impl Default for VelocityTasCnrm {
    fn default() -> Self {
        Self::new()
    }
}

impl Algorithm for VelocityTasCnrm {
    fn core(&self) -> &AlgorithmCore {
        &self.core
    }

    fn kernel(&self, inputs: &[ArrayD<f64>]) -> CoreResult<Vec<ArrayD<f64>>> {
        let [t_s, p_s, dp, cpa, racpa] = expect_inputs::<5>(inputs, "VelocityTasCnrm")?;
        same_shape(&[t_s, p_s, dp], "VelocityTasCnrm")?;
        let cpa = scalar(cpa, "cpa")?;
        let racpa = scalar(racpa, "Racpa")?;

        let v_p = Zip::from(t_s)
            .and(p_s)
            .and(dp)
            .map_collect(|&t, &p, &d| (2.0 * cpa * t * ((1.0 + d / p).powf(racpa) - 1.0)).sqrt());
        Ok(vec![v_p])
    }
}
