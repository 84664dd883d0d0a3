//! Thermodynamics: airspeed, temperature and density of the sampled air.

mod density_dry_air_cnrm;
mod temp_potential_cnrm;
mod temp_virtual_cnrm;
mod velocity_tas_cnrm;

pub use density_dry_air_cnrm::DensityDryAirCnrm;
pub use temp_potential_cnrm::TempPotentialCnrm;
pub use temp_virtual_cnrm::TempVirtualCnrm;
pub use velocity_tas_cnrm::VelocityTasCnrm;
