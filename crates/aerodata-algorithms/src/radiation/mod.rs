//! Radiation: blackbody emission and its inverse.

mod planck_emission;
mod temp_blackbody;

pub use planck_emission::PlanckEmission;
pub use temp_blackbody::TempBlackbody;
