//! Microphysics: moments of particle size distributions.

mod diameter_effective_dmt;
mod number_conc_total_dmt;

pub use diameter_effective_dmt::DiameterEffectiveDmt;
pub use number_conc_total_dmt::NumberConcTotalDmt;
