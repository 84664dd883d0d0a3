//! Corrections: signal cleanup ahead of scientific processing.

mod correction_spike_simple_cnrm;

pub use correction_spike_simple_cnrm::CorrectionSpikeSimpleCnrm;
