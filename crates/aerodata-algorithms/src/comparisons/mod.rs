//! Comparisons: similarity measures between measured timeseries.

mod compare_param_lcss;

pub use compare_param_lcss::CompareParamLcss;
