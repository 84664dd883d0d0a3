//! Timeseries similarity via the Longest Common Subsequence method.

use aerodata_core::metadata::{AlgorithmMetadata, AttrValue, VariableMetadata};
use aerodata_core::{now_iso, Algorithm, AlgorithmCore, CoreError, CoreResult};
use ndarray::{ArrayD, IxDyn};

use crate::{expect_inputs, scalar};

/// Computes a similarity factor between two timeseries: the length of
/// the longest common subsequence whose paired samples differ by less
/// than `epsilon` after both series are normalised by mean and standard
/// deviation.
///
/// Inputs: `R`, `S` (any units), `epsilon` (matching criterion).
/// Output: the maximum common subsequence length.
///
/// Reference: Morse, M. and J. M. Patel, 2007: An Efficient and Accurate
/// Method for Evaluating Time Series Similarity. SIGMOD'07.
pub struct CompareParamLcss {
    core: AlgorithmCore,
}

impl CompareParamLcss {
    pub fn new() -> CompareParamLcss {
        let output = VariableMetadata::new([
            ("units", AttrValue::from("")),
            ("long_name", "maximum common subsequence length".into()),
            ("standard_name", "".into()),
            ("Category", AttrValue::Strs(vec!["".to_string()])),
        ]);
        let metadata = AlgorithmMetadata::new([
            ("Inputs", AttrValue::from(&["R", "S", "epsilon"][..])),
            ("InputTypes", AttrValue::from(&["vector", "vector", "coeff"][..])),
            (
                "InputDescription",
                AttrValue::from(
                    &[
                        "First timeseries to compare",
                        "Second timeseries for comparison",
                        "Matching criteria",
                    ][..],
                ),
            ),
            ("Outputs", AttrValue::from(&["max_seq"][..])),
            (
                "OutputDescription",
                AttrValue::from(&["Maximum common subsequence length"][..]),
            ),
            (
                "Purpose",
                "This algorithm computes a similarity factor between two timeseries using \
                 the Longest Common Subsequence (LCSS) method"
                    .into(),
            ),
            ("Category", "Comparisons".into()),
            (
                "References",
                "Morse, M. and J. M. Patel, 2007: An Efficient and Accurate Method for \
                 Evaluating Time Series Similarity. SIGMOD'07"
                    .into(),
            ),
            ("Processor", "CompareParamLcss".into()),
            ("ProcessorDate", "2013-02-17".into()),
            ("ProcessorVersion", "2.0".into()),
            ("DateProcessed", now_iso().into()),
        ]);
        CompareParamLcss {
            core: AlgorithmCore::define(metadata, vec![None, None, None], vec![output]),
        }
    }
}

impl Default for CompareParamLcss {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalise a series by its mean and standard deviation. A constant
/// series maps to zeros.
fn normalize(series: &[f64]) -> Vec<f64> {
    let n = series.len() as f64;
    let mean = series.iter().sum::<f64>() / n;
    let var = series.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std = var.sqrt();
    if std == 0.0 {
        vec![0.0; series.len()]
    } else {
        series.iter().map(|v| (v - mean) / std).collect()
    }
}

impl Algorithm for CompareParamLcss {
    fn core(&self) -> &AlgorithmCore {
        &self.core
    }

    fn kernel(&self, inputs: &[ArrayD<f64>]) -> CoreResult<Vec<ArrayD<f64>>> {
        let [r, s, epsilon] = expect_inputs::<3>(inputs, "CompareParamLcss")?;
        if r.ndim() != 1 || s.ndim() != 1 {
            return Err(CoreError::Shape(
                "CompareParamLcss compares 1-dimensional timeseries".to_string(),
            ));
        }
        let epsilon = scalar(epsilon, "epsilon")?;
        let r = normalize(&r.iter().copied().collect::<Vec<f64>>());
        let s = normalize(&s.iter().copied().collect::<Vec<f64>>());

        // Classic LCSS recurrence, tracking the running maximum sequence
        // length in the last row.
        let n = s.len();
        let mut prev = vec![0usize; n + 1];
        let mut current = vec![0usize; n + 1];
        for r_val in &r {
            for j in 1..=n {
                current[j] = if (r_val - s[j - 1]).abs() < epsilon {
                    prev[j - 1] + 1
                } else {
                    prev[j].max(current[j - 1])
                };
            }
            std::mem::swap(&mut prev, &mut current);
        }
        let max_seq = prev[n] as f64;

        Ok(vec![ArrayD::from_elem(IxDyn(&[]), max_seq)])
    }
}
