//! Descriptive statistics for a group of samples.
//!
//! Quartiles use the split-at-midpoint convention: the sorted sample is cut at
//! `n / 2`, and each quartile is the median of its half. For odd `n` the middle
//! element belongs to neither half. This differs from percentile interpolation
//! (e.g. `[1, 2, 3, 4]` gives 1.5 / 3.5, not 1.75 / 3.25).

use statrs::distribution::{ContinuousCDF, StudentsT};
use thiserror::Error;

pub const DEFAULT_CONFIDENCE: f64 = 0.95;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StatsError {
    #[error("{what} - no data points passed")]
    EmptyInput { what: &'static str },
    #[error("confidence level must be strictly between 0 and 1, got {0}")]
    InvalidConfidence(f64),
    #[error("t distribution unavailable: {0}")]
    Distribution(String),
}

/// The six per-group statistics, in output column order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub mean: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
    pub median: f64,
    pub lower_quartile: f64,
    pub upper_quartile: f64,
}

impl Summary {
    /// All six statistics collapsed onto one value.
    pub fn single(value: f64) -> Self {
        Self {
            mean: value,
            ci_lower: value,
            ci_upper: value,
            median: value,
            lower_quartile: value,
            upper_quartile: value,
        }
    }

    pub fn get(&self, kind: StatKind) -> f64 {
        match kind {
            StatKind::Mean => self.mean,
            StatKind::CiLower => self.ci_lower,
            StatKind::CiUpper => self.ci_upper,
            StatKind::Median => self.median,
            StatKind::LowerQuartile => self.lower_quartile,
            StatKind::UpperQuartile => self.upper_quartile,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StatKind {
    Mean,
    CiLower,
    CiUpper,
    Median,
    LowerQuartile,
    UpperQuartile,
}

impl StatKind {
    pub const ALL: [StatKind; 6] = [
        StatKind::Mean,
        StatKind::CiLower,
        StatKind::CiUpper,
        StatKind::Median,
        StatKind::LowerQuartile,
        StatKind::UpperQuartile,
    ];

    /// Column suffix used in summary tables.
    pub fn as_str(self) -> &'static str {
        match self {
            StatKind::Mean => "Mean",
            StatKind::CiLower => "CI_Lower",
            StatKind::CiUpper => "CI_Upper",
            StatKind::Median => "Median",
            StatKind::LowerQuartile => "Lower_Quartile",
            StatKind::UpperQuartile => "Upper_Quartile",
        }
    }

    pub fn column_name(self, metric: &str) -> String {
        format!("{metric}_{}", self.as_str())
    }
}

/// Mean and the two-sided t interval around it: `(mean, lower, upper)`.
pub fn mean_confidence_interval(
    samples: &[f64],
    confidence: f64,
) -> Result<(f64, f64, f64), StatsError> {
    if samples.is_empty() {
        return Err(StatsError::EmptyInput { what: "mean_ci" });
    }
    if !(confidence > 0.0 && confidence < 1.0) {
        return Err(StatsError::InvalidConfidence(confidence));
    }
    let n = samples.len();
    let mean = samples.iter().sum::<f64>() / n as f64;
    if n < 2 {
        return Ok((mean, mean, mean));
    }

    let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let std_err = variance.sqrt() / (n as f64).sqrt();
    let t = StudentsT::new(0.0, 1.0, (n - 1) as f64)
        .map_err(|e| StatsError::Distribution(e.to_string()))?;
    let half_width = std_err * t.inverse_cdf((1.0 + confidence) / 2.0);
    Ok((mean, mean - half_width, mean + half_width))
}

pub fn median(samples: &[f64]) -> Result<f64, StatsError> {
    if samples.is_empty() {
        return Err(StatsError::EmptyInput { what: "median" });
    }
    if has_nan(samples) {
        return Ok(f64::NAN);
    }
    let sorted = sorted_copy(samples);
    Ok(median_of_sorted(&sorted))
}

/// Lower and upper quartile, see the module docs for the convention.
pub fn quartiles(samples: &[f64]) -> Result<(f64, f64), StatsError> {
    if samples.is_empty() {
        return Err(StatsError::EmptyInput { what: "quartiles" });
    }
    if has_nan(samples) {
        return Ok((f64::NAN, f64::NAN));
    }
    let sorted = sorted_copy(samples);
    if sorted.len() == 1 {
        return Ok((sorted[0], sorted[0]));
    }
    let mid = sorted.len() / 2;
    let lower = &sorted[..mid];
    let upper = if sorted.len() % 2 == 0 {
        &sorted[mid..]
    } else {
        &sorted[mid + 1..]
    };
    Ok((median_of_sorted(lower), median_of_sorted(upper)))
}

/// Compute all six statistics. A single sample collapses every statistic onto it.
pub fn summarize(samples: &[f64], confidence: f64) -> Result<Summary, StatsError> {
    match samples {
        [] => Err(StatsError::EmptyInput { what: "statistics" }),
        [only] => Ok(Summary::single(*only)),
        _ => {
            let (mean, ci_lower, ci_upper) = mean_confidence_interval(samples, confidence)?;
            let (lower_quartile, upper_quartile) = quartiles(samples)?;
            Ok(Summary {
                mean,
                ci_lower,
                ci_upper,
                median: median(samples)?,
                lower_quartile,
                upper_quartile,
            })
        }
    }
}

/// NaN anywhere in a sample makes every order statistic NaN, like the mean.
fn has_nan(samples: &[f64]) -> bool {
    samples.iter().any(|v| v.is_nan())
}

fn sorted_copy(samples: &[f64]) -> Vec<f64> {
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

fn median_of_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    }
}
