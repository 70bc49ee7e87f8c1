//! Statistical utilities for the index engine.
//!
//! This module provides the common statistical functions used across EDR
//! estimation and rolling feature computation. Population statistics are
//! defined for any non-empty slice; sample statistics require at least two
//! values.

/// Calculate the mean of a slice of values.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Calculate the median of a slice of values.
///
/// For an even count, the average of the two middle values. Invariant under
/// reordering of the input.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

/// Calculate the population variance (n denominator).
pub fn population_variance(values: &[f64]) -> Option<f64> {
    let mean_val = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - mean_val).powi(2)).sum();
    Some(sum_sq / values.len() as f64)
}

/// Calculate the population standard deviation.
pub fn population_std_dev(values: &[f64]) -> Option<f64> {
    population_variance(values).map(|v| v.sqrt())
}

/// Calculate the sample variance (n-1 denominator).
pub fn sample_variance(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let mean_val = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - mean_val).powi(2)).sum();
    Some(sum_sq / (n - 1) as f64)
}

/// Calculate the sample standard deviation (n-1 denominator).
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    sample_variance(values).map(|v| v.sqrt())
}

/// Calculate the population coefficient of variation (std dev / mean).
///
/// Returns `None` for an empty slice or a non-positive mean.
pub fn coefficient_of_variation(values: &[f64]) -> Option<f64> {
    let mean_val = mean(values)?;
    if mean_val <= 0.0 {
        return None;
    }
    population_std_dev(values).map(|sd| sd / mean_val)
}
