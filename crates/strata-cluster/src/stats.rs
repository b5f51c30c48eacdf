/// Arithmetic mean; `NaN` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample variance with an `n - 1` denominator; zero for fewer than two values.
pub fn sample_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let centre = mean(values);
    let sum_sq: f64 = values.iter().map(|v| (v - centre).powi(2)).sum();
    sum_sq / (values.len() - 1) as f64
}

/// Sample standard deviation; `None` for fewer than two values.
pub fn sample_sd(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        None
    } else {
        Some(sample_variance(values).sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variance_uses_sample_denominator() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((mean(&values) - 5.0).abs() < 1e-12);
        assert!((sample_variance(&values) - 32.0 / 7.0).abs() < 1e-12);
        assert_eq!(sample_sd(&[1.0]), None);
        assert_eq!(sample_variance(&[1.0]), 0.0);
    }
}
