//! Small statistics helpers.

use statrs::distribution::{ContinuousCDF, Normal};

/// Median of `values`, sorting in place. `None` for an empty slice.
///
/// Even counts average the two middle values.
pub fn median_mut(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some((values[mid - 1] + values[mid]) / 2.0)
    }
}

/// Two-sided standard normal critical value for `confidence_level`.
///
/// `0.95` gives ~1.96. Returns `None` outside `(0, 1)`.
pub fn normal_critical_value(confidence_level: f64) -> Option<f64> {
    if !(confidence_level > 0.0 && confidence_level < 1.0) {
        return None;
    }
    let normal = Normal::new(0.0, 1.0).ok()?;
    let z = normal.inverse_cdf(0.5 + confidence_level / 2.0);
    z.is_finite().then_some(z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_odd_even_empty() {
        assert_eq!(median_mut(&mut [3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median_mut(&mut [4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median_mut(&mut []), None);
    }

    #[test]
    fn normal_critical_values() {
        let z95 = normal_critical_value(0.95).unwrap();
        assert!((z95 - 1.959964).abs() < 1e-5, "got {z95}");
        let z80 = normal_critical_value(0.80).unwrap();
        assert!((z80 - 1.281552).abs() < 1e-5, "got {z80}");
        assert!(normal_critical_value(1.0).is_none());
        assert!(normal_critical_value(0.0).is_none());
    }
}
