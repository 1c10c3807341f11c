//! Small numeric helpers shared by the scoring pipeline (C4/C6) and the
//! rule updater (C8) — spec.md §4.4/§4.6/§4.8 all compute percentiles or
//! mean/stdev over the same kind of sorted sample.

/// Nearest-rank percentile over an already-sorted slice. `0.0` on empty input.
pub fn percentile(sorted: &[f64], pct: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = (pct * (sorted.len() - 1) as f64).round() as usize;
    sorted[rank.min(sorted.len() - 1)]
}

pub fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        0.0
    } else {
        xs.iter().sum::<f64>() / xs.len() as f64
    }
}

pub fn stdev(xs: &[f64], mean_value: f64) -> f64 {
    if xs.len() < 2 {
        return 0.0;
    }
    let variance = xs.iter().map(|x| (x - mean_value).powi(2)).sum::<f64>() / xs.len() as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentile_of_empty_is_zero() {
        assert_eq!(percentile(&[], 0.95), 0.0);
    }

    #[test]
    fn p95_on_evenly_spaced_sample() {
        let xs: Vec<f64> = (1..=100).map(|n| n as f64).collect();
        let p95 = percentile(&xs, 0.95);
        assert!((p95 - 95.0).abs() < 1.0);
    }

    #[test]
    fn mean_and_stdev_of_constant_sample_is_zero_variance() {
        let xs = vec![5.0; 10];
        let m = mean(&xs);
        assert_eq!(m, 5.0);
        assert_eq!(stdev(&xs, m), 0.0);
    }
}
