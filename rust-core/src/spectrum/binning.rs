//! Logarithmic frequency binning
//!
//! Averages a power-like spectrum into bins evenly spaced in log10(f). The
//! DC sample is kept as its own bin; bins that receive no samples are
//! dropped, so the output axis is non-uniform and variable length.

/// Bin `power` over `freq` with `bins_per_decade` bins per decade.
///
/// # Returns
/// `(bin_centres, mean_power)`, both empty when no strictly positive
/// frequency is present (DC-only input included).
pub fn log_bin(freq: &[f64], power: &[f64], bins_per_decade: usize) -> (Vec<f64>, Vec<f64>) {
    let n = freq.len().min(power.len());
    if n == 0 {
        return (Vec::new(), Vec::new());
    }

    let (dc, freq, power) = if freq[0] == 0.0 {
        (Some(power[0]), &freq[1..n], &power[1..n])
    } else {
        (None, &freq[..n], &power[..n])
    };

    let samples: Vec<(f64, f64)> = freq
        .iter()
        .zip(power)
        .filter(|(f, _)| f.is_finite() && **f > 0.0)
        .map(|(&f, &p)| (f, p))
        .collect();
    if samples.is_empty() {
        return (Vec::new(), Vec::new());
    }

    let (f_min, f_max) = samples
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(f, _)| (lo.min(f), hi.max(f)));
    let log_min = f_min.log10();
    let log_max = f_max.log10();

    let num_bins = (((log_max - log_min) * bins_per_decade as f64).ceil() as usize).max(1);
    let log_edges: Vec<f64> = (0..=num_bins)
        .map(|i| log_min + (log_max - log_min) * i as f64 / num_bins as f64)
        .collect();
    let upper_edges: Vec<f64> = log_edges[1..].iter().map(|e| 10f64.powf(*e)).collect();

    let mut sums = vec![0.0; num_bins];
    let mut counts = vec![0usize; num_bins];
    for &(f, p) in &samples {
        // Bin i covers [edge_i, edge_i+1); the last bin also takes f_max
        let bin = upper_edges.partition_point(|&edge| edge <= f).min(num_bins - 1);
        sums[bin] += p;
        counts[bin] += 1;
    }

    let mut binned_freq = Vec::with_capacity(num_bins + 1);
    let mut binned_power = Vec::with_capacity(num_bins + 1);
    if let Some(p0) = dc {
        binned_freq.push(0.0);
        binned_power.push(p0);
    }
    for (i, (&sum, &count)) in sums.iter().zip(&counts).enumerate() {
        if count > 0 {
            binned_freq.push(10f64.powf(0.5 * (log_edges[i] + log_edges[i + 1])));
            binned_power.push(sum / count as f64);
        }
    }

    (binned_freq, binned_power)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binning_shrinks_and_keeps_dc() {
        let freq: Vec<f64> = (0..1001).map(|k| k as f64 * 0.1).collect();
        let power: Vec<f64> = (0..1001).map(|k| 1.0 + k as f64).collect();

        let (bf, bp) = log_bin(&freq, &power, 10);

        assert!(bf.len() <= freq.len());
        assert_eq!(bf.len(), bp.len());
        assert_eq!(bf[0], 0.0);
        assert_eq!(bp[0], 1.0);
        assert!(bf.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_bin_count_and_means() {
        // Three decades at one bin per decade
        let freq = vec![1.0, 2.0, 10.0, 20.0, 100.0, 1000.0];
        let power = vec![1.0, 3.0, 10.0, 30.0, 100.0, 1000.0];

        let (bf, bp) = log_bin(&freq, &power, 1);

        assert_eq!(bf.len(), 3);
        assert!((bf[0] - 10f64.sqrt()).abs() < 1e-9);
        assert_eq!(bp[0], 2.0);
        assert_eq!(bp[1], 20.0);
        // Last bin is closed: 100 and 1000 both land in it
        assert_eq!(bp[2], 550.0);
    }

    #[test]
    fn test_empty_bins_are_dropped() {
        let freq = vec![1.0, 1.1, 1000.0];
        let power = vec![4.0, 4.0, 9.0];

        let (bf, bp) = log_bin(&freq, &power, 10);
        assert_eq!(bf.len(), 2);
        assert_eq!(bp, vec![4.0, 9.0]);
    }

    #[test]
    fn test_degenerate_inputs() {
        let (bf, bp) = log_bin(&[], &[], 10);
        assert!(bf.is_empty() && bp.is_empty());

        let (bf, bp) = log_bin(&[0.0], &[1.0], 10);
        assert!(bf.is_empty() && bp.is_empty());

        let (bf, bp) = log_bin(&[0.0, 0.0, 0.0], &[1.0, 2.0, 3.0], 10);
        assert!(bf.is_empty() && bp.is_empty());

        // A single positive frequency is one bin
        let (bf, bp) = log_bin(&[0.0, 5.0], &[1.0, 2.0], 10);
        assert_eq!(bf.len(), 2);
        assert!((bf[1] - 5.0).abs() < 1e-12);
        assert_eq!(bp, vec![1.0, 2.0]);
    }
}
