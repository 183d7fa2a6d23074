//! Window functions.

use core::f64::consts::PI;

/// Hamming window of length `nx`.
///
/// `fftbins = true` yields the periodic variant used for spectral analysis, `false` the
/// symmetric variant used for FIR design.
pub fn hamming(nx: usize, fftbins: bool) -> Vec<f64> {
    match nx {
        0 => Vec::new(),
        1 => vec![1.0],
        _ => {
            let period = (if fftbins { nx } else { nx - 1 }) as f64;
            (0..nx)
                .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / period).cos())
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn symmetric_hamming_matches_reference() {
        // scipy.signal.get_window("hamming", 5, fftbins=False)
        let expected = [0.08, 0.54, 1.0, 0.54, 0.08];
        for (a, b) in hamming(5, false).iter().zip(expected) {
            assert_abs_diff_eq!(*a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn periodic_hamming_drops_the_closing_sample() {
        let periodic = hamming(8, true);
        let symmetric = hamming(9, false);
        assert_eq!(periodic.len(), 8);
        for (a, b) in periodic.iter().zip(&symmetric) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn degenerate_lengths() {
        assert!(hamming(0, true).is_empty());
        assert_eq!(hamming(1, false), vec![1.0]);
    }
}
