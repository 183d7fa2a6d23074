//! Spectral-ratio scoring of component time series.

use super::signals::Signals;
use crate::error::{Error, Result};
use crate::signal::traits::PsdEstimator;
use serde::{Deserialize, Serialize};

/// Noise-only power at or below this fraction of the total band power counts as zero.
const ZERO_NOISE_FRACTION: f64 = 1e-12;

/// Per-component spectral ratios and the order that sorts them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectralRatio {
    /// Signal-band power over flanking-band power, one per component.
    pub ratios: Vec<f64>,
    /// Component indices by descending ratio; ties keep index order.
    pub sorter: Vec<usize>,
}

/// Stable descending argsort. NaN ranks after every number.
pub fn argsort_descending(values: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&i, &j| {
        let (a, b) = (values[i], values[j]);
        match (a.is_nan(), b.is_nan()) {
            (false, false) => b.total_cmp(&a),
            (a_nan, b_nan) => a_nan.cmp(&b_nan),
        }
    });
    order
}

fn band_ratio(signal: f64, noise: f64) -> f64 {
    if noise <= ZERO_NOISE_FRACTION * (signal + noise) {
        if signal > 0.0 {
            f64::INFINITY
        } else {
            0.0
        }
    } else {
        signal / noise
    }
}

/// Scores components by how much of their power sits in the signal band.
#[derive(Debug)]
pub struct SpectralRatioScorer<'a, P> {
    psd: &'a P,
    sfreq: f64,
    n_fft: usize,
    freqs_signal: (f64, f64),
    freqs_noise: (f64, f64),
}

impl<'a, P: PsdEstimator> SpectralRatioScorer<'a, P> {
    /// Scorer for the given bands, in Hz.
    pub fn new(psd: &'a P, sfreq: f64, n_fft: usize, freqs_signal: (f64, f64), freqs_noise: (f64, f64)) -> Self {
        Self {
            psd,
            sfreq,
            n_fft,
            freqs_signal,
            freqs_noise,
        }
    }

    /// Spectrum of every component, averaged over trials.
    fn mean_spectra(&self, sources: &Signals<'_>) -> Result<(Vec<f64>, Vec<Vec<f64>>)> {
        let mut freqs = Vec::new();
        let mut spectra = vec![Vec::new(); sources.n_channels()];
        for epoch in sources.epochs() {
            for (spectrum, component) in spectra.iter_mut().zip(epoch.rows()) {
                let psd = self.psd.psd(component, self.sfreq, self.n_fft)?;
                if psd.frequencies.len() != psd.power.len() {
                    return Err(Error::InvalidArg {
                        arg: "psd".into(),
                        reason: "frequency and power vectors differ in length".into(),
                    });
                }
                if spectrum.is_empty() {
                    *spectrum = vec![0.0; psd.power.len()];
                    freqs = psd.frequencies;
                }
                spectrum.iter_mut().zip(&psd.power).for_each(|(acc, p)| *acc += p);
            }
        }
        let inv = 1.0 / sources.n_epochs() as f64;
        spectra.iter_mut().flatten().for_each(|p| *p *= inv);
        Ok((freqs, spectra))
    }

    /// Ratio of signal-band power to flanking-band power for every component of `sources`.
    ///
    /// Both band sums include their edge bins; the flanks are the noise band minus the
    /// signal band.
    pub fn score(&self, sources: &Signals<'_>) -> Result<SpectralRatio> {
        let (freqs, spectra) = self.mean_spectra(sources)?;
        let in_band = |f: f64, (lo, hi): (f64, f64)| f >= lo && f <= hi;

        let ratios: Vec<f64> = spectra
            .iter()
            .map(|power| {
                let (mut signal, mut noise) = (0.0, 0.0);
                for (&f, &p) in freqs.iter().zip(power) {
                    if in_band(f, self.freqs_signal) {
                        signal += p;
                    } else if in_band(f, self.freqs_noise) {
                        noise += p;
                    }
                }
                band_ratio(signal, noise)
            })
            .collect();
        let sorter = argsort_descending(&ratios);
        Ok(SpectralRatio { ratios, sorter })
    }
}
