//! Band-limited channel covariances.

use super::params::FilterParams;
use super::signals::Signals;
use crate::error::Result;
use crate::linalg::symmetrize;
use crate::signal::traits::BandPassFilter;
use ndarray::{Array2, ArrayView2, Axis};

/// Empirical covariance of `x` (`[channels, samples]`): rows centred, normalised by the
/// sample count, symmetrised.
pub fn empirical_covariance(x: ArrayView2<'_, f64>) -> Array2<f64> {
    let n_samples = x.ncols().max(1) as f64;
    let mut centered = x.to_owned();
    for mut row in centered.axis_iter_mut(Axis(0)) {
        let mean = row.mean().unwrap_or(0.0);
        row -= mean;
    }
    let mut cov = centered.dot(&centered.t()) / n_samples;
    symmetrize(&mut cov);
    cov
}

/// Signal-band and flanking-noise-band covariances over the picked channels.
#[derive(Debug, Clone, PartialEq)]
pub struct BandCovariances {
    /// Covariance of the signal-band filtered data.
    pub signal: Array2<f64>,
    /// Covariance of the noise-band filtered data minus the signal-band filtered data.
    pub noise: Array2<f64>,
}

impl BandCovariances {
    /// `signal + noise`.
    pub fn combined(&self) -> Array2<f64> {
        &self.signal + &self.noise
    }
}

/// Filters data in both bands and accumulates their covariances.
#[derive(Debug)]
pub struct BandCovarianceEstimator<'a, B> {
    filter: &'a B,
    sfreq: f64,
    signal: &'a FilterParams,
    noise: &'a FilterParams,
}

impl<'a, B: BandPassFilter> BandCovarianceEstimator<'a, B> {
    /// Estimator using `filter` at `sfreq` with the two band specifications.
    pub fn new(filter: &'a B, sfreq: f64, signal: &'a FilterParams, noise: &'a FilterParams) -> Self {
        Self {
            filter,
            sfreq,
            signal,
            noise,
        }
    }

    /// Covariances of `x` restricted to the `picks` rows and columns.
    ///
    /// Every channel is filtered; trials contribute equally to the average.
    pub fn estimate(&self, x: &Signals<'_>, picks: &[usize]) -> Result<BandCovariances> {
        let n = x.n_channels();
        let mut signal = Array2::<f64>::zeros((n, n));
        let mut noise = Array2::<f64>::zeros((n, n));
        for epoch in x.epochs() {
            let in_signal = self.filter.filter(epoch, self.sfreq, self.signal)?;
            let in_noise = self.filter.filter(epoch, self.sfreq, self.noise)? - &in_signal;
            signal += &empirical_covariance(in_signal.view());
            noise += &empirical_covariance(in_noise.view());
        }
        let n_epochs = x.n_epochs() as f64;
        signal /= n_epochs;
        noise /= n_epochs;

        let select = |c: Array2<f64>| c.select(Axis(0), picks).select(Axis(1), picks);
        let covs = BandCovariances {
            signal: select(signal),
            noise: select(noise),
        };
        tracing::debug!(
            channels = n,
            picks = picks.len(),
            epochs = x.n_epochs(),
            "estimated band covariances"
        );
        Ok(covs)
    }
}
