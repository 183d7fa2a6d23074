//! Simulated recordings for the decoding tests.

use super::params::FilterParams;
use crate::linalg::to_array2;
use crate::signal::filter::FirBandPass;
use crate::signal::traits::BandPassFilter;
use nalgebra::DMatrix;
use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

pub(crate) const SFREQ: f64 = 250.0;

pub(crate) fn signal_band() -> FilterParams {
    FilterParams::new(9.0, 12.0).with_trans_bandwidths(2.0, 2.0)
}

pub(crate) fn noise_band() -> FilterParams {
    FilterParams::new(8.0, 13.0).with_trans_bandwidths(2.0, 2.0)
}

pub(crate) struct Simulated {
    /// `[channels, samples]`.
    pub x: Array2<f64>,
    /// Orthogonal `[channels, sources]` mixing matrix; the first columns carry the oscillations.
    pub mixing: Array2<f64>,
}

/// Instantaneous mixture of `amplitudes.len()` 9-12 Hz sources and broadband white noise
/// sources, `n_channels` sources in total.
pub(crate) fn simulate(n_channels: usize, n_samples: usize, amplitudes: &[f64], seed: u64) -> Simulated {
    let mut rng = StdRng::seed_from_u64(seed);
    let mixing = DMatrix::from_fn(n_channels, n_channels, |_, _| rng.sample::<f64, _>(StandardNormal))
        .qr()
        .q();
    let mixing = to_array2(&mixing);

    let mut sources =
        Array2::from_shape_simple_fn((n_channels, n_samples), || rng.sample::<f64, _>(StandardNormal));
    let n_sig = amplitudes.len();
    let oscillations = FirBandPass
        .filter(
            sources.slice(ndarray::s![..n_sig, ..]),
            SFREQ,
            &FilterParams::new(9.0, 12.0).with_trans_bandwidths(1.0, 1.0),
        )
        .expect("source filter");
    for ((mut dst, src), amp) in sources
        .axis_iter_mut(Axis(0))
        .zip(oscillations.axis_iter(Axis(0)))
        .zip(amplitudes)
    {
        let std = src.std(0.0);
        dst.assign(&(&src * (amp / std)));
    }

    Simulated {
        x: mixing.dot(&sources),
        mixing,
    }
}

/// Numerical rank from the eigenvalues of `x xᵀ`.
pub(crate) fn numerical_rank(x: ndarray::ArrayView2<'_, f64>) -> usize {
    let gram = crate::linalg::to_dmatrix(x.dot(&x.t()).view());
    let eig = crate::linalg::eigh_descending(gram).expect("eigh");
    let max = eig.values[0];
    eig.values.iter().filter(|&&l| l > max * 1e-9).count()
}
