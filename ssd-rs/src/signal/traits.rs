//! Trait interfaces for signal-processing capabilities.
//!
//! The `run_into`/`run_alloc` traits are implemented by the validated kernels in this module
//! tree. [`BandPassFilter`] and [`PsdEstimator`] are the seams through which SSD consumes
//! filtering and spectral estimation; any implementation honouring their contracts can be
//! plugged into [`crate::Ssd`].

use crate::decoding::FilterParams;
use crate::error::Result;
use crate::kernel::{ExecInvariantViolation, Read1D, Write1D};
use ndarray::{Array2, ArrayView1, ArrayView2};

/// FIR design capability.
pub trait FirWinDesign<T> {
    /// Run FIR design into a caller-provided output buffer.
    fn run_into<O>(&self, out: &mut O) -> core::result::Result<(), ExecInvariantViolation>
    where
        O: Write1D<T> + ?Sized;

    /// Run FIR design and allocate output coefficients.
    fn run_alloc(&self) -> core::result::Result<Vec<T>, ExecInvariantViolation>;
}

/// Row-wise (per channel) filtering of a `[channels, samples]` matrix.
pub trait FilterRows2D<T> {
    /// Filter every row and allocate the output matrix, same shape as the input.
    fn run_alloc(&self, data: ArrayView2<'_, T>) -> core::result::Result<Array2<T>, ExecInvariantViolation>;
}

/// Welch power spectral density capability.
pub trait WelchPsd1D {
    /// Run Welch PSD estimation into caller-provided frequency and power buffers.
    fn run_into<I, OF, OP>(
        &self,
        input: &I,
        freqs: &mut OF,
        pxx: &mut OP,
    ) -> core::result::Result<(), ExecInvariantViolation>
    where
        I: Read1D<f64> + ?Sized,
        OF: Write1D<f64> + ?Sized,
        OP: Write1D<f64> + ?Sized;

    /// Run Welch PSD estimation and allocate `(freqs, pxx)`.
    fn run_alloc<I>(&self, input: &I) -> core::result::Result<(Vec<f64>, Vec<f64>), ExecInvariantViolation>
    where
        I: Read1D<f64> + ?Sized;
}

/// Band-pass filter collaborator.
///
/// Contract: returns a filtered copy of `data` (`[channels, samples]`) with the same shape,
/// each channel filtered independently with the pass band described by `params` at sampling
/// rate `sfreq`.
pub trait BandPassFilter {
    /// Filter every channel of `data`.
    fn filter(&self, data: ArrayView2<'_, f64>, sfreq: f64, params: &FilterParams) -> Result<Array2<f64>>;
}

/// One-sided power spectrum of a single time series.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PowerSpectrum {
    /// Frequency of every bin in Hz, ascending.
    pub frequencies: Vec<f64>,
    /// Power spectral density of every bin.
    pub power: Vec<f64>,
}

/// Power spectral density collaborator.
///
/// Contract: `frequencies` and `power` have equal length, frequencies ascend from 0 Hz and
/// `power` is non-negative.
pub trait PsdEstimator {
    /// Estimate the spectrum of `signal` sampled at `sfreq` using windows of `n_fft` samples.
    fn psd(&self, signal: ArrayView1<'_, f64>, sfreq: f64, n_fft: usize) -> Result<PowerSpectrum>;
}
