//! Spectral analysis helpers analogous to `scipy.signal.welch`.

use crate::error::Result;
use crate::kernel::{
    bind_output, ensure_positive, ConfigError, ExecInvariantViolation, KernelLifecycle, Read1D, Write1D,
};
use crate::signal::traits::{PowerSpectrum, PsdEstimator, WelchPsd1D};
use crate::signal::windows::hamming;
use ndarray::ArrayView1;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// One-sided bin frequencies of an `nfft`-point transform.
fn rfft_freqs(nfft: usize, fs: f64) -> Vec<f64> {
    let df = fs / nfft as f64;
    (0..=nfft / 2).map(|k| k as f64 * df).collect()
}

/// Bins other than DC and the Nyquist bin of an even transform fold in their negative twin.
fn onesided_weight(k: usize, nfft: usize) -> f64 {
    if k == 0 || 2 * k == nfft {
        1.0
    } else {
        2.0
    }
}

fn welch_impl(x: &[f64], fs: f64, nperseg: usize, noverlap: usize) -> (Vec<f64>, Vec<f64>) {
    if nperseg == 0 || noverlap >= nperseg || x.len() < nperseg {
        return (Vec::new(), Vec::new());
    }
    let hop = nperseg - noverlap;
    let n_segments = (x.len() - nperseg) / hop + 1;
    let window = hamming(nperseg, true);
    let scale = 1.0 / (fs * window.iter().map(|w| w * w).sum::<f64>() * n_segments as f64);
    let fft = FftPlanner::<f64>::new().plan_fft_forward(nperseg);

    let mut buf = vec![Complex::new(0.0, 0.0); nperseg];
    let mut pxx = vec![0.0; nperseg / 2 + 1];
    for segment in x.windows(nperseg).step_by(hop) {
        let mean = segment.iter().sum::<f64>() / nperseg as f64;
        for ((c, &v), &w) in buf.iter_mut().zip(segment).zip(&window) {
            *c = Complex::new((v - mean) * w, 0.0);
        }
        fft.process(&mut buf);
        for (k, (p, c)) in pxx.iter_mut().zip(&buf).enumerate() {
            *p += onesided_weight(k, nperseg) * c.norm_sqr() * scale;
        }
    }
    (rfft_freqs(nperseg, fs), pxx)
}

/// Constructor config for [`WelchKernel`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WelchConfig {
    /// Sampling frequency in Hz.
    pub fs: f64,
    /// Segment length, also the FFT length.
    pub nperseg: usize,
    /// Samples shared by consecutive segments.
    pub noverlap: usize,
}

/// Trait-first Welch PSD kernel.
///
/// Segments are mean-detrended and tapered with a periodic Hamming window; the result is a
/// one-sided power spectral density averaged over segments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WelchKernel {
    fs: f64,
    nperseg: usize,
    noverlap: usize,
}

impl WelchKernel {
    /// Number of one-sided frequency bins.
    pub fn n_bins(&self) -> usize {
        self.nperseg / 2 + 1
    }

    /// At least one full segment is required.
    fn check_input<'a, I>(&self, input: &'a I) -> core::result::Result<&'a [f64], ExecInvariantViolation>
    where
        I: Read1D<f64> + ?Sized,
    {
        let input = input.read_slice()?;
        if input.len() < self.nperseg {
            return Err(ExecInvariantViolation::LengthMismatch {
                arg: "input",
                expected: self.nperseg,
                got: input.len(),
            });
        }
        Ok(input)
    }
}

impl KernelLifecycle for WelchKernel {
    type Config = WelchConfig;

    fn try_new(config: Self::Config) -> core::result::Result<Self, ConfigError> {
        let fs = ensure_positive("fs", config.fs)?;
        if config.nperseg == 0 {
            return Err(ConfigError::InvalidArgument {
                arg: "nperseg",
                reason: "nperseg must be > 0",
            });
        }
        if config.noverlap >= config.nperseg {
            return Err(ConfigError::InvalidArgument {
                arg: "noverlap",
                reason: "noverlap must be less than nperseg",
            });
        }
        Ok(Self {
            fs,
            nperseg: config.nperseg,
            noverlap: config.noverlap,
        })
    }
}

impl WelchPsd1D for WelchKernel {
    fn run_into<I, OF, OP>(
        &self,
        input: &I,
        freqs: &mut OF,
        pxx: &mut OP,
    ) -> core::result::Result<(), ExecInvariantViolation>
    where
        I: Read1D<f64> + ?Sized,
        OF: Write1D<f64> + ?Sized,
        OP: Write1D<f64> + ?Sized,
    {
        let input = self.check_input(input)?;
        let f_out = bind_output(freqs, "freqs", self.n_bins())?;
        let p_out = bind_output(pxx, "pxx", self.n_bins())?;
        let (f, p) = welch_impl(input, self.fs, self.nperseg, self.noverlap);
        f_out.copy_from_slice(&f);
        p_out.copy_from_slice(&p);
        Ok(())
    }

    fn run_alloc<I>(&self, input: &I) -> core::result::Result<(Vec<f64>, Vec<f64>), ExecInvariantViolation>
    where
        I: Read1D<f64> + ?Sized,
    {
        let input = self.check_input(input)?;
        Ok(welch_impl(input, self.fs, self.nperseg, self.noverlap))
    }
}

/// Estimate power spectral density using Welch's method with non-overlapping segments.
///
/// Returns empty vectors when the configuration is invalid or `x` is shorter than `nperseg`.
pub fn welch(x: &[f64], fs: f64, nperseg: usize) -> (Vec<f64>, Vec<f64>) {
    let kernel = match WelchKernel::try_new(WelchConfig {
        fs,
        nperseg,
        noverlap: 0,
    }) {
        Ok(kernel) => kernel,
        Err(_) => return (Vec::new(), Vec::new()),
    };
    kernel.run_alloc(x).unwrap_or_default()
}

/// Default [`PsdEstimator`]: Welch's method with `n_fft`-sample, non-overlapping segments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WelchPsd;

impl PsdEstimator for WelchPsd {
    fn psd(&self, signal: ArrayView1<'_, f64>, sfreq: f64, n_fft: usize) -> Result<PowerSpectrum> {
        let kernel = WelchKernel::try_new(WelchConfig {
            fs: sfreq,
            nperseg: n_fft,
            noverlap: 0,
        })?;
        let signal = signal.as_standard_layout();
        let (frequencies, power) = kernel.run_alloc(&signal.view())?;
        Ok(PowerSpectrum { frequencies, power })
    }
}
