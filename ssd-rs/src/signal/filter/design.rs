//! Windowed-sinc FIR design.
//!
//! Functions located in the [`Filter design` section of
//! `scipy.signal`](https://docs.scipy.org/doc/scipy/reference/signal.html#filter-design),
//! restricted to the Hamming-windowed `firwin` design the band-pass collaborator needs.

use crate::kernel::{bind_output, ensure_positive, ConfigError, ExecInvariantViolation, KernelLifecycle, Write1D};
use crate::signal::traits::FirWinDesign;
use crate::signal::windows::hamming;
use core::f64::consts::PI;

/// Pass-band shape of a `firwin` design.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterBandType {
    /// One cutoff, passes DC.
    Lowpass,
    /// One cutoff, passes Nyquist. Requires an odd number of taps.
    Highpass,
    /// Two cutoffs, passes the band between them.
    Bandpass,
}

/// Constructor config for [`FirWinKernel`].
#[derive(Debug, Clone, PartialEq)]
pub struct FirWinConfig {
    /// Number of filter taps.
    pub numtaps: usize,
    /// Cutoff frequencies in Hz, strictly increasing, inside `(0, fs / 2)`.
    pub cutoff: Vec<f64>,
    /// Filter pass-band type.
    pub pass_zero: FilterBandType,
    /// Sample rate in Hz.
    pub fs: f64,
}

/// Trait-first Hamming-windowed FIR design kernel.
#[derive(Debug, Clone, PartialEq)]
pub struct FirWinKernel {
    numtaps: usize,
    cutoff: Vec<f64>,
    pass_zero: FilterBandType,
    fs: f64,
}

impl KernelLifecycle for FirWinKernel {
    type Config = FirWinConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        if config.numtaps == 0 {
            return Err(ConfigError::InvalidArgument {
                arg: "numtaps",
                reason: "numtaps must be greater than zero",
            });
        }
        let fs = ensure_positive("fs", config.fs)?;
        if config.cutoff.is_empty() {
            return Err(ConfigError::EmptyInput { arg: "cutoff" });
        }
        let expected_cutoffs = match config.pass_zero {
            FilterBandType::Lowpass | FilterBandType::Highpass => 1,
            FilterBandType::Bandpass => 2,
        };
        if config.cutoff.len() != expected_cutoffs {
            return Err(ConfigError::InvalidArgument {
                arg: "cutoff",
                reason: "cutoff count does not match the band type",
            });
        }
        let nyq = 0.5 * fs;
        if config
            .cutoff
            .iter()
            .any(|c| !c.is_finite() || *c <= 0.0 || *c >= nyq)
        {
            return Err(ConfigError::InvalidArgument {
                arg: "cutoff",
                reason: "cutoff frequencies must lie strictly between 0 and fs / 2",
            });
        }
        if config.cutoff.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(ConfigError::InvalidArgument {
                arg: "cutoff",
                reason: "cutoff frequencies must be strictly increasing",
            });
        }
        if config.pass_zero == FilterBandType::Highpass && config.numtaps % 2 == 0 {
            return Err(ConfigError::InvalidArgument {
                arg: "numtaps",
                reason: "a filter passing Nyquist must have an odd number of taps",
            });
        }

        Ok(Self {
            numtaps: config.numtaps,
            cutoff: config.cutoff,
            pass_zero: config.pass_zero,
            fs,
        })
    }
}

fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        let px = PI * x;
        px.sin() / px
    }
}

impl FirWinKernel {
    /// Band edges normalised to Nyquist, as `(left, right)` pairs.
    fn bands(&self) -> Vec<(f64, f64)> {
        let nyq = 0.5 * self.fs;
        let normalised = self.cutoff.iter().map(|c| c / nyq);
        let edges: Vec<f64> = match self.pass_zero {
            FilterBandType::Lowpass => core::iter::once(0.0).chain(normalised).collect(),
            FilterBandType::Highpass => normalised.chain(core::iter::once(1.0)).collect(),
            FilterBandType::Bandpass => normalised.collect(),
        };
        edges.chunks_exact(2).map(|pair| (pair[0], pair[1])).collect()
    }

    fn design(&self) -> Vec<f64> {
        let bands = self.bands();
        let alpha = 0.5 * (self.numtaps - 1) as f64;
        let window = hamming(self.numtaps, false);

        let mut taps: Vec<f64> = (0..self.numtaps)
            .map(|i| {
                let m = i as f64 - alpha;
                bands
                    .iter()
                    .map(|&(left, right)| right * sinc(right * m) - left * sinc(left * m))
                    .sum::<f64>()
            })
            .zip(window.iter())
            .map(|(h, w)| h * w)
            .collect();

        // Unity gain at the centre of the first pass band.
        let (left, right) = bands[0];
        let scale_frequency = if left == 0.0 {
            0.0
        } else if right == 1.0 {
            1.0
        } else {
            0.5 * (left + right)
        };
        let gain: f64 = taps
            .iter()
            .enumerate()
            .map(|(i, h)| h * (PI * (i as f64 - alpha) * scale_frequency).cos())
            .sum();
        for h in taps.iter_mut() {
            *h /= gain;
        }
        // Exact linear-phase symmetry.
        let n = taps.len();
        for i in 0..n / 2 {
            taps[n - 1 - i] = taps[i];
        }
        taps
    }
}

impl FirWinDesign<f64> for FirWinKernel {
    fn run_into<O>(&self, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        O: Write1D<f64> + ?Sized,
    {
        bind_output(out, "out", self.numtaps)?.copy_from_slice(&self.design());
        Ok(())
    }

    fn run_alloc(&self) -> Result<Vec<f64>, ExecInvariantViolation> {
        Ok(self.design())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn response_at(taps: &[f64], freq: f64, fs: f64) -> f64 {
        let (re, im) = taps.iter().enumerate().fold((0.0, 0.0), |(re, im), (n, h)| {
            let phase = 2.0 * PI * freq / fs * n as f64;
            (re + h * phase.cos(), im - h * phase.sin())
        });
        (re * re + im * im).sqrt()
    }

    #[test]
    fn bandpass_is_linear_phase_with_unit_centre_gain() {
        let kernel = FirWinKernel::try_new(FirWinConfig {
            numtaps: 207,
            cutoff: vec![7.0, 14.0],
            pass_zero: FilterBandType::Bandpass,
            fs: 250.0,
        })
        .expect("valid firwin config");
        let taps = kernel.run_alloc().expect("design");
        assert_eq!(taps.len(), 207);
        let mirrored: Vec<f64> = taps.iter().rev().copied().collect();
        assert_eq!(taps, mirrored);
        assert_abs_diff_eq!(response_at(&taps, 10.5, 250.0), 1.0, epsilon = 1e-9);
        assert!(response_at(&taps, 40.0, 250.0) < 1e-2);
        assert!(response_at(&taps, 0.0, 250.0) < 1e-2);
    }

    #[test]
    fn lowpass_passes_dc() {
        let kernel = FirWinKernel::try_new(FirWinConfig {
            numtaps: 101,
            cutoff: vec![30.0],
            pass_zero: FilterBandType::Lowpass,
            fs: 250.0,
        })
        .expect("valid firwin config");
        let taps = kernel.run_alloc().expect("design");
        assert_abs_diff_eq!(taps.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert!(response_at(&taps, 80.0, 250.0) < 1e-2);
    }

    #[test]
    fn highpass_passes_nyquist() {
        let kernel = FirWinKernel::try_new(FirWinConfig {
            numtaps: 101,
            cutoff: vec![30.0],
            pass_zero: FilterBandType::Highpass,
            fs: 250.0,
        })
        .expect("valid firwin config");
        let taps = kernel.run_alloc().expect("design");
        assert_abs_diff_eq!(response_at(&taps, 125.0, 250.0), 1.0, epsilon = 1e-9);
        assert!(response_at(&taps, 0.0, 250.0) < 1e-2);
    }

    #[test]
    fn firwin_kernel_rejects_invalid_config() {
        let base = FirWinConfig {
            numtaps: 100,
            cutoff: vec![30.0],
            pass_zero: FilterBandType::Highpass,
            fs: 250.0,
        };
        assert!(FirWinKernel::try_new(base.clone()).is_err());
        assert!(FirWinKernel::try_new(FirWinConfig {
            cutoff: vec![14.0, 7.0],
            pass_zero: FilterBandType::Bandpass,
            ..base.clone()
        })
        .is_err());
        assert!(FirWinKernel::try_new(FirWinConfig {
            cutoff: vec![125.0],
            numtaps: 101,
            ..base.clone()
        })
        .is_err());
        assert_eq!(
            FirWinKernel::try_new(FirWinConfig {
                fs: f64::NAN,
                ..base
            }),
            Err(ConfigError::NonFinite { arg: "fs" })
        );
    }

    #[test]
    fn run_into_checks_output_length() {
        let kernel = FirWinKernel::try_new(FirWinConfig {
            numtaps: 11,
            cutoff: vec![30.0],
            pass_zero: FilterBandType::Lowpass,
            fs: 250.0,
        })
        .expect("valid firwin config");
        let mut out = vec![0.0; 10];
        assert!(matches!(
            kernel.run_into(&mut out),
            Err(ExecInvariantViolation::LengthMismatch { .. })
        ));
    }
}
