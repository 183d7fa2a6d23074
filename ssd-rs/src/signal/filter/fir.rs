use crate::decoding::FilterParams;
use crate::error::Result;
use crate::kernel::{ensure_finite, ensure_positive, ConfigError, ExecInvariantViolation, KernelLifecycle};
use crate::signal::traits::{BandPassFilter, FilterRows2D, FirWinDesign};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use ssd_rs_core::num_rs::{convolve, ConvolveMode};

use super::design::{FilterBandType, FirWinConfig, FirWinKernel};

/// Transition-band length factor of the Hamming window.
const HAMMING_LENGTH_FACTOR: f64 = 3.3;

/// Mirrored taps may differ by this fraction of the largest tap magnitude.
const SYMMETRY_RTOL: f64 = 1e-12;

/// Extend `x` by `n_pad` samples on both ends with an odd reflection about the edge samples.
///
/// The reflection never reaches further than `x.len() - 1` samples; any remainder is zero.
pub fn reflect_limited(x: &[f64], n_pad: usize) -> Vec<f64> {
    let n = x.len();
    if n == 0 {
        return vec![0.0; 2 * n_pad];
    }
    let reflect = n_pad.min(n - 1);
    let zeros = n_pad - reflect;
    let (first, last) = (x[0], x[n - 1]);

    let mut out = Vec::with_capacity(n + 2 * n_pad);
    out.extend(core::iter::repeat_n(0.0, zeros));
    out.extend((1..=reflect).rev().map(|k| 2.0 * first - x[k]));
    out.extend_from_slice(x);
    out.extend((1..=reflect).map(|k| 2.0 * last - x[n - 1 - k]));
    out.extend(core::iter::repeat_n(0.0, zeros));
    out
}

/// Constructor config for [`ZeroPhaseFirKernel`].
#[derive(Debug, Clone, PartialEq)]
pub struct ZeroPhaseFirConfig {
    /// Symmetric (linear-phase) FIR taps of odd length.
    pub taps: Vec<f64>,
}

/// Applies a linear-phase FIR filter with its group delay compensated.
#[derive(Debug, Clone, PartialEq)]
pub struct ZeroPhaseFirKernel {
    taps: Array1<f64>,
}

impl KernelLifecycle for ZeroPhaseFirKernel {
    type Config = ZeroPhaseFirConfig;

    fn try_new(config: Self::Config) -> core::result::Result<Self, ConfigError> {
        if config.taps.is_empty() {
            return Err(ConfigError::EmptyInput { arg: "taps" });
        }
        if config.taps.len() % 2 == 0 {
            return Err(ConfigError::InvalidArgument {
                arg: "taps",
                reason: "zero-phase filtering needs an odd number of taps",
            });
        }
        let n = config.taps.len();
        let tol = SYMMETRY_RTOL * config.taps.iter().fold(0.0_f64, |m, t| m.max(t.abs()));
        if (0..n / 2).any(|i| (config.taps[i] - config.taps[n - 1 - i]).abs() > tol) {
            return Err(ConfigError::InvalidArgument {
                arg: "taps",
                reason: "taps must be symmetric",
            });
        }
        Ok(Self {
            taps: Array1::from(config.taps),
        })
    }
}

impl ZeroPhaseFirKernel {
    /// Number of taps.
    pub fn len(&self) -> usize {
        self.taps.len()
    }

    /// Whether the kernel has no taps (never true for a constructed kernel).
    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }

    /// Filter one channel.
    pub fn run_row(&self, x: ArrayView1<'_, f64>) -> core::result::Result<Array1<f64>, ExecInvariantViolation> {
        let n = x.len();
        if n == 0 {
            return Err(ExecInvariantViolation::InvalidState {
                reason: "cannot filter an empty signal",
            });
        }
        let x = x.as_standard_layout();
        let x = x.as_slice().ok_or(ExecInvariantViolation::InvalidState {
            reason: "channel data is not contiguous",
        })?;

        let n_taps = self.taps.len();
        let n_pad = n_taps.min(n) - 1;
        let extended = Array1::from(reflect_limited(x, n_pad));
        let full = convolve(extended.view(), self.taps.view(), ConvolveMode::Full).map_err(|_| {
            ExecInvariantViolation::InvalidState {
                reason: "fft convolution failed",
            }
        })?;
        let delay = (n_taps - 1) / 2;
        Ok(full.slice_move(ndarray::s![n_pad + delay..n_pad + delay + n]))
    }
}

impl FilterRows2D<f64> for ZeroPhaseFirKernel {
    fn run_alloc(
        &self,
        data: ArrayView2<'_, f64>,
    ) -> core::result::Result<Array2<f64>, ExecInvariantViolation> {
        if data.ncols() < self.taps.len() {
            tracing::warn!(
                taps = self.taps.len(),
                samples = data.ncols(),
                "filter is longer than the signal; edge padding dominates the output"
            );
        }
        let mut out = Array2::zeros(data.raw_dim());
        for (row_in, mut row_out) in data.axis_iter(Axis(0)).zip(out.axis_iter_mut(Axis(0))) {
            row_out.assign(&self.run_row(row_in)?);
        }
        Ok(out)
    }
}

/// Constructor config for [`FirBandPassKernel`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FirBandPassConfig {
    /// Sampling rate in Hz.
    pub sfreq: f64,
    /// Lower pass-band edge in Hz; `0` designs a low-pass.
    pub l_freq: f64,
    /// Upper pass-band edge in Hz.
    pub h_freq: f64,
    /// Width of the lower transition band; `None` picks it automatically.
    pub l_trans_bandwidth: Option<f64>,
    /// Width of the upper transition band; `None` picks it automatically.
    pub h_trans_bandwidth: Option<f64>,
}

/// Hamming-windowed FIR band-pass, applied with zero phase.
///
/// The cutoffs sit in the middle of each transition band, and the length is chosen so the
/// narrowest transition band is resolved by the Hamming window.
#[derive(Debug, Clone, PartialEq)]
pub struct FirBandPassKernel {
    l_trans_bandwidth: f64,
    h_trans_bandwidth: f64,
    fir: ZeroPhaseFirKernel,
}

fn auto_l_trans(l_freq: f64) -> f64 {
    (0.25 * l_freq).max(2.0).min(l_freq)
}

fn auto_h_trans(h_freq: f64, nyq: f64) -> f64 {
    (0.25 * h_freq).max(2.0).min(nyq - h_freq)
}

impl KernelLifecycle for FirBandPassKernel {
    type Config = FirBandPassConfig;

    fn try_new(config: Self::Config) -> core::result::Result<Self, ConfigError> {
        let sfreq = ensure_positive("sfreq", config.sfreq)?;
        let l_freq = ensure_finite("l_freq", config.l_freq)?;
        let h_freq = ensure_finite("h_freq", config.h_freq)?;
        let nyq = 0.5 * sfreq;
        if l_freq < 0.0 {
            return Err(ConfigError::InvalidArgument {
                arg: "l_freq",
                reason: "l_freq must be >= 0",
            });
        }
        if h_freq <= l_freq {
            return Err(ConfigError::InvalidArgument {
                arg: "h_freq",
                reason: "h_freq must be greater than l_freq",
            });
        }
        if h_freq >= nyq {
            return Err(ConfigError::InvalidArgument {
                arg: "h_freq",
                reason: "h_freq must be below the Nyquist frequency",
            });
        }

        let h_trans = match config.h_trans_bandwidth {
            Some(bw) => ensure_finite("h_trans_bandwidth", bw)?,
            None => auto_h_trans(h_freq, nyq),
        };
        if h_trans <= 0.0 || h_freq + h_trans > nyq {
            return Err(ConfigError::InvalidArgument {
                arg: "h_trans_bandwidth",
                reason: "upper stop-band edge must lie in (h_freq, Nyquist]",
            });
        }
        let l_trans = if l_freq > 0.0 {
            let bw = match config.l_trans_bandwidth {
                Some(bw) => ensure_finite("l_trans_bandwidth", bw)?,
                None => auto_l_trans(l_freq),
            };
            if bw <= 0.0 || bw > l_freq {
                return Err(ConfigError::InvalidArgument {
                    arg: "l_trans_bandwidth",
                    reason: "lower stop-band edge must lie in [0, l_freq)",
                });
            }
            bw
        } else {
            0.0
        };

        let min_trans = if l_freq > 0.0 {
            l_trans.min(h_trans)
        } else {
            h_trans
        };
        let mut numtaps = ((HAMMING_LENGTH_FACTOR * sfreq / min_trans).ceil() as usize).max(1);
        if numtaps % 2 == 0 {
            numtaps += 1;
        }

        let h_cut = h_freq + 0.5 * h_trans;
        let (cutoff, pass_zero) = if l_freq > 0.0 {
            (vec![l_freq - 0.5 * l_trans, h_cut], FilterBandType::Bandpass)
        } else {
            (vec![h_cut], FilterBandType::Lowpass)
        };
        tracing::debug!(numtaps, ?cutoff, sfreq, "designing FIR band-pass");

        let design = FirWinKernel::try_new(FirWinConfig {
            numtaps,
            cutoff,
            pass_zero,
            fs: sfreq,
        })?;
        let taps = design.run_alloc().map_err(|_| ConfigError::InvalidArgument {
            arg: "cutoff",
            reason: "FIR design failed",
        })?;
        let fir = ZeroPhaseFirKernel::try_new(ZeroPhaseFirConfig { taps })?;

        Ok(Self {
            l_trans_bandwidth: l_trans,
            h_trans_bandwidth: h_trans,
            fir,
        })
    }
}

impl FirBandPassKernel {
    /// Number of taps of the designed filter.
    pub fn numtaps(&self) -> usize {
        self.fir.len()
    }

    /// Resolved `(l_trans_bandwidth, h_trans_bandwidth)`; the lower one is `0` for low-passes.
    pub fn transition_bandwidths(&self) -> (f64, f64) {
        (self.l_trans_bandwidth, self.h_trans_bandwidth)
    }
}

impl FilterRows2D<f64> for FirBandPassKernel {
    fn run_alloc(
        &self,
        data: ArrayView2<'_, f64>,
    ) -> core::result::Result<Array2<f64>, ExecInvariantViolation> {
        self.fir.run_alloc(data)
    }
}

/// Default [`BandPassFilter`]: a [`FirBandPassKernel`] designed per call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FirBandPass;

impl BandPassFilter for FirBandPass {
    fn filter(&self, data: ArrayView2<'_, f64>, sfreq: f64, params: &FilterParams) -> Result<Array2<f64>> {
        let kernel = FirBandPassKernel::try_new(FirBandPassConfig {
            sfreq,
            l_freq: params.l_freq,
            h_freq: params.h_freq,
            l_trans_bandwidth: params.l_trans_bandwidth,
            h_trans_bandwidth: params.h_trans_bandwidth,
        })?;
        Ok(kernel.run_alloc(data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use dasp_signal::{rate, Signal};
    use ndarray::{array, s, Array2};

    fn sine(hz: f64, sfreq: f64, n: usize) -> Vec<f64> {
        let mut signal = rate(sfreq).const_hz(hz).sine();
        (0..n).map(|_| signal.next()).collect()
    }

    #[test]
    fn reflect_limited_mirrors_about_edges() {
        let padded = reflect_limited(&[1.0, 2.0, 4.0], 2);
        assert_eq!(padded, vec![-2.0, 0.0, 1.0, 2.0, 4.0, 6.0, 7.0]);
    }

    #[test]
    fn reflect_limited_zero_fills_past_the_signal() {
        let padded = reflect_limited(&[1.0, 3.0], 3);
        assert_eq!(padded, vec![0.0, 0.0, -1.0, 1.0, 3.0, 5.0, 0.0, 0.0]);
    }

    #[test]
    fn identity_taps_leave_data_untouched() {
        let kernel = ZeroPhaseFirKernel::try_new(ZeroPhaseFirConfig {
            taps: vec![0.0, 1.0, 0.0],
        })
        .expect("valid taps");
        let data = array![[1.0, -2.0, 3.0, 0.5], [0.0, 0.0, 1.0, 0.0]];
        let out = kernel.run_alloc(data.view()).expect("filter");
        assert_abs_diff_eq!(out, data, epsilon = 1e-12);
    }

    #[test]
    fn zero_phase_kernel_rejects_asymmetric_taps() {
        assert!(ZeroPhaseFirKernel::try_new(ZeroPhaseFirConfig {
            taps: vec![0.1, 0.5, 0.2],
        })
        .is_err());
        assert!(ZeroPhaseFirKernel::try_new(ZeroPhaseFirConfig {
            taps: vec![0.5, 0.5],
        })
        .is_err());
    }

    #[test]
    fn zero_phase_kernel_tolerates_rounding_in_mirrored_taps() {
        let taps = vec![0.25, 0.5 + 1e-15, 1.0, 0.5, 0.25];
        assert!(ZeroPhaseFirKernel::try_new(ZeroPhaseFirConfig { taps }).is_ok());
        assert!(ZeroPhaseFirKernel::try_new(ZeroPhaseFirConfig {
            taps: vec![0.25, 0.5 + 1e-6, 1.0, 0.5, 0.25],
        })
        .is_err());
    }

    #[test]
    fn band_kernel_accepts_designed_taps_for_common_bands() {
        let bands = [
            (9.0, 12.0, Some(2.0)),
            (9.0, 12.0, Some(1.0)),
            (9.0, 12.0, None),
            (8.0, 13.0, Some(2.0)),
            (1.0, 40.0, None),
        ];
        for (l_freq, h_freq, bandwidth) in bands {
            let kernel = FirBandPassKernel::try_new(FirBandPassConfig {
                sfreq: 250.0,
                l_freq,
                h_freq,
                l_trans_bandwidth: bandwidth,
                h_trans_bandwidth: bandwidth,
            });
            assert!(kernel.is_ok(), "{l_freq}-{h_freq} Hz: {kernel:?}");
        }
    }

    #[test]
    fn bandpass_keeps_in_band_and_removes_out_of_band_tones() {
        let sfreq = 250.0;
        let n = 5000;
        let params = FilterParams::new(9.0, 12.0).with_trans_bandwidths(2.0, 2.0);
        let mut data = Array2::zeros((2, n));
        data.row_mut(0).assign(&Array1::from(sine(10.5, sfreq, n)));
        data.row_mut(1).assign(&Array1::from(sine(40.0, sfreq, n)));

        let out = FirBandPass
            .filter(data.view(), sfreq, &params)
            .expect("filter");
        assert_eq!(out.dim(), data.dim());

        let kept = out.slice(s![0, 1000..4000]);
        let reference = data.slice(s![0, 1000..4000]);
        kept.iter()
            .zip(reference.iter())
            .for_each(|(k, r)| assert_abs_diff_eq!(k, r, epsilon = 2e-2));
        assert!(out.slice(s![1, 1000..4000]).iter().all(|v| v.abs() < 1e-2));
    }

    #[test]
    fn band_kernel_sizes_filter_from_narrowest_transition() {
        let kernel = FirBandPassKernel::try_new(FirBandPassConfig {
            sfreq: 250.0,
            l_freq: 9.0,
            h_freq: 12.0,
            l_trans_bandwidth: Some(1.0),
            h_trans_bandwidth: Some(4.0),
        })
        .expect("valid band");
        assert_eq!(kernel.numtaps(), 825);
        assert_eq!(kernel.transition_bandwidths(), (1.0, 4.0));
    }

    #[test]
    fn band_kernel_picks_automatic_transitions() {
        let kernel = FirBandPassKernel::try_new(FirBandPassConfig {
            sfreq: 250.0,
            l_freq: 20.0,
            h_freq: 30.0,
            l_trans_bandwidth: None,
            h_trans_bandwidth: None,
        })
        .expect("valid band");
        assert_eq!(kernel.transition_bandwidths(), (5.0, 7.5));

        let lowpass = FirBandPassKernel::try_new(FirBandPassConfig {
            sfreq: 100.0,
            l_freq: 0.0,
            h_freq: 30.0,
            l_trans_bandwidth: None,
            h_trans_bandwidth: None,
        })
        .expect("valid low-pass");
        assert_eq!(lowpass.transition_bandwidths(), (0.0, 7.5));
    }

    #[test]
    fn band_kernel_rejects_bad_edges() {
        let base = FirBandPassConfig {
            sfreq: 250.0,
            l_freq: 9.0,
            h_freq: 12.0,
            l_trans_bandwidth: Some(1.0),
            h_trans_bandwidth: Some(1.0),
        };
        assert!(FirBandPassKernel::try_new(FirBandPassConfig {
            h_freq: 125.0,
            ..base
        })
        .is_err());
        assert!(FirBandPassKernel::try_new(FirBandPassConfig {
            l_trans_bandwidth: Some(10.0),
            ..base
        })
        .is_err());
        assert!(FirBandPassKernel::try_new(FirBandPassConfig {
            l_freq: 12.0,
            ..base
        })
        .is_err());
        assert_eq!(
            FirBandPassKernel::try_new(FirBandPassConfig {
                l_freq: f64::NAN,
                ..base
            }),
            Err(ConfigError::NonFinite { arg: "l_freq" })
        );
    }
}
