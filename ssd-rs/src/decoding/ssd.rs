use super::covariance::BandCovarianceEstimator;
use super::ged::{generalized_eigh, patterns_from_filters};
use super::params::{FilterParams, SsdConfig};
use super::rank::RankReducer;
use super::signals::Signals;
use super::spectral_ratio::{SpectralRatio, SpectralRatioScorer};
use crate::error::{Error, Result};
use crate::info::{ChannelType, Info, Picks, SsdInfo};
use crate::linalg::pin_row_signs;
use crate::signal::filter::FirBandPass;
use crate::signal::spectral::WelchPsd;
use crate::signal::traits::{BandPassFilter, PsdEstimator};
use ndarray::{s, Array2, ArrayBase, ArrayD, ArrayView2, Axis, Data, Dimension};
use serde_json::Value;

/// State produced by a successful [`Ssd::fit`].
///
/// Filters and patterns are square in the number of picked channels. Rows `0..rank` hold the
/// components in their final order (spectral-ratio order when sorting is enabled); the
/// remaining rows are zero.
#[derive(Debug, Clone, PartialEq)]
pub struct SsdFit {
    filters: Array2<f64>,
    patterns: Array2<f64>,
    eigenvalues: Vec<f64>,
    sorter: Vec<usize>,
    rank: usize,
    picks: Vec<usize>,
    n_channels: usize,
    sfreq: f64,
    n_fft: usize,
    filt_params_signal: FilterParams,
    freqs_noise: (f64, f64),
}

impl SsdFit {
    /// Spatial filters, one per row.
    pub fn filters(&self) -> &Array2<f64> {
        &self.filters
    }

    /// Spatial patterns, one per row.
    pub fn patterns(&self) -> &Array2<f64> {
        &self.patterns
    }

    /// Generalized eigenvalues, `rank` of them, in component order.
    pub fn eigenvalues(&self) -> &[f64] {
        &self.eigenvalues
    }

    /// Position of every component in eigenvalue order; identity when sorting is off.
    pub fn sorter(&self) -> &[usize] {
        &self.sorter
    }

    /// Dimension of the eigenproblem after rank reduction.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Channel indices the model was fitted on.
    pub fn picks(&self) -> &[usize] {
        &self.picks
    }

    /// Channel count of the data the model accepts.
    pub fn n_channels(&self) -> usize {
        self.n_channels
    }

    /// Sampling rate in Hz.
    pub fn sfreq(&self) -> f64 {
        self.sfreq
    }

    /// Welch window length used for scoring.
    pub fn n_fft(&self) -> usize {
        self.n_fft
    }

    /// Signal band `(l_freq, h_freq)` in Hz.
    pub fn freqs_signal(&self) -> (f64, f64) {
        self.filt_params_signal.band()
    }

    /// Noise band `(l_freq, h_freq)` in Hz.
    pub fn freqs_noise(&self) -> (f64, f64) {
        self.freqs_noise
    }

    fn check_channels(&self, got: usize) -> Result<()> {
        if got == self.n_channels {
            Ok(())
        } else {
            Err(Error::ChannelMismatch {
                expected: self.n_channels,
                got,
            })
        }
    }
}

/// Spatio-Spectral Decomposition.
///
/// Finds spatial filters maximising the power in a signal band relative to the flanking
/// frequencies of an enclosing noise band. Filtering and spectral estimation go through the
/// [`BandPassFilter`] and [`PsdEstimator`] collaborators; the defaults are a zero-phase FIR
/// band-pass and Welch's method.
///
/// ```
/// use ndarray::Array2;
/// use ssd_rs::{FilterParams, Ssd, SsdConfig, SsdInfo};
///
/// let tau = 2.0 * std::f64::consts::PI;
/// let x = Array2::from_shape_fn((4, 2000), |(c, t)| {
///     let t = t as f64 / 250.0;
///     (tau * 10.0 * t + c as f64).sin() + (tau * (3.0 + 7.0 * c as f64) * t).sin()
/// });
/// let config = SsdConfig::new(
///     SsdInfo::Sfreq(250.0),
///     FilterParams::new(9.0, 12.0).with_trans_bandwidths(2.0, 2.0),
///     FilterParams::new(8.0, 13.0).with_trans_bandwidths(2.0, 2.0),
/// )
/// .with_n_components(2);
/// let mut ssd = Ssd::new(config).unwrap();
/// let sources = ssd.fit_transform(&x).unwrap();
/// assert_eq!(sources.shape(), &[2, 2000]);
/// ```
#[derive(Debug, Clone)]
pub struct Ssd<B = FirBandPass, P = WelchPsd> {
    config: SsdConfig,
    filter: B,
    psd: P,
    fitted: Option<SsdFit>,
}

impl Ssd {
    /// Model with the default FIR filter and Welch estimator.
    pub fn new(config: SsdConfig) -> Result<Self> {
        Self::with_collaborators(config, FirBandPass, WelchPsd)
    }
}

impl<B: BandPassFilter, P: PsdEstimator> Ssd<B, P> {
    /// Model with custom filtering and spectral estimation.
    pub fn with_collaborators(config: SsdConfig, filter: B, psd: P) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            filter,
            psd,
            fitted: None,
        })
    }

    /// Current configuration.
    pub fn config(&self) -> &SsdConfig {
        &self.config
    }

    /// Whether `fit` has completed.
    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Fitted state, or [`Error::NotFitted`].
    pub fn fitted(&self) -> Result<&SsdFit> {
        self.require_fit("fitted")
    }

    fn require_fit(&self, method: &'static str) -> Result<&SsdFit> {
        self.fitted.as_ref().ok_or(Error::NotFitted { method })
    }

    fn resolve_picks(&self, n_channels: usize) -> Result<Vec<usize>> {
        match &self.config.info {
            SsdInfo::Info(info) => {
                if info.n_channels() != n_channels {
                    return Err(Error::ChannelMismatch {
                        expected: info.n_channels(),
                        got: n_channels,
                    });
                }
                let picks = info.pick_indices(&self.config.picks)?;
                let n_types = info.channel_types(&picks).len();
                if n_types > 1 {
                    return Err(Error::MixedChannelTypes { n_types });
                }
                Ok(picks)
            }
            SsdInfo::Sfreq(sfreq) => match &self.config.picks {
                Picks::Data => Ok((0..n_channels).collect()),
                Picks::Types(_) => Err(Error::InvalidArg {
                    arg: "picks".into(),
                    reason: "channel types cannot be picked without channel info".into(),
                }),
                picks => Info::with_uniform_type(n_channels, *sfreq, ChannelType::Misc)?.pick_indices(picks),
            },
        }
    }

    fn n_components(&self, fit: &SsdFit) -> Result<usize> {
        let n_picks = fit.picks.len();
        match self.config.n_components {
            None => Ok(n_picks),
            Some(k) if (1..=n_picks).contains(&k) => Ok(k),
            Some(k) => Err(Error::InvalidArg {
                arg: "n_components".into(),
                reason: format!("must lie in 1..={n_picks}, got {k}"),
            }),
        }
    }

    /// Estimate filters, patterns and eigenvalues from `x`, `[channels, samples]` or
    /// `[trials, channels, samples]`.
    ///
    /// On error the previous fit, if any, is kept.
    pub fn fit<S, D>(&mut self, x: &ArrayBase<S, D>) -> Result<&mut Self>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        self.config.validate()?;
        let signals = Signals::from_dyn(x.view().into_dyn())?;
        let picks = self.resolve_picks(signals.n_channels())?;
        let n_picks = picks.len();
        if let Some(k) = self.config.n_components {
            if k > n_picks {
                return Err(Error::InvalidArg {
                    arg: "n_components".into(),
                    reason: format!("cannot keep {k} components of {n_picks} picked channels"),
                });
            }
        }
        let sfreq = self.config.sfreq();
        let n_fft = self.config.resolved_n_fft();
        let signal_band = self.config.filt_params_signal;
        let noise_band = self.config.filt_params_noise;

        let covs = BandCovarianceEstimator::new(&self.filter, sfreq, &signal_band, &noise_band)
            .estimate(&signals, &picks)?;
        let reduction = RankReducer::new(self.config.rank_tol).estimate(covs.combined().view())?;
        let rank = reduction.rank();
        let ged = generalized_eigh(
            reduction.reduce(covs.signal.view()).view(),
            reduction.reduce(covs.noise.view()).view(),
        )?;

        let mut filters = reduction.back_project(ged.filters.view());
        pin_row_signs(&mut filters);
        let mut patterns = patterns_from_filters(filters.view())?;
        let mut eigenvalues = ged.eigenvalues;
        let mut sorter: Vec<usize> = (0..rank).collect();

        if self.config.sort_by_spectral_ratio {
            let sources = signals.map_epochs(|epoch| Ok(filters.dot(&epoch.select(Axis(0), &picks))))?;
            let score = SpectralRatioScorer::new(&self.psd, sfreq, n_fft, signal_band.band(), noise_band.band())
                .score(&Signals::from_dyn(sources.view())?)?;
            sorter = score.sorter;
            filters = filters.select(Axis(0), &sorter);
            patterns = patterns.select(Axis(0), &sorter);
            eigenvalues = sorter.iter().map(|&i| eigenvalues[i]).collect();
        }

        let pad = |m: Array2<f64>| {
            let mut full = Array2::zeros((n_picks, n_picks));
            full.slice_mut(s![..rank, ..]).assign(&m);
            full
        };
        sorter.extend(rank..n_picks);

        tracing::info!(
            rank,
            n_channels = n_picks,
            sorted = self.config.sort_by_spectral_ratio,
            top_eigenvalue = eigenvalues.first().copied().unwrap_or(f64::NAN),
            "fitted SSD"
        );
        self.fitted = Some(SsdFit {
            filters: pad(filters),
            patterns: pad(patterns),
            eigenvalues,
            sorter,
            rank,
            picks,
            n_channels: signals.n_channels(),
            sfreq,
            n_fft,
            filt_params_signal: signal_band,
            freqs_noise: noise_band.band(),
        });
        Ok(self)
    }

    /// First `k` component time series of one trial.
    fn project(&self, fit: &SsdFit, epoch: ArrayView2<'_, f64>, k: usize) -> Result<Array2<f64>> {
        let picked = epoch.select(Axis(0), &fit.picks);
        let picked = if self.config.return_filtered {
            self.filter.filter(picked.view(), fit.sfreq, &fit.filt_params_signal)?
        } else {
            picked
        };
        Ok(fit.filters.slice(s![..k, ..]).dot(&picked))
    }

    /// Component time series, `[n_components, samples]` or `[trials, n_components, samples]`.
    pub fn transform<S, D>(&self, x: &ArrayBase<S, D>) -> Result<ArrayD<f64>>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        let fit = self.require_fit("transform")?;
        let signals = Signals::from_dyn(x.view().into_dyn())?;
        fit.check_channels(signals.n_channels())?;
        let k = self.n_components(fit)?;
        signals.map_epochs(|epoch| self.project(fit, epoch, k))
    }

    /// Reconstruct `x` from its first `n_components` components.
    ///
    /// Output has the shape of `x`; channels outside the picks are copied unchanged.
    pub fn apply<S, D>(&self, x: &ArrayBase<S, D>) -> Result<ArrayD<f64>>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        let fit = self.require_fit("apply")?;
        let signals = Signals::from_dyn(x.view().into_dyn())?;
        fit.check_channels(signals.n_channels())?;
        let k = self.n_components(fit)?;
        let patterns = fit.patterns.slice(s![..k, ..]);
        signals.map_epochs(|epoch| {
            let reconstructed = patterns.t().dot(&self.project(fit, epoch, k)?);
            let mut out = epoch.to_owned();
            for (row, &ch) in reconstructed.rows().into_iter().zip(&fit.picks) {
                out.row_mut(ch).assign(&row);
            }
            Ok(out)
        })
    }

    /// `fit` followed by `transform` on the same data.
    pub fn fit_transform<S, D>(&mut self, x: &ArrayBase<S, D>) -> Result<ArrayD<f64>>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        self.fit(x)?;
        self.transform(x)
    }

    /// Spectral ratio of already transformed `sources`, scored exactly as during `fit`.
    pub fn get_spectral_ratio<S, D>(&self, sources: &ArrayBase<S, D>) -> Result<SpectralRatio>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        let fit = self.require_fit("get_spectral_ratio")?;
        let sources = Signals::from_dyn(sources.view().into_dyn())?;
        SpectralRatioScorer::new(&self.psd, fit.sfreq, fit.n_fft, fit.freqs_signal(), fit.freqs_noise)
            .score(&sources)
    }

    /// Configuration as a JSON record.
    pub fn get_params(&self) -> Result<Value> {
        self.config.to_json()
    }

    /// Replace the configuration keys present in `params`.
    ///
    /// Types are checked immediately; value ranges and band enclosure are checked by `fit`.
    /// An existing fit is kept.
    pub fn set_params(&mut self, params: &Value) -> Result<&mut Self> {
        self.config = self.config.with_json_params(params)?;
        Ok(self)
    }
}
