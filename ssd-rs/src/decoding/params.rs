//! Typed SSD configuration and its JSON parameter boundary.

use crate::error::{Band, Error, Result};
use crate::info::{Picks, SsdInfo};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default relative eigenvalue cutoff used to detect rank deficiency.
pub const DEFAULT_RANK_TOL: f64 = 1e-12;

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn invalid_type(field: &str, expected: &'static str, got: &Value) -> Error {
    Error::InvalidType {
        field: field.to_string(),
        expected,
        got: format!("{} {}", json_kind(got), got),
    }
}

/// Band-pass specification of one SSD band.
///
/// Transition bandwidths left as `None` are chosen automatically by the filter (`"auto"`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterParams {
    /// Lower pass-band edge in Hz.
    pub l_freq: f64,
    /// Upper pass-band edge in Hz.
    pub h_freq: f64,
    /// Width of the lower transition band in Hz.
    #[serde(default)]
    pub l_trans_bandwidth: Option<f64>,
    /// Width of the upper transition band in Hz.
    #[serde(default)]
    pub h_trans_bandwidth: Option<f64>,
}

impl FilterParams {
    /// Pass band `[l_freq, h_freq]` with automatic transition bandwidths.
    pub fn new(l_freq: f64, h_freq: f64) -> Self {
        Self {
            l_freq,
            h_freq,
            l_trans_bandwidth: None,
            h_trans_bandwidth: None,
        }
    }

    /// Set both transition bandwidths explicitly.
    pub fn with_trans_bandwidths(mut self, l_trans_bandwidth: f64, h_trans_bandwidth: f64) -> Self {
        self.l_trans_bandwidth = Some(l_trans_bandwidth);
        self.h_trans_bandwidth = Some(h_trans_bandwidth);
        self
    }

    /// `(l_freq, h_freq)`.
    pub fn band(&self) -> (f64, f64) {
        (self.l_freq, self.h_freq)
    }

    /// Parse a filter specification from a JSON record such as
    /// `{"l_freq": 9, "h_freq": 12, "l_trans_bandwidth": 1, "h_trans_bandwidth": "auto"}`.
    ///
    /// Keys other than the four above are ignored.
    pub fn from_json(value: &Value, band: Band) -> Result<Self> {
        let Value::Object(record) = value else {
            return Err(Error::MissingFilterParam {
                field: "l_freq",
                band,
            });
        };
        let edge = |field: &'static str| -> Result<f64> {
            let v = record
                .get(field)
                .ok_or(Error::MissingFilterParam { field, band })?;
            v.as_f64().ok_or_else(|| invalid_type(field, "numeric", v))
        };
        let trans = |field: &'static str| -> Result<Option<f64>> {
            match record.get(field) {
                None | Some(Value::Null) => Ok(None),
                Some(Value::String(s)) if s == "auto" => Ok(None),
                Some(v) => v
                    .as_f64()
                    .map(Some)
                    .ok_or_else(|| invalid_type(field, "numeric or \"auto\"", v)),
            }
        };
        Ok(Self {
            l_freq: edge("l_freq")?,
            h_freq: edge("h_freq")?,
            l_trans_bandwidth: trans("l_trans_bandwidth")?,
            h_trans_bandwidth: trans("h_trans_bandwidth")?,
        })
    }

    fn validate(&self, band: Band, sfreq: f64) -> Result<()> {
        let bad = |reason: String| Error::InvalidArg {
            arg: format!("filt_params_{band}"),
            reason,
        };
        if !self.l_freq.is_finite() || !self.h_freq.is_finite() {
            return Err(bad("band edges must be finite".into()));
        }
        if self.l_freq < 0.0 || self.h_freq <= self.l_freq {
            return Err(bad(format!(
                "need 0 <= l_freq < h_freq, got l_freq={} and h_freq={}",
                self.l_freq, self.h_freq
            )));
        }
        if self.h_freq >= 0.5 * sfreq {
            return Err(bad(format!(
                "h_freq={} must be below the Nyquist frequency {}",
                self.h_freq,
                0.5 * sfreq
            )));
        }
        for (name, bw) in [
            ("l_trans_bandwidth", self.l_trans_bandwidth),
            ("h_trans_bandwidth", self.h_trans_bandwidth),
        ] {
            if let Some(bw) = bw {
                if !bw.is_finite() || bw <= 0.0 {
                    return Err(bad(format!("{name} must be finite and > 0, got {bw}")));
                }
            }
        }
        Ok(())
    }
}

/// The noise band must strictly enclose the signal band. Two low-pass bands (both lower
/// edges at 0 Hz) are accepted.
pub fn check_bands(signal: &FilterParams, noise: &FilterParams) -> Result<()> {
    let lower_ok = noise.l_freq < signal.l_freq || (noise.l_freq == 0.0 && signal.l_freq == 0.0);
    if lower_ok && noise.h_freq > signal.h_freq {
        Ok(())
    } else {
        Err(Error::WronglySpecifiedBands {
            signal: signal.band(),
            noise: noise.band(),
        })
    }
}

fn default_true() -> bool {
    true
}

fn default_rank_tol() -> f64 {
    DEFAULT_RANK_TOL
}

/// Everything an [`crate::Ssd`] model is configured with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SsdConfig {
    /// Channel layout and sampling rate, or a bare sampling rate.
    pub info: SsdInfo,
    /// Band holding the oscillation of interest.
    pub filt_params_signal: FilterParams,
    /// Band enclosing the signal band; its flanks are the noise reference.
    pub filt_params_noise: FilterParams,
    /// Components kept by `transform`/`apply`; `None` keeps all.
    #[serde(default)]
    pub n_components: Option<usize>,
    /// Channels the decomposition is fitted on.
    #[serde(default)]
    pub picks: Picks,
    /// Reorder components by spectral ratio after the eigendecomposition.
    #[serde(default = "default_true")]
    pub sort_by_spectral_ratio: bool,
    /// Band-pass the data to the signal band before projecting in `transform`.
    #[serde(default)]
    pub return_filtered: bool,
    /// Welch window length for spectral-ratio scoring; `None` uses `floor(sfreq)`.
    #[serde(default)]
    pub n_fft: Option<usize>,
    /// Relative eigenvalue cutoff for rank detection.
    #[serde(default = "default_rank_tol")]
    pub rank_tol: f64,
}

impl SsdConfig {
    /// Configuration with default options.
    pub fn new(info: impl Into<SsdInfo>, filt_params_signal: FilterParams, filt_params_noise: FilterParams) -> Self {
        Self {
            info: info.into(),
            filt_params_signal,
            filt_params_noise,
            n_components: None,
            picks: Picks::default(),
            sort_by_spectral_ratio: true,
            return_filtered: false,
            n_fft: None,
            rank_tol: DEFAULT_RANK_TOL,
        }
    }

    /// Keep `n_components` components.
    pub fn with_n_components(mut self, n_components: usize) -> Self {
        self.n_components = Some(n_components);
        self
    }

    /// Fit on a channel subset.
    pub fn with_picks(mut self, picks: Picks) -> Self {
        self.picks = picks;
        self
    }

    /// Toggle spectral-ratio sorting.
    pub fn with_sort_by_spectral_ratio(mut self, sort: bool) -> Self {
        self.sort_by_spectral_ratio = sort;
        self
    }

    /// Toggle signal-band filtering in `transform`.
    pub fn with_return_filtered(mut self, return_filtered: bool) -> Self {
        self.return_filtered = return_filtered;
        self
    }

    /// Set the Welch window length used for scoring.
    pub fn with_n_fft(mut self, n_fft: usize) -> Self {
        self.n_fft = Some(n_fft);
        self
    }

    /// Set the relative rank cutoff.
    pub fn with_rank_tol(mut self, rank_tol: f64) -> Self {
        self.rank_tol = rank_tol;
        self
    }

    /// Sampling rate in Hz.
    pub fn sfreq(&self) -> f64 {
        self.info.sfreq()
    }

    /// Welch window length after applying the `floor(sfreq)` default.
    pub fn resolved_n_fft(&self) -> usize {
        self.n_fft.unwrap_or(self.sfreq().floor() as usize)
    }

    /// Check values that the type system cannot.
    pub fn validate(&self) -> Result<()> {
        let sfreq = self.sfreq();
        if !sfreq.is_finite() || sfreq <= 0.0 {
            return Err(Error::InvalidArg {
                arg: "sfreq".into(),
                reason: format!("sampling rate must be finite and > 0, got {sfreq}"),
            });
        }
        self.filt_params_signal.validate(Band::Signal, sfreq)?;
        self.filt_params_noise.validate(Band::Noise, sfreq)?;
        check_bands(&self.filt_params_signal, &self.filt_params_noise)?;
        if self.n_components == Some(0) {
            return Err(Error::InvalidArg {
                arg: "n_components".into(),
                reason: "at least one component must be kept".into(),
            });
        }
        if self.resolved_n_fft() == 0 {
            return Err(Error::InvalidArg {
                arg: "n_fft".into(),
                reason: "n_fft must be > 0".into(),
            });
        }
        if !(0.0..1.0).contains(&self.rank_tol) {
            return Err(Error::InvalidArg {
                arg: "rank_tol".into(),
                reason: format!("rank_tol must lie in [0, 1), got {}", self.rank_tol),
            });
        }
        Ok(())
    }

    /// Serialize to the JSON record returned by `get_params`.
    pub fn to_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Copy of `self` with the keys of `params` replaced.
    ///
    /// Field presence and types are checked here; value ranges are left to [`Self::validate`].
    pub fn with_json_params(&self, params: &Value) -> Result<Self> {
        let Value::Object(params) = params else {
            return Err(invalid_type("params", "object", params));
        };
        let mut next = self.clone();
        for (key, value) in params {
            next.set_json_param(key, value)?;
        }
        Ok(next)
    }

    fn set_json_param(&mut self, key: &str, value: &Value) -> Result<()> {
        match key {
            "info" => {
                self.info = serde_json::from_value(value.clone())
                    .map_err(|_| invalid_type(key, "info or sfreq record", value))?;
            }
            "filt_params_signal" => self.filt_params_signal = FilterParams::from_json(value, Band::Signal)?,
            "filt_params_noise" => self.filt_params_noise = FilterParams::from_json(value, Band::Noise)?,
            "n_components" => self.n_components = optional_count(key, value)?,
            "n_fft" => self.n_fft = optional_count(key, value)?,
            "picks" => {
                self.picks = serde_json::from_value(value.clone())
                    .map_err(|_| invalid_type(key, "picks record", value))?;
            }
            "sort_by_spectral_ratio" => self.sort_by_spectral_ratio = flag(key, value)?,
            "return_filtered" => self.return_filtered = flag(key, value)?,
            "rank_tol" => {
                self.rank_tol = value
                    .as_f64()
                    .ok_or_else(|| invalid_type(key, "numeric", value))?;
            }
            other => {
                return Err(Error::InvalidArg {
                    arg: other.to_string(),
                    reason: format!("unknown parameter; valid parameters are {}", Self::param_names().join(", ")),
                })
            }
        }
        Ok(())
    }

    fn param_names() -> Vec<&'static str> {
        vec![
            "info",
            "filt_params_signal",
            "filt_params_noise",
            "n_components",
            "picks",
            "sort_by_spectral_ratio",
            "return_filtered",
            "n_fft",
            "rank_tol",
        ]
    }
}

fn flag(field: &str, value: &Value) -> Result<bool> {
    value.as_bool().ok_or_else(|| invalid_type(field, "bool", value))
}

fn optional_count(field: &str, value: &Value) -> Result<Option<usize>> {
    match value {
        Value::Null => Ok(None),
        v => v
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| invalid_type(field, "int or null", v)),
    }
}

/// Build an SSD configuration from loosely typed JSON pieces, as a scripting layer would.
pub fn config_from_json(info: impl Into<SsdInfo>, signal: &Value, noise: &Value) -> Result<SsdConfig> {
    Ok(SsdConfig::new(
        info,
        FilterParams::from_json(signal, Band::Signal)?,
        FilterParams::from_json(noise, Band::Noise)?,
    ))
}
