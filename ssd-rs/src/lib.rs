//! Spatio-Spectral Decomposition (SSD) for multichannel oscillatory recordings.
//!
//! SSD finds spatial filters that maximise the power of a narrow "signal" band relative to
//! the flanking frequencies of an enclosing "noise" band. The fitted filters project data to
//! component time series ([`Ssd::transform`]) and their patterns project a subset of those
//! components back to channel space ([`Ssd::apply`]).
//!
//! The crate is organised like `scipy.signal`-style tooling:
//!
//! * [`kernel`]: validated kernel construction and buffer adapters.
//! * [`signal`]: windows, FIR band-pass filtering and Welch spectra.
//! * [`linalg`]: eigen and pseudo-inverse helpers on top of nalgebra.
//! * [`info`]: channel metadata and picks.
//! * [`decoding`]: the SSD estimator and its stages.

pub mod decoding;
pub mod error;
pub mod info;
pub mod kernel;
pub mod linalg;
pub mod signal;

pub use decoding::{FilterParams, SpectralRatio, Ssd, SsdConfig, SsdFit, Transformer};
pub use error::{Band, Error, Result};
pub use info::{ChannelType, Info, Picks, SsdInfo};
