//! Spatio-Spectral Decomposition.
//!
//! The estimator is assembled from four stages that are usable on their own:
//!
//! * [`covariance`]: signal-band and flanking-band channel covariances.
//! * [`rank`]: rank detection and whitening of deficient covariance pairs.
//! * [`ged`]: the generalized eigenproblem `A v = λ (A + B) v`.
//! * [`spectral_ratio`]: per-component in-band over flank power.
//!
//! [`Ssd`] runs them in order and owns the fitted state.

pub mod covariance;
pub mod ged;
mod params;
pub mod rank;
mod signals;
pub mod spectral_ratio;
mod ssd;
mod transformer;

#[cfg(test)]
pub(crate) mod testing;

pub use params::*;
pub use signals::Signals;
pub use spectral_ratio::SpectralRatio;
pub use ssd::{Ssd, SsdFit};
pub use transformer::Transformer;
