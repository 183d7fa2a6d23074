//! Validated-once signal kernels.
//!
//! The FIR, window and Welch kernels share this substrate: a `KernelLifecycle` constructor
//! that checks a plain config, construction and execution errors kept apart, and 1D buffer
//! adapters so callers can pass slices, vectors or ndarray rows.

mod errors;
mod io;
mod lifecycle;

pub use errors::*;
pub use io::*;
pub use lifecycle::*;
