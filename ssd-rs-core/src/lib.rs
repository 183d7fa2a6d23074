//! Numeric substrate shared by the `ssd-rs` crates.
//!
//! Holds the numpy-flavoured helpers (`num_rs`) and the error type they report.

pub mod num_rs;

/// Errors raised by the core numeric helpers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Argument passed into a function was invalid.
    #[error("Invalid argument `{arg}`: {reason}")]
    InvalidArg {
        /// The invalid arg.
        arg: String,
        /// Explaining why arg is invalid.
        reason: String,
    },
    /// Convolution could not be carried out.
    #[error("Convolution failed: {reason}")]
    Conv {
        /// Why the convolution failed.
        reason: String,
    },
}

/// Result alias for the core helpers.
pub type Result<T> = core::result::Result<T, Error>;
