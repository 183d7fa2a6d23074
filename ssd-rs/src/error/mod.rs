use crate::kernel::{ConfigError, ExecInvariantViolation};
use core::fmt;

/// Which of the two SSD frequency bands a message refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    /// The band holding the oscillation of interest.
    Signal,
    /// The reference band enclosing the signal band.
    Noise,
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Band::Signal => write!(f, "signal"),
            Band::Noise => write!(f, "noise"),
        }
    }
}

/// Errors raised whilst configuring, fitting or applying SSD.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A filter specification lacks a required field, or is not a key/value record at all.
    #[error("{field} must be defined in filter parameters for {band}")]
    MissingFilterParam {
        /// Name of the missing field.
        field: &'static str,
        /// Band the specification belongs to.
        band: Band,
    },
    /// A configuration value has the wrong type.
    #[error("{field} must be an instance of {expected}, got {got}")]
    InvalidType {
        /// Name of the offending field.
        field: String,
        /// Type the field must have.
        expected: &'static str,
        /// Rendering of the received value.
        got: String,
    },
    /// The noise band does not enclose the signal band.
    #[error(
        "Wrongly specified frequency bands!\nThe signal band-pass must be within the noise \
         band-pass! (signal {signal:?} Hz, noise {noise:?} Hz)"
    )]
    WronglySpecifiedBands {
        /// `(l_freq, h_freq)` of the signal band.
        signal: (f64, f64),
        /// `(l_freq, h_freq)` of the noise band.
        noise: (f64, f64),
    },
    /// The selected picks span more than one channel type.
    #[error(
        "At this point SSD only supports fitting single channel types. Your info has {n_types} types"
    )]
    MixedChannelTypes {
        /// Number of distinct channel types among the picks.
        n_types: usize,
    },
    /// Input channel count differs from the configured channel count.
    #[error("X has {got} channels but expected {expected}")]
    ChannelMismatch {
        /// Channel count the model is configured for.
        expected: usize,
        /// Channel count of the received data.
        got: usize,
    },
    /// Any other out-of-range or inconsistent configuration value.
    #[error("Invalid argument `{arg}`: {reason}")]
    InvalidArg {
        /// The invalid arg.
        arg: String,
        /// Explaining why arg is invalid.
        reason: String,
    },
    /// Data is not a 2-D `[channels, samples]` or 3-D `[trials, channels, samples]` array.
    #[error(
        "X must be a 2-D [channels, samples] or 3-D [trials, channels, samples] array, got {ndim} dimension(s)"
    )]
    InputDimension {
        /// Number of dimensions of the received array.
        ndim: usize,
    },
    /// A fitted-state method was called before a successful `fit`.
    #[error("This SSD instance is not fitted yet. Call `fit` before using `{method}`.")]
    NotFitted {
        /// Method that required a fitted model.
        method: &'static str,
    },
    /// The combined covariance is not positive definite, even after rank reduction.
    #[error("Combined covariance is not positive definite (rank {rank}); the eigenproblem is singular")]
    NotPositiveDefinite {
        /// Dimension of the (possibly reduced) problem that failed.
        rank: usize,
    },
    /// Covariance carries no power at all.
    #[error("Covariance is degenerate: the combined band covariance has no positive eigenvalue")]
    DegenerateCovariance,
    /// A dense linear-algebra routine failed.
    #[error("Linear algebra failure: {reason}")]
    Linalg {
        /// Why the routine failed.
        reason: &'static str,
    },
    /// Kernel construction failure.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Kernel execution failure.
    #[error(transparent)]
    Exec(#[from] ExecInvariantViolation),
    /// Failure inside the core numeric helpers.
    #[error(transparent)]
    Core(#[from] ssd_rs_core::Error),
    /// Parameters could not be converted to or from JSON.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result alias for SSD operations.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_field() {
        let err = Error::MissingFilterParam {
            field: "l_freq",
            band: Band::Signal,
        };
        assert_eq!(
            err.to_string(),
            "l_freq must be defined in filter parameters for signal"
        );

        let err = Error::ChannelMismatch {
            expected: 21,
            got: 20,
        };
        assert!(err.to_string().contains("channels but expected"));
    }

    #[test]
    fn kernel_errors_are_wrapped() {
        let err: Error = ConfigError::EmptyInput { arg: "picks" }.into();
        assert!(matches!(err, Error::Config(_)));
        assert_eq!(err.to_string(), "`picks` must not be empty");
    }
}
