/// Rejected kernel configuration. Raised only from [`super::KernelLifecycle::try_new`] and
/// the buffer adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// An argument that needs at least one element has none.
    #[error("`{arg}` must not be empty")]
    EmptyInput {
        /// Offending argument.
        arg: &'static str,
    },
    /// An argument is out of range or inconsistent with another one.
    #[error("Invalid argument `{arg}`: {reason}")]
    InvalidArgument {
        /// Offending argument.
        arg: &'static str,
        /// What the value must satisfy.
        reason: &'static str,
    },
    /// NaN or an infinity where a finite number is needed.
    #[error("`{arg}` must be a finite number")]
    NonFinite {
        /// Offending argument.
        arg: &'static str,
    },
    /// A 1-D buffer that is strided in memory.
    #[error("`{arg}` must be contiguous in memory (pass a row, not a column)")]
    NonContiguous {
        /// Offending argument.
        arg: &'static str,
    },
}

/// A constructed kernel was run on input it cannot process.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecInvariantViolation {
    /// The input violates a run-time precondition.
    #[error("Cannot run kernel: {reason}")]
    InvalidState {
        /// Violated precondition.
        reason: &'static str,
    },
    /// A buffer has the wrong number of samples.
    #[error("`{arg}` has {got} samples, expected {expected}")]
    LengthMismatch {
        /// Offending buffer.
        arg: &'static str,
        /// Required length.
        expected: usize,
        /// Received length.
        got: usize,
    },
    /// A buffer adapter rejected its input.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Pass `value` through if it is finite.
pub(crate) fn ensure_finite(arg: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::NonFinite { arg })
    }
}

/// Pass `value` through if it is finite and strictly positive (sampling rates).
pub(crate) fn ensure_positive(arg: &'static str, value: f64) -> Result<f64, ConfigError> {
    if ensure_finite(arg, value)? > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidArgument {
            arg,
            reason: "must be > 0",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_failures_surface_through_exec_errors() {
        let err: ExecInvariantViolation = ConfigError::NonContiguous { arg: "channel" }.into();
        assert_eq!(
            err.to_string(),
            "`channel` must be contiguous in memory (pass a row, not a column)"
        );
    }

    #[test]
    fn sampling_rates_must_be_positive_and_finite() {
        assert_eq!(ensure_positive("sfreq", 250.0), Ok(250.0));
        assert_eq!(
            ensure_positive("sfreq", f64::NAN),
            Err(ConfigError::NonFinite { arg: "sfreq" })
        );
        assert!(matches!(
            ensure_positive("sfreq", 0.0),
            Err(ConfigError::InvalidArgument { arg: "sfreq", .. })
        ));
        assert_eq!(ensure_finite("l_freq", -1.0), Ok(-1.0));
    }
}
