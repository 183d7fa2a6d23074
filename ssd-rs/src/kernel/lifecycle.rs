use super::ConfigError;

/// Two-phase kernels: validate a plain config once in `try_new`, then run repeatedly.
///
/// A value of an implementing type is proof that its config passed validation; run methods
/// only check their per-call inputs.
pub trait KernelLifecycle: Sized {
    /// Plain-data constructor arguments.
    type Config;

    /// Validate `config` and build the kernel.
    fn try_new(config: Self::Config) -> Result<Self, ConfigError>;
}
