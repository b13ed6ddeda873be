//! Error types for the subtarget configuration core.
//!
//! Using thiserror for more idiomatic error handling. Degraded inputs
//! (unknown CPU names, unrecognized feature tokens) are not errors; they are
//! recovered with documented fallbacks and logged. The variants here cover
//! the recoverable misuses of the machine-layer API.

use thiserror::Error;

/// Main error type for target machine and subtarget configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("function '{name}' is already registered with this target machine")]
    DuplicateFunction { name: String },

    #[error("function '{function}' carries conflicting encoding-mode attributes")]
    ConflictingModeRequest { function: String },
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
