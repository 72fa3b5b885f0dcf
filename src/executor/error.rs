// Error types for Executor module

use nix::sys::signal::Signal;
use thiserror::Error;

/// Executor error types
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invocation failed in {operation}: {reason}")]
    InvocationFailed { operation: String, reason: String },

    #[error("Command exited with non-zero status: {0}")]
    NonZeroExit(i32),

    #[error("Command was terminated by signal: {}", signal_label(.0))]
    Signaled(i32),

    #[error("Command did not terminate normally")]
    Abnormal,

    #[error("Blocking task failed: {0}")]
    TaskFailed(String),
}

impl ExecError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidArgument(reason.into())
    }

    pub fn invocation(operation: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvocationFailed {
            operation: operation.into(),
            reason: reason.to_string(),
        }
    }

    /// True when the failure happened before any process was created
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }
}

/// `9 (SIGKILL)` for known signals, the bare number otherwise
fn signal_label(signal: &i32) -> String {
    match Signal::try_from(*signal) {
        Ok(sig) => format!("{} ({})", signal, sig.as_str()),
        Err(_) => signal.to_string(),
    }
}

pub type Result<T> = std::result::Result<T, ExecError>;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
