//! Application error types with rich context

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Application error types organized by layer/domain
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Common/Infrastructure Errors
    // ─────────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ─────────────────────────────────────────────────────────────
    // Command/Process Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Unknown command: {command}")]
    UnknownCommand { command: String },

    #[error("Failed to spawn process: {reason}")]
    ProcessSpawn { reason: String },

    #[error("Process exited with code {code:?}: {stderr}")]
    ProcessFailed { code: Option<i32>, stderr: String },

    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid configuration: {message}")]
    ConfigInvalid { message: String },

    // ─────────────────────────────────────────────────────────────
    // Transport/Communication Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Transport error: {message}")]
    Transport { message: String },
}

/// Coarse error category, stable across the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The command name has no entry in the script table
    UnknownCommand,
    /// The external program could not be started or exited non-zero
    ProcessFailure,
    /// Anything else (IO, configuration, transport)
    Internal,
}

// ─────────────────────────────────────────────────────────────────
// Convenience Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn unknown_command(command: impl Into<String>) -> Self {
        Self::UnknownCommand {
            command: command.into(),
        }
    }

    pub fn process_spawn(reason: impl Into<String>) -> Self {
        Self::ProcessSpawn {
            reason: reason.into(),
        }
    }

    pub fn process_failed(code: Option<i32>, stderr: impl Into<String>) -> Self {
        Self::ProcessFailed {
            code,
            stderr: stderr.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Category of this error as reported to RPC callers
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnknownCommand { .. } => ErrorKind::UnknownCommand,
            Error::ProcessSpawn { .. } | Error::ProcessFailed { .. } => ErrorKind::ProcessFailure,
            _ => ErrorKind::Internal,
        }
    }

    /// Captured stderr text, if this error came from a failed process
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Error::ProcessFailed { stderr, .. } => Some(stderr),
            _ => None,
        }
    }

    /// Check if the server can keep serving after this error
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::UnknownCommand { .. }
                | Error::ProcessSpawn { .. }
                | Error::ProcessFailed { .. }
                | Error::Transport { .. }
        )
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Context Extensions
// ─────────────────────────────────────────────────────────────────

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", context.into(), err);
            err
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", f(), err);
            err
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = Error::unknown_command("bogus");
        assert_eq!(err.to_string(), "Unknown command: bogus");

        let err = Error::process_failed(Some(2), "disk full");
        assert!(err.to_string().contains("disk full"));
        assert!(err.to_string().contains("Some(2)"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_error_kind_mapping() {
        assert_eq!(
            Error::unknown_command("x").kind(),
            ErrorKind::UnknownCommand
        );
        assert_eq!(
            Error::process_spawn("no such file").kind(),
            ErrorKind::ProcessFailure
        );
        assert_eq!(
            Error::process_failed(Some(1), "").kind(),
            ErrorKind::ProcessFailure
        );
        assert_eq!(Error::config("bad").kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_stderr_only_for_process_failures() {
        assert_eq!(
            Error::process_failed(Some(2), "disk full").stderr(),
            Some("disk full")
        );
        assert_eq!(Error::unknown_command("x").stderr(), None);
    }

    #[test]
    fn test_command_errors_are_recoverable() {
        assert!(Error::unknown_command("x").is_recoverable());
        assert!(Error::process_failed(None, "killed").is_recoverable());
    }

    #[test]
    fn test_config_errors_are_not_recoverable() {
        assert!(!Error::config_invalid("worker_threads must be >= 1").is_recoverable());
        assert!(!Error::ConfigNotFound {
            path: PathBuf::from("/etc/carpark.toml")
        }
        .is_recoverable());
        assert!(!Error::config("x").is_recoverable());
    }
}
