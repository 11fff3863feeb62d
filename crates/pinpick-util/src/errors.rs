use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all pinpick operations.
///
/// Per-package problems (an empty catalog, a failed install) are recorded in the
/// ledger instead; these variants are for failures that end the whole run.
#[derive(Debug, Error, Diagnostic)]
pub enum PinpickError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or malformed configuration (e.g. Pinpick.toml).
    #[error("Config error: {message}")]
    #[diagnostic(help("Check your Pinpick.toml for syntax errors"))]
    Config { message: String },

    /// Package registry could not be queried.
    #[error("Registry error: {message}")]
    Registry { message: String },

    /// Python interpreter missing or produced unusable output.
    #[error("Interpreter error: {message}")]
    #[diagnostic(help("Set `python` in Pinpick.toml to a working interpreter"))]
    Interpreter { message: String },

    /// Reading or writing the dependency ledger failed.
    #[error("Ledger error: {message}")]
    Ledger { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}
