//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode during startup and the final
//! event export.

use std::path::PathBuf;

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: fable_core::config::ConfigError,
    },

    /// Building the simulation from configuration failed.
    #[error("setup error: {source}")]
    Setup {
        /// The underlying setup error.
        #[from]
        source: fable_core::step::SetupError,
    },

    /// The keyword interpreter's patterns failed to compile.
    #[error("interpreter error: {source}")]
    Interpreter {
        /// The underlying regex error.
        #[from]
        source: regex::Error,
    },

    /// Writing the event export failed.
    #[error("cannot write events to {}: {source}", path.display())]
    Export {
        /// Destination file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A command-line argument was malformed.
    #[error("usage: {message}")]
    Usage {
        /// What was wrong.
        message: String,
    },
}
