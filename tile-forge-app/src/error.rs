//! Application error type.

use thiserror::Error;
use wfc_core::WfcError;
use wfc_rules::LoadError;

/// Errors surfaced by the command line tool.
#[derive(Error, Debug)]
pub enum AppError {
    /// Settings that are well-formed but unusable.
    #[error("Configuration Error: {0}")]
    Config(String),

    /// A settings layer could not be read or extracted.
    #[error("Settings Error: {0}")]
    Settings(#[from] Box<figment::Error>),

    /// Writing output failed.
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    /// The sample file could not be loaded.
    #[error("Sample Loading Error: {0}")]
    Load(#[from] LoadError),

    /// Model construction or generation failed.
    #[error("WFC Core Error: {0}")]
    WfcCore(#[from] WfcError),

    /// Some chunks of a world exhausted their attempts and stayed empty.
    #[error("{failed} of {total} chunks failed to generate")]
    IncompleteWorld {
        /// Chunks that failed.
        failed: usize,
        /// Chunks requested.
        total: usize,
    },

    /// Any other failure, with context attached.
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
