//! Shared plumbing for the trawl crates.
//!
//! Holds the cross-crate error type and the [`observability`] module that
//! every binary calls once at start-up. Kept deliberately small so the
//! paginator and client crates can depend on it freely.
//!
//! ```rust
//! use trawl_common::TrawlError;
//!
//! let err = TrawlError::InvalidArgument("quota must be positive".into());
//! assert_eq!(err.to_string(), "invalid argument: quota must be positive");
//! ```
use std::path::PathBuf;

pub mod observability;

/// Errors raised by the trawl glue layer (CLI, output paths, configuration).
#[derive(thiserror::Error, Debug)]
pub enum TrawlError {
    /// A command-line value could not be interpreted.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration was incomplete or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Preparing an output location failed.
    #[error("output path {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
