//! Error types surfaced while assembling a bundle.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BundleError>;

/// Every failure that can abort a bundle run.
#[derive(Debug, Error)]
pub enum BundleError {
  /// Transport failure while downloading a remote resource.
  #[error("failed to fetch {url}: {source}")]
  Fetch {
    /// URL being downloaded.
    url: String,
    /// Underlying transport error.
    source: reqwest::Error,
  },

  /// The server answered with a non-success status.
  #[error("fetching {url} returned HTTP {status}")]
  HttpStatus {
    /// URL being downloaded.
    url: String,
    /// Status code returned by the server.
    status: reqwest::StatusCode,
  },

  /// A filesystem operation failed.
  #[error("failed to {action} {}: {source}", .path.display())]
  Filesystem {
    /// Short description of the operation, e.g. "copy" or "create directory".
    action: &'static str,
    /// Path the operation was acting on.
    path: PathBuf,
    /// Underlying I/O error.
    source: std::io::Error,
  },

  /// A descriptor or manifest was not valid JSON or did not match the schema.
  #[error("failed to parse {}: {source}", .path.display())]
  Parse {
    /// File that failed to parse.
    path: PathBuf,
    /// Underlying parse error.
    source: serde_json::Error,
  },

  /// Required fields are missing or hold unusable values.
  #[error("invalid configuration: {0}")]
  Config(String),

  /// A spawned task panicked or was cancelled by the runtime.
  #[error("background task failed: {0}")]
  Task(#[from] tokio::task::JoinError),
}

impl BundleError {
  pub(crate) fn fs(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
    Self::Filesystem {
      action,
      path: path.into(),
      source,
    }
  }

  pub(crate) fn config(message: impl Into<String>) -> Self {
    Self::Config(message.into())
  }
}
