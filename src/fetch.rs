//! Placing resources into the output tree, either by download or by local copy.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use url::Url;

use crate::error::{BundleError, Result};
use crate::fsops;
use crate::locator::{self, ResolvedSource, SourceBase};

/// Downloads or copies resources named by locators.
#[derive(Debug, Clone)]
pub struct ResourceFetcher {
  client: reqwest::Client,
  allow_http_errors: bool,
}

impl ResourceFetcher {
  /// Fetcher rejecting non-success HTTP responses unless `allow_http_errors` is set.
  pub fn new(allow_http_errors: bool) -> Result<Self> {
    let client = reqwest::Client::builder()
      .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|err| BundleError::config(format!("failed to create HTTP client: {err}")))?;
    Ok(Self {
      client,
      allow_http_errors,
    })
  }

  /// Resolve `locator` against `base` and place it at `dest_dir/filename`.
  ///
  /// `filename` may contain subdirectories; they are created as needed.
  pub async fn place(
    &self,
    base: &SourceBase,
    locator: &str,
    dest_dir: &Path,
    filename: &str,
  ) -> Result<PathBuf> {
    let source = locator::resolve(base, locator)?;
    let destination = dest_dir.join(filename);
    let parent = destination.parent().unwrap_or(dest_dir);
    fsops::ensure_dir(parent).await?;

    match source {
      ResolvedSource::Url(url) => {
        info!(source = %url, destination = %destination.display(), "Downloading");
        self.download(url, &destination).await?;
      }
      ResolvedSource::Local(path) => {
        info!(source = %path.display(), destination = %destination.display(), "Copying");
        fsops::copy_recursive(&path, &destination).await?;
      }
    }

    Ok(destination)
  }

  async fn download(&self, url: Url, destination: &Path) -> Result<()> {
    let fetch_error = |source| BundleError::Fetch {
      url: url.to_string(),
      source,
    };

    let mut response = self
      .client
      .get(url.clone())
      .send()
      .await
      .map_err(fetch_error)?;

    let status = response.status();
    if !status.is_success() {
      if !self.allow_http_errors {
        return Err(BundleError::HttpStatus {
          url: url.to_string(),
          status,
        });
      }
      warn!(%url, %status, "Writing body of unsuccessful response");
    }

    let mut file = tokio::fs::File::create(destination)
      .await
      .map_err(|err| BundleError::fs("create", destination, err))?;
    while let Some(chunk) = response.chunk().await.map_err(fetch_error)? {
      file
        .write_all(&chunk)
        .await
        .map_err(|err| BundleError::fs("write", destination, err))?;
    }
    file
      .flush()
      .await
      .map_err(|err| BundleError::fs("write", destination, err))
  }
}
