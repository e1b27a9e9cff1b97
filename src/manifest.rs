//! Loading the root application descriptor and the content manifest it points at.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::error::{BundleError, Result};
use crate::fetch::ResourceFetcher;
use crate::fsops;
use crate::layout::{APP_JSON_FILE, BundleLayout, MANIFEST_FILE};
use crate::locator::{SourceBase, is_url};
use crate::models::{ApplicationDescriptor, ContentManifest, ContentManifestSource};

/// Root descriptor together with the base its relative locators resolve against.
#[derive(Debug, Clone)]
pub struct ResolvedDescriptor {
  /// Parsed and validated descriptor.
  pub descriptor: ApplicationDescriptor,
  /// Location of the descriptor source.
  pub base: SourceBase,
}

/// Content manifest together with the base its shard locators resolve against.
#[derive(Debug, Clone)]
pub struct ResolvedManifest {
  /// Parsed and validated manifest.
  pub manifest: ContentManifest,
  /// Base for shard locators.
  pub shard_base: SourceBase,
  /// Where the manifest was staged inside the content directory.
  pub staged_path: PathBuf,
}

/// Places descriptor and manifest files in the content directory and parses them.
#[derive(Debug, Clone)]
pub struct ManifestResolver {
  fetcher: ResourceFetcher,
  layout: BundleLayout,
}

impl ManifestResolver {
  /// Resolver writing into `layout.content_dir`.
  pub fn new(fetcher: ResourceFetcher, layout: BundleLayout) -> Self {
    Self { fetcher, layout }
  }

  /// Place the root descriptor at `<content>/app.json` and parse it.
  pub async fn resolve_root(&self, source: &str) -> Result<ResolvedDescriptor> {
    let path = self
      .fetcher
      .place(
        &SourceBase::Directory(PathBuf::new()),
        source,
        &self.layout.content_dir,
        APP_JSON_FILE,
      )
      .await?;
    let descriptor: ApplicationDescriptor = read_json(&path).await?;
    descriptor.validate()?;

    let base = SourceBase::of(source);
    debug!(app_id = %descriptor.app_id, ?base, "resolved app descriptor");
    Ok(ResolvedDescriptor { descriptor, base })
  }

  /// Stage the content manifest at `<content>/manifest.json` and parse it.
  ///
  /// Shards of a manifest fetched from a URL resolve against that URL; otherwise they
  /// resolve against the root descriptor's location.
  pub async fn resolve_content_manifest(&self, root: &ResolvedDescriptor) -> Result<ResolvedManifest> {
    let staged_path = self.layout.staged_manifest();

    let shard_base = match &root.descriptor.content_manifest {
      ContentManifestSource::Inline(object) => {
        fsops::ensure_dir(&self.layout.content_dir).await?;
        let contents = serde_json::to_string_pretty(object).map_err(|source| BundleError::Parse {
          path: staged_path.clone(),
          source,
        })?;
        info!(destination = %staged_path.display(), "Writing out inline content manifest");
        fsops::write_file(&staged_path, contents).await?;
        root.base.clone()
      }
      ContentManifestSource::Locator(locator) => {
        self
          .fetcher
          .place(&root.base, locator, &self.layout.content_dir, MANIFEST_FILE)
          .await?;
        if is_url(locator) {
          SourceBase::of(locator)
        } else {
          root.base.clone()
        }
      }
    };

    let manifest: ContentManifest = read_json(&staged_path).await?;
    manifest.validate()?;

    Ok(ResolvedManifest {
      manifest,
      shard_base,
      staged_path,
    })
  }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
  let bytes = fsops::read_file(path).await?;
  serde_json::from_slice(&bytes).map_err(|source| BundleError::Parse {
    path: path.to_path_buf(),
    source,
  })
}
