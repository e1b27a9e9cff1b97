//! Laying out subscription content under `share/ekn/data/<app_id>`.

use std::path::PathBuf;

use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::info;

use crate::error::{BundleError, Result};
use crate::fetch::ResourceFetcher;
use crate::fsops;
use crate::layout::{BundleLayout, EKN_VERSION, EKN_VERSION_FILE, MANIFEST_FILE, SUBSCRIPTIONS_FILE};
use crate::manifest::ResolvedManifest;
use crate::models::{ApplicationDescriptor, SubscriptionsFile};
use crate::scatter::scatter_gather;

/// Builds the content engine tree for one application and subscription.
#[derive(Debug, Clone)]
pub struct ContentLayoutBuilder {
  fetcher: ResourceFetcher,
  layout: BundleLayout,
}

impl ContentLayoutBuilder {
  /// Builder writing into `layout.content_dir`.
  pub fn new(fetcher: ResourceFetcher, layout: BundleLayout) -> Self {
    Self { fetcher, layout }
  }

  /// Create the subscription directory, then concurrently move the staged manifest into it,
  /// fetch every shard and write `EKN_VERSION` and `subscriptions.json`.
  ///
  /// Returns the number of files written.
  pub async fn build(
    &self,
    descriptor: &ApplicationDescriptor,
    resolved: &ResolvedManifest,
  ) -> Result<usize> {
    let app_id = descriptor.app_id.as_str();
    let subscription_id = resolved.manifest.subscription_id.as_str();
    let ekn_dir = self.layout.ekn_dir(app_id);
    let subscription_dir = self.layout.subscription_dir(app_id, subscription_id);

    fsops::ensure_dir(&subscription_dir).await?;

    let subscriptions = SubscriptionsFile::single(subscription_id, descriptor.disable_subscription_updates);
    let subscriptions_json =
      serde_json::to_string_pretty(&subscriptions).map_err(|source| BundleError::Parse {
        path: ekn_dir.join(SUBSCRIPTIONS_FILE),
        source,
      })?;

    let steps: Vec<BoxFuture<'static, Result<usize>>> = vec![
      move_manifest(resolved.staged_path.clone(), subscription_dir.join(MANIFEST_FILE)).boxed(),
      self.fetch_shards(resolved, subscription_dir),
      write_metadata(ekn_dir.join(EKN_VERSION_FILE), EKN_VERSION.to_string()).boxed(),
      write_metadata(ekn_dir.join(SUBSCRIPTIONS_FILE), subscriptions_json).boxed(),
    ];

    let written = scatter_gather(steps).await?;
    Ok(written.into_iter().sum())
  }

  fn fetch_shards(
    &self,
    resolved: &ResolvedManifest,
    subscription_dir: PathBuf,
  ) -> BoxFuture<'static, Result<usize>> {
    let tasks: Vec<_> = resolved
      .manifest
      .shards
      .iter()
      .map(|shard| {
        let fetcher = self.fetcher.clone();
        let base = resolved.shard_base.clone();
        let locator = shard.source_locator().to_string();
        let filename = shard.path.clone();
        let dest_dir = subscription_dir.clone();
        async move { fetcher.place(&base, &locator, &dest_dir, &filename).await }
      })
      .collect();

    async move { scatter_gather(tasks).await.map(|placed| placed.len()) }.boxed()
  }
}

async fn move_manifest(from: PathBuf, to: PathBuf) -> Result<usize> {
  info!(source = %from.display(), destination = %to.display(), "Moving");
  fsops::move_file(&from, &to).await?;
  Ok(1)
}

async fn write_metadata(path: PathBuf, contents: String) -> Result<usize> {
  info!(destination = %path.display(), "Writing out");
  fsops::write_file(&path, contents).await?;
  Ok(1)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::locator::SourceBase;
  use crate::models::{AssetEntry, ContentManifest, ContentManifestSource};
  use std::fs;
  use tempfile::{TempDir, tempdir};

  struct Fixture {
    temp: TempDir,
    layout: BundleLayout,
  }

  impl Fixture {
    fn new() -> Self {
      let temp = tempdir().unwrap();
      let layout = BundleLayout::new(temp.path().join("contents"), temp.path().join("assets"));
      fs::create_dir_all(&layout.content_dir).unwrap();
      fs::create_dir_all(temp.path().join("in")).unwrap();
      Self { temp, layout }
    }

    fn input(&self, name: &str, contents: &str) {
      fs::write(self.temp.path().join("in").join(name), contents).unwrap();
    }

    fn resolved(&self, shards: &[&str]) -> ResolvedManifest {
      let staged_path = self.layout.staged_manifest();
      fs::write(&staged_path, r#"{"subscription_id": "abc"}"#).unwrap();
      ResolvedManifest {
        manifest: ContentManifest {
          subscription_id: "abc".into(),
          shards: shards
            .iter()
            .map(|path| AssetEntry {
              path: path.to_string(),
              download_uri: None,
            })
            .collect(),
        },
        shard_base: SourceBase::Directory(self.temp.path().join("in")),
        staged_path,
      }
    }

    fn builder(&self) -> ContentLayoutBuilder {
      ContentLayoutBuilder::new(ResourceFetcher::new(false).unwrap(), self.layout.clone())
    }
  }

  fn descriptor(disable_updates: bool) -> ApplicationDescriptor {
    ApplicationDescriptor {
      app_id: "com.example.App".into(),
      icon: None,
      app_data: None,
      desktop: None,
      content_manifest: ContentManifestSource::Locator("manifest.json".into()),
      disable_subscription_updates: disable_updates,
      app_assets: Vec::new(),
    }
  }

  #[tokio::test]
  async fn lays_out_manifest_shards_and_metadata() {
    let fixture = Fixture::new();
    fixture.input("a.shard", "A");
    fixture.input("b.shard", "B");

    let written = fixture
      .builder()
      .build(&descriptor(false), &fixture.resolved(&["a.shard", "b.shard"]))
      .await
      .unwrap();
    assert_eq!(written, 5);

    let ekn_dir = fixture.layout.ekn_dir("com.example.App");
    let subscription_dir = fixture.layout.subscription_dir("com.example.App", "abc");
    assert_eq!(fs::read_to_string(ekn_dir.join("EKN_VERSION")).unwrap(), "3\n");
    assert_eq!(fs::read_to_string(subscription_dir.join("a.shard")).unwrap(), "A");
    assert_eq!(fs::read_to_string(subscription_dir.join("b.shard")).unwrap(), "B");
    assert!(subscription_dir.join("manifest.json").is_file());
    assert!(!fixture.layout.staged_manifest().exists());
  }

  #[tokio::test]
  async fn subscriptions_file_carries_update_flag() {
    let fixture = Fixture::new();
    fixture
      .builder()
      .build(&descriptor(true), &fixture.resolved(&[]))
      .await
      .unwrap();

    let raw = fs::read_to_string(
      fixture
        .layout
        .ekn_dir("com.example.App")
        .join("subscriptions.json"),
    )
    .unwrap();
    let parsed: SubscriptionsFile = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed, SubscriptionsFile::single("abc", true));
    assert!(raw.contains("\n  \"subscriptions\""));
  }

  #[tokio::test]
  async fn one_missing_shard_fails_the_build() {
    let fixture = Fixture::new();
    fixture.input("a.shard", "A");
    fixture.input("c.shard", "C");

    let result = fixture
      .builder()
      .build(
        &descriptor(false),
        &fixture.resolved(&["a.shard", "missing.shard", "c.shard"]),
      )
      .await;
    assert!(matches!(result, Err(BundleError::Filesystem { .. })));
  }

  #[tokio::test]
  async fn missing_staged_manifest_fails_the_build() {
    let fixture = Fixture::new();
    let resolved = fixture.resolved(&[]);
    fs::remove_file(&resolved.staged_path).unwrap();

    let result = fixture.builder().build(&descriptor(false), &resolved).await;
    assert!(matches!(
      result,
      Err(BundleError::Filesystem { action: "move", .. })
    ));
  }
}
