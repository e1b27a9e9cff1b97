//! Data structures read from the application descriptor and content manifest.

use std::collections::BTreeSet;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{BundleError, Result};
use crate::layout::MANIFEST_FILE;

/// Root application descriptor, conventionally named `app.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationDescriptor {
  /// Stable application identifier, e.g. `com.example.Cooking`.
  #[serde(default)]
  pub app_id: String,
  /// Locator of the 64x64 application icon.
  #[serde(default)]
  pub icon: Option<String>,
  /// Locator of the AppStream metadata XML.
  #[serde(default)]
  pub app_data: Option<String>,
  /// Locator of the desktop entry file.
  #[serde(default)]
  pub desktop: Option<String>,
  /// Content manifest, referenced by locator or embedded inline.
  pub content_manifest: ContentManifestSource,
  /// Mark the subscription as frozen for the content updater.
  #[serde(default)]
  pub disable_subscription_updates: bool,
  /// Extra files placed in the app asset directory.
  #[serde(default)]
  pub app_assets: Vec<AssetEntry>,
}

/// Where the content manifest comes from.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ContentManifestSource {
  /// Path or URL of an external manifest file.
  Locator(String),
  /// Manifest object embedded in the descriptor.
  Inline(Map<String, Value>),
}

/// A file to place at `path`, optionally fetched from `download_uri`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct AssetEntry {
  /// Destination-relative file name; also the source locator when no URI is given.
  pub path: String,
  /// Explicit source locator.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub download_uri: Option<String>,
}

impl AssetEntry {
  /// Locator the entry is read from.
  pub fn source_locator(&self) -> &str {
    self.download_uri.as_deref().unwrap_or(&self.path)
  }

  /// Destination path with `.` components dropped, joined by `/`.
  fn destination_key(&self) -> String {
    Path::new(&self.path)
      .components()
      .filter_map(|component| match component {
        Component::Normal(part) => Some(part.to_string_lossy()),
        _ => None,
      })
      .collect::<Vec<_>>()
      .join("/")
  }

  fn validate(&self, owner: &str) -> Result<()> {
    let path = Path::new(&self.path);
    let escapes = path.components().any(|component| {
      matches!(
        component,
        Component::ParentDir | Component::RootDir | Component::Prefix(_)
      )
    });
    if escapes {
      return Err(BundleError::config(format!(
        "{owner} entry path {} must stay inside its destination directory",
        self.path
      )));
    }
    if self.destination_key().trim().is_empty() {
      return Err(BundleError::config(format!("{owner} entry has an empty path")));
    }
    Ok(())
  }
}

/// Validate every entry and reject entries sharing a destination or claiming a reserved name.
fn validate_entries(owner: &str, entries: &[AssetEntry], reserved: &[&str]) -> Result<()> {
  let mut seen = BTreeSet::new();
  for entry in entries {
    entry.validate(owner)?;
    let key = entry.destination_key();
    if reserved.contains(&key.as_str()) {
      return Err(BundleError::config(format!(
        "{owner} entry path {} is reserved",
        entry.path
      )));
    }
    if !seen.insert(key) {
      return Err(BundleError::config(format!(
        "{owner} entry path {} is listed more than once",
        entry.path
      )));
    }
  }
  Ok(())
}

/// Identifiers become directory names and must be a single, real path segment.
fn validate_segment(field: &str, value: &str) -> Result<()> {
  if value.contains(['/', '\\']) || value == "." || value == ".." {
    return Err(BundleError::config(format!(
      "{field} {value} must be a single path segment"
    )));
  }
  Ok(())
}

/// Subscription content manifest, written as `manifest.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentManifest {
  /// Identifier of the subscription the shards belong to.
  #[serde(default)]
  pub subscription_id: String,
  /// Shard files making up the subscription.
  #[serde(default)]
  pub shards: Vec<AssetEntry>,
}

impl ApplicationDescriptor {
  /// Reject descriptors missing required values.
  pub fn validate(&self) -> Result<()> {
    if self.app_id.trim().is_empty() {
      return Err(BundleError::config("app descriptor is missing app_id"));
    }
    validate_segment("app_id", &self.app_id)?;
    if let ContentManifestSource::Locator(locator) = &self.content_manifest
      && locator.trim().is_empty()
    {
      return Err(BundleError::config("content_manifest locator is empty"));
    }
    validate_entries("app_assets", &self.app_assets, &[])
  }
}

impl ContentManifest {
  /// Reject manifests missing required values.
  pub fn validate(&self) -> Result<()> {
    if self.subscription_id.trim().is_empty() {
      return Err(BundleError::config("content manifest is missing subscription_id"));
    }
    validate_segment("subscription_id", &self.subscription_id)?;
    validate_entries("shards", &self.shards, &[MANIFEST_FILE])
  }
}

/// Contents of `subscriptions.json`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct SubscriptionsFile {
  /// Subscriptions shipped with the application.
  pub subscriptions: Vec<SubscriptionRecord>,
}

/// Single entry of `subscriptions.json`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct SubscriptionRecord {
  /// Whether the content updater should leave this subscription alone.
  pub disable_updates: bool,
  /// Subscription identifier.
  pub id: String,
}

impl SubscriptionsFile {
  /// Subscriptions file describing a single subscription.
  pub fn single(id: &str, disable_updates: bool) -> Self {
    Self {
      subscriptions: vec![SubscriptionRecord {
        disable_updates,
        id: id.to_string(),
      }],
    }
  }
}
