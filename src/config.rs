//! Run configuration describing where inputs come from and where outputs land.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// File name looked up by [`BundleConfig::discover`].
pub const DEFAULT_CONFIG_FILE: &str = "bundle.config.json";

/// Settings for a single bundle run.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BundleConfig {
  /// Locator of the root application descriptor, either a path or an http(s) URL.
  pub source: String,
  /// Directory receiving the descriptor's `app_assets` entries.
  pub app_asset_dir: PathBuf,
  /// Directory receiving the content tree.
  pub content_dir: PathBuf,
  /// Remove both output directories before running.
  pub clean: bool,
  /// Directory holding `dbus.service.in` and `search-provider.ini.in` overrides.
  pub template_dir: Option<PathBuf>,
  /// Accept non-success HTTP responses and write their bodies anyway.
  pub allow_http_errors: bool,
}

impl Default for BundleConfig {
  fn default() -> Self {
    Self {
      source: "in/app.json".into(),
      app_asset_dir: "app-assets".into(),
      content_dir: "contents".into(),
      clean: true,
      template_dir: None,
      allow_http_errors: false,
    }
  }
}

impl BundleConfig {
  /// Attempt to load configuration from the provided directory.
  ///
  /// A missing or unreadable file yields the defaults.
  pub fn discover(dir: &Path) -> Self {
    Self::from_path(&dir.join(DEFAULT_CONFIG_FILE)).unwrap_or_default()
  }

  /// Read configuration from a specific JSON file.
  pub fn from_path(path: &Path) -> Option<Self> {
    let content = fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::tempdir;

  #[test]
  fn defaults_match_cli_defaults() {
    let config = BundleConfig::default();
    assert_eq!(config.source, "in/app.json");
    assert_eq!(config.app_asset_dir, PathBuf::from("app-assets"));
    assert_eq!(config.content_dir, PathBuf::from("contents"));
    assert!(config.clean);
    assert!(!config.allow_http_errors);
  }

  #[test]
  fn discover_falls_back_to_defaults_when_missing() {
    let dir = tempdir().unwrap();
    assert_eq!(BundleConfig::discover(dir.path()), BundleConfig::default());
  }

  #[test]
  fn discover_merges_partial_file_with_defaults() {
    let dir = tempdir().unwrap();
    fs::write(
      dir.path().join(DEFAULT_CONFIG_FILE),
      r#"{"content_dir": "out/contents", "clean": false}"#,
    )
    .unwrap();

    let config = BundleConfig::discover(dir.path());
    assert_eq!(config.content_dir, PathBuf::from("out/contents"));
    assert!(!config.clean);
    assert_eq!(config.source, "in/app.json");
  }

  #[test]
  fn malformed_file_is_ignored() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "{not json").unwrap();
    assert_eq!(BundleConfig::discover(dir.path()), BundleConfig::default());
  }
}
