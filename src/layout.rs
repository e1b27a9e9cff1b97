//! Fixed on-disk layout of the content tree consumed by the packaging step.

use std::path::{Path, PathBuf};

/// Name of the root descriptor copy inside the content directory.
pub const APP_JSON_FILE: &str = "app.json";
/// Name of the content manifest, both while staged and in its final location.
pub const MANIFEST_FILE: &str = "manifest.json";
/// Content engine layout version marker.
pub const EKN_VERSION_FILE: &str = "EKN_VERSION";
/// Contents of [`EKN_VERSION_FILE`].
pub const EKN_VERSION: &str = "3\n";
/// Subscription list written next to the version marker.
pub const SUBSCRIPTIONS_FILE: &str = "subscriptions.json";
/// Directory grouping subscription content under the app's data directory.
pub const SUBSCRIPTIONS_DIR: &str = "com.endlessm.subscriptions";

/// Output directories of a bundle run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleLayout {
  /// Root of the content tree.
  pub content_dir: PathBuf,
  /// Root of the extra app asset tree.
  pub app_asset_dir: PathBuf,
}

impl BundleLayout {
  /// Layout rooted at the two output directories.
  pub fn new(content_dir: impl Into<PathBuf>, app_asset_dir: impl Into<PathBuf>) -> Self {
    Self {
      content_dir: content_dir.into(),
      app_asset_dir: app_asset_dir.into(),
    }
  }

  fn share(&self) -> PathBuf {
    self.content_dir.join("share")
  }

  /// Where the root descriptor is copied to.
  pub fn app_json(&self) -> PathBuf {
    self.content_dir.join(APP_JSON_FILE)
  }

  /// Where the content manifest is staged before being moved into its subscription.
  pub fn staged_manifest(&self) -> PathBuf {
    self.content_dir.join(MANIFEST_FILE)
  }

  /// D-Bus session service directory.
  pub fn dbus_services_dir(&self) -> PathBuf {
    self.share().join("dbus-1").join("services")
  }

  /// GNOME Shell search provider directory.
  pub fn search_providers_dir(&self) -> PathBuf {
    self.share().join("gnome-shell").join("search-providers")
  }

  /// hicolor icon theme directory for 64x64 app icons.
  pub fn icon_theme_dir(&self) -> PathBuf {
    self
      .share()
      .join("icons")
      .join("hicolor")
      .join("64x64")
      .join("apps")
  }

  /// AppStream icon cache directory.
  pub fn app_info_icon_dir(&self) -> PathBuf {
    self
      .share()
      .join("app-info")
      .join("icons")
      .join("flatpak")
      .join("64x64")
  }

  /// AppStream metadata directory.
  pub fn app_data_dir(&self) -> PathBuf {
    self.share().join("app-info").join("xmls")
  }

  /// Desktop entry directory.
  pub fn applications_dir(&self) -> PathBuf {
    self.share().join("applications")
  }

  /// Content engine data directory for `app_id`.
  pub fn ekn_dir(&self, app_id: &str) -> PathBuf {
    self.share().join("ekn").join("data").join(app_id)
  }

  /// Directory holding the manifest and shards of one subscription.
  pub fn subscription_dir(&self, app_id: &str, subscription_id: &str) -> PathBuf {
    self
      .ekn_dir(app_id)
      .join(SUBSCRIPTIONS_DIR)
      .join(subscription_id)
  }

  /// Both output roots, in the order they are cleaned.
  pub fn roots(&self) -> [&Path; 2] {
    [self.app_asset_dir.as_path(), self.content_dir.as_path()]
  }
}

/// `<app_id>.service`
pub fn service_file_name(app_id: &str) -> String {
  format!("{app_id}.service")
}

/// `<app_id>-search-provider.ini`
pub fn search_provider_file_name(app_id: &str) -> String {
  format!("{app_id}-search-provider.ini")
}

/// `<app_id>.png`
pub fn icon_file_name(app_id: &str) -> String {
  format!("{app_id}.png")
}

/// `<app_id>.appdata.xml`
pub fn app_data_file_name(app_id: &str) -> String {
  format!("{app_id}.appdata.xml")
}

/// `<app_id>.desktop`
pub fn desktop_file_name(app_id: &str) -> String {
  format!("{app_id}.desktop")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn subscription_dir_is_nested_under_ekn_data() {
    let layout = BundleLayout::new("contents", "app-assets");
    assert_eq!(
      layout.subscription_dir("com.example.App", "abc"),
      PathBuf::from("contents/share/ekn/data/com.example.App/com.endlessm.subscriptions/abc")
    );
  }

  #[test]
  fn metadata_directories_live_under_share() {
    let layout = BundleLayout::new("out", "assets");
    assert_eq!(
      layout.dbus_services_dir(),
      PathBuf::from("out/share/dbus-1/services")
    );
    assert_eq!(
      layout.search_providers_dir(),
      PathBuf::from("out/share/gnome-shell/search-providers")
    );
    assert_eq!(
      layout.icon_theme_dir(),
      PathBuf::from("out/share/icons/hicolor/64x64/apps")
    );
    assert_eq!(
      layout.app_info_icon_dir(),
      PathBuf::from("out/share/app-info/icons/flatpak/64x64")
    );
    assert_eq!(layout.app_data_dir(), PathBuf::from("out/share/app-info/xmls"));
    assert_eq!(layout.applications_dir(), PathBuf::from("out/share/applications"));
  }

  #[test]
  fn file_names_follow_app_id() {
    assert_eq!(service_file_name("a.b"), "a.b.service");
    assert_eq!(search_provider_file_name("a.b"), "a.b-search-provider.ini");
    assert_eq!(icon_file_name("a.b"), "a.b.png");
    assert_eq!(app_data_file_name("a.b"), "a.b.appdata.xml");
    assert_eq!(desktop_file_name("a.b"), "a.b.desktop");
  }
}
