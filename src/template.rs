//! Rendering of the D-Bus service and search provider registration files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::{Captures, Regex};
use tracing::info;

use crate::error::{BundleError, Result};
use crate::fsops;

const DBUS_SERVICE_TEMPLATE: &str = include_str!("../templates/dbus.service.in");
const SEARCH_PROVIDER_TEMPLATE: &str = include_str!("../templates/search-provider.ini.in");

/// Templates shipped with the tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateId {
  /// D-Bus session service activation file.
  DbusService,
  /// GNOME Shell search provider registration.
  SearchProvider,
}

impl TemplateId {
  /// File name of the template, used when looking for overrides.
  pub fn file_name(self) -> &'static str {
    match self {
      Self::DbusService => "dbus.service.in",
      Self::SearchProvider => "search-provider.ini.in",
    }
  }

  fn bundled(self) -> &'static str {
    match self {
      Self::DbusService => DBUS_SERVICE_TEMPLATE,
      Self::SearchProvider => SEARCH_PROVIDER_TEMPLATE,
    }
  }
}

/// Values substituted into templates, keyed by tag name.
pub type TemplateParams = BTreeMap<String, String>;

/// Parameters for the registration templates of `app_id`.
pub fn app_params(app_id: &str) -> TemplateParams {
  BTreeMap::from([
    ("app_id".to_string(), app_id.to_string()),
    ("object_path".to_string(), bus_path_encode(app_id)),
  ])
}

/// Escape `value` for use as a D-Bus object path element.
///
/// Every character outside `[A-Za-z0-9]` becomes `_` followed by each of its UTF-16 code
/// units in lowercase hex, so astral characters produce two escapes.
pub fn bus_path_encode(value: &str) -> String {
  let mut encoded = String::with_capacity(value.len());
  for c in value.chars() {
    if c.is_ascii_alphanumeric() {
      encoded.push(c);
    } else {
      let mut units = [0u16; 2];
      for unit in c.encode_utf16(&mut units) {
        encoded.push('_');
        encoded.push_str(&format!("{unit:x}"));
      }
    }
  }
  encoded
}

fn tag_pattern() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| Regex::new(r"\{\{\s*([A-Za-z0-9_]+)\s*\}\}").expect("invalid tag regex"))
}

/// Replace `{{name}}` tags with their parameter value; unknown tags render empty.
pub fn render_str(template: &str, params: &TemplateParams) -> String {
  tag_pattern()
    .replace_all(template, |caps: &Captures| {
      params.get(&caps[1]).cloned().unwrap_or_default()
    })
    .into_owned()
}

/// Renders templates into the output tree.
#[derive(Debug, Clone, Default)]
pub struct Templater {
  template_dir: Option<PathBuf>,
}

impl Templater {
  /// Templater reading overrides from `template_dir` when given.
  pub fn new(template_dir: Option<PathBuf>) -> Self {
    Self { template_dir }
  }

  async fn load(&self, id: TemplateId) -> Result<String> {
    let Some(dir) = &self.template_dir else {
      return Ok(id.bundled().to_string());
    };
    let path = dir.join(id.file_name());
    let bytes = fsops::read_file(&path).await?;
    String::from_utf8(bytes).map_err(|err| {
      BundleError::fs(
        "read",
        path,
        std::io::Error::new(std::io::ErrorKind::InvalidData, err),
      )
    })
  }

  /// Render template `id` with `params` into `dest_dir/filename`.
  pub async fn render(
    &self,
    id: TemplateId,
    params: &TemplateParams,
    dest_dir: &Path,
    filename: &str,
  ) -> Result<PathBuf> {
    fsops::ensure_dir(dest_dir).await?;
    let template = self.load(id).await?;
    let destination = dest_dir.join(filename);
    info!(destination = %destination.display(), "Writing out");
    fsops::write_file(&destination, render_str(&template, params)).await?;
    Ok(destination)
  }
}
