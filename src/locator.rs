//! Resolution of resource locators into download URLs or local paths.
//!
//! A locator is either an absolute http(s) URL or a path relative to the document that
//! referenced it. The referencing document's location is captured as a [`SourceBase`].

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use url::Url;

use crate::error::{BundleError, Result};

fn url_scheme_pattern() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| Regex::new(r"(?i)^https?://").expect("invalid http(s) regex"))
}

/// Returns `true` when the locator carries a network scheme prefix.
pub fn is_url(value: &str) -> bool {
  url_scheme_pattern().is_match(value)
}

/// Location of the document whose relative locators are being resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceBase {
  /// Local directory containing the referencing file.
  Directory(PathBuf),
  /// URL of the referencing document itself; relative locators join against it.
  Url(Url),
}

impl SourceBase {
  /// Derive the base for locators found inside the document at `locator`.
  pub fn of(locator: &str) -> Self {
    if is_url(locator)
      && let Ok(url) = Url::parse(locator)
    {
      return Self::Url(url);
    }

    let parent = Path::new(locator)
      .parent()
      .filter(|parent| !parent.as_os_str().is_empty())
      .unwrap_or_else(|| Path::new("."));
    Self::Directory(parent.to_path_buf())
  }
}

/// Concrete place a resource is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedSource {
  /// Resource is streamed over HTTP.
  Url(Url),
  /// Resource is copied from the local filesystem.
  Local(PathBuf),
}

/// Resolve `locator` against `base`.
///
/// URL locators are used as-is. Anything else is joined with the base first and only then
/// checked again for a network scheme.
pub fn resolve(base: &SourceBase, locator: &str) -> Result<ResolvedSource> {
  if is_url(locator) {
    return parse_url(locator).map(ResolvedSource::Url);
  }

  match base {
    SourceBase::Url(url) => url
      .join(locator)
      .map(ResolvedSource::Url)
      .map_err(|err| BundleError::config(format!("cannot join {locator} onto {url}: {err}"))),
    SourceBase::Directory(dir) => {
      let joined = dir.join(locator);
      let joined_text = joined.to_string_lossy();
      if is_url(&joined_text) {
        return parse_url(&joined_text).map(ResolvedSource::Url);
      }
      Ok(ResolvedSource::Local(joined))
    }
  }
}

fn parse_url(value: &str) -> Result<Url> {
  Url::parse(value).map_err(|err| BundleError::config(format!("invalid URL {value}: {err}")))
}
