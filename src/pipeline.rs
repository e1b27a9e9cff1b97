//! Bundle orchestrator: clean, resolve the descriptor, then fan out the independent branches.

use std::path::PathBuf;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::{debug, info};

use crate::config::BundleConfig;
use crate::content::ContentLayoutBuilder;
use crate::error::{BundleError, Result};
use crate::fetch::ResourceFetcher;
use crate::fsops;
use crate::layout::{self, BundleLayout};
use crate::locator::SourceBase;
use crate::manifest::{ManifestResolver, ResolvedDescriptor};
use crate::scatter::scatter_gather;
use crate::template::{TemplateId, Templater, app_params};

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleReport {
  /// Application identifier from the descriptor.
  pub app_id: String,
  /// Subscription identifier from the content manifest.
  pub subscription_id: String,
  /// Number of files produced by the fan-out stage.
  pub files_written: usize,
  /// Content output directory.
  pub content_dir: PathBuf,
  /// App asset output directory.
  pub app_asset_dir: PathBuf,
}

#[derive(Debug, Default)]
struct BranchOutcome {
  files: usize,
  subscription_id: Option<String>,
}

impl BranchOutcome {
  fn files(files: usize) -> Self {
    Self {
      files,
      subscription_id: None,
    }
  }
}

/// Assembles a bundle according to a [`BundleConfig`].
#[derive(Debug, Clone)]
pub struct Bundler {
  config: BundleConfig,
  layout: BundleLayout,
  fetcher: ResourceFetcher,
  templater: Templater,
}

impl Bundler {
  /// Create a bundler for the provided configuration.
  pub fn new(config: BundleConfig) -> Result<Self> {
    let layout = BundleLayout::new(&config.content_dir, &config.app_asset_dir);
    let fetcher = ResourceFetcher::new(config.allow_http_errors)?;
    let templater = Templater::new(config.template_dir.clone());
    Ok(Self {
      config,
      layout,
      fetcher,
      templater,
    })
  }

  /// Run the whole pipeline. Any failure aborts the run.
  pub async fn run(&self) -> Result<BundleReport> {
    self.clean().await?;

    let resolver = ManifestResolver::new(self.fetcher.clone(), self.layout.clone());
    let root = Arc::new(resolver.resolve_root(&self.config.source).await?);
    info!(app_id = %root.descriptor.app_id, "Loaded app descriptor");

    let branches: Vec<BoxFuture<'static, Result<BranchOutcome>>> = vec![
      self.template_files(&root),
      self.fetch_basic_files(&root),
      self.fetch_content(resolver, Arc::clone(&root)),
      self.fetch_app_assets(&root),
    ];
    let outcomes = scatter_gather(branches).await?;

    let files_written = outcomes.iter().map(|outcome| outcome.files).sum();
    let subscription_id = outcomes
      .into_iter()
      .find_map(|outcome| outcome.subscription_id)
      .unwrap_or_default();

    info!(files_written, "Done!");
    Ok(BundleReport {
      app_id: root.descriptor.app_id.clone(),
      subscription_id,
      files_written,
      content_dir: self.layout.content_dir.clone(),
      app_asset_dir: self.layout.app_asset_dir.clone(),
    })
  }

  async fn clean(&self) -> Result<()> {
    if !self.config.clean {
      debug!("skipping output cleanup");
      return Ok(());
    }
    info!("Cleaning out directories");
    let [app_assets, contents] = self.layout.roots();
    futures::try_join!(
      fsops::remove_dir_all_if_exists(app_assets),
      fsops::remove_dir_all_if_exists(contents),
    )?;
    Ok(())
  }

  fn template_files(&self, root: &ResolvedDescriptor) -> BoxFuture<'static, Result<BranchOutcome>> {
    let app_id = &root.descriptor.app_id;
    let params = Arc::new(app_params(app_id));
    let jobs = [
      (
        TemplateId::DbusService,
        self.layout.dbus_services_dir(),
        layout::service_file_name(app_id),
      ),
      (
        TemplateId::SearchProvider,
        self.layout.search_providers_dir(),
        layout::search_provider_file_name(app_id),
      ),
    ];

    let tasks: Vec<_> = jobs
      .into_iter()
      .map(|(id, dest_dir, filename)| {
        let templater = self.templater.clone();
        let params = Arc::clone(&params);
        async move { templater.render(id, &params, &dest_dir, &filename).await }
      })
      .collect();

    async move {
      let placed = scatter_gather(tasks).await?;
      Ok::<_, BundleError>(BranchOutcome::files(placed.len()))
    }
    .boxed()
  }

  fn fetch_basic_files(&self, root: &ResolvedDescriptor) -> BoxFuture<'static, Result<BranchOutcome>> {
    let descriptor = &root.descriptor;
    let app_id = &descriptor.app_id;
    let mut jobs: Vec<(String, PathBuf, String)> = Vec::new();

    if let Some(icon) = &descriptor.icon {
      jobs.push((icon.clone(), self.layout.icon_theme_dir(), layout::icon_file_name(app_id)));
      jobs.push((icon.clone(), self.layout.app_info_icon_dir(), layout::icon_file_name(app_id)));
    }
    if let Some(app_data) = &descriptor.app_data {
      jobs.push((app_data.clone(), self.layout.app_data_dir(), layout::app_data_file_name(app_id)));
    }
    if let Some(desktop) = &descriptor.desktop {
      jobs.push((desktop.clone(), self.layout.applications_dir(), layout::desktop_file_name(app_id)));
    }

    self.place_all(&root.base, jobs)
  }

  fn fetch_content(
    &self,
    resolver: ManifestResolver,
    root: Arc<ResolvedDescriptor>,
  ) -> BoxFuture<'static, Result<BranchOutcome>> {
    let builder = ContentLayoutBuilder::new(self.fetcher.clone(), self.layout.clone());
    async move {
      let resolved = resolver.resolve_content_manifest(&root).await?;
      let files = builder.build(&root.descriptor, &resolved).await?;
      Ok::<_, BundleError>(BranchOutcome {
        files,
        subscription_id: Some(resolved.manifest.subscription_id),
      })
    }
    .boxed()
  }

  fn fetch_app_assets(&self, root: &ResolvedDescriptor) -> BoxFuture<'static, Result<BranchOutcome>> {
    let jobs = root
      .descriptor
      .app_assets
      .iter()
      .map(|asset| {
        (
          asset.source_locator().to_string(),
          self.layout.app_asset_dir.clone(),
          asset.path.clone(),
        )
      })
      .collect();

    self.place_all(&root.base, jobs)
  }

  fn place_all(
    &self,
    base: &SourceBase,
    jobs: Vec<(String, PathBuf, String)>,
  ) -> BoxFuture<'static, Result<BranchOutcome>> {
    let tasks: Vec<_> = jobs
      .into_iter()
      .map(|(locator, dest_dir, filename)| {
        let fetcher = self.fetcher.clone();
        let base = base.clone();
        async move { fetcher.place(&base, &locator, &dest_dir, &filename).await }
      })
      .collect();

    async move {
      let placed = scatter_gather(tasks).await?;
      Ok::<_, BundleError>(BranchOutcome::files(placed.len()))
    }
    .boxed()
  }
}
