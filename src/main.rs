//! Command-line entry point for assembling an application content bundle.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use app_bundle_assembler::{BundleConfig, Bundler};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Assemble the content tree and app assets described by an app descriptor.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
  /// Path or URL of the app descriptor [default: in/app.json]
  source: Option<String>,

  /// Directory receiving the descriptor's extra app assets [default: app-assets]
  #[arg(long)]
  app_asset_dir: Option<PathBuf>,

  /// Directory receiving the content tree [default: contents]
  #[arg(long)]
  content_dir: Option<PathBuf>,

  /// Clean output directories before running (the default)
  #[arg(long, overrides_with = "no_clean")]
  clean: bool,

  /// Keep existing output directories
  #[arg(long, overrides_with = "clean")]
  no_clean: bool,

  /// Directory containing template overrides
  #[arg(long)]
  template_dir: Option<PathBuf>,

  /// Write response bodies even when the server reports an error status
  #[arg(long)]
  allow_http_errors: bool,

  /// JSON configuration file; defaults to ./bundle.config.json when present
  #[arg(long)]
  config: Option<PathBuf>,
}

impl Cli {
  fn into_config(self) -> Result<BundleConfig> {
    let mut config = match &self.config {
      Some(path) => BundleConfig::from_path(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))?,
      None => BundleConfig::discover(&std::env::current_dir()?),
    };

    if let Some(source) = self.source {
      config.source = source;
    }
    if let Some(dir) = self.app_asset_dir {
      config.app_asset_dir = dir;
    }
    if let Some(dir) = self.content_dir {
      config.content_dir = dir;
    }
    if self.clean {
      config.clean = true;
    }
    if self.no_clean {
      config.clean = false;
    }
    if self.template_dir.is_some() {
      config.template_dir = self.template_dir;
    }
    if self.allow_http_errors {
      config.allow_http_errors = true;
    }
    Ok(config)
  }
}

fn init_tracing() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run(cli: Cli) -> Result<()> {
  let config = cli.into_config()?;
  let bundler = Bundler::new(config)?;
  let report = bundler.run().await.context("bundle assembly failed")?;
  info!(
    app_id = %report.app_id,
    subscription_id = %report.subscription_id,
    files = report.files_written,
    content_dir = %report.content_dir.display(),
    "Bundle assembled"
  );
  Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
  init_tracing();
  match run(Cli::parse()).await {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      error!("{err:#}");
      ExitCode::FAILURE
    }
  }
}
