#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod config;
pub mod content;
pub mod error;
pub mod fetch;
pub mod fsops;
pub mod layout;
pub mod locator;
pub mod manifest;
pub mod models;
pub mod pipeline;
pub mod scatter;
pub mod template;

pub use config::BundleConfig;
pub use error::{BundleError, Result};
pub use layout::BundleLayout;
pub use pipeline::{BundleReport, Bundler};
