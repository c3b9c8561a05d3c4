#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod asset_paths;
pub mod assets;
pub mod builder;
pub mod bundle;
pub mod config;
pub mod copier;
pub mod engine;
pub mod error;
pub mod models;
pub mod selection;
pub mod trace;
pub mod verify;
pub mod workdir;

pub use assets::{AssetSet, AssetSetBuilder};
pub use builder::{BundlePlan, BundleRequest, Bundler};
pub use config::BundlerConfig;
pub use engine::{BuildMode, CommandEngine, TypesetEngine};
pub use error::{BundleError, BundleResult};
pub use selection::AssetInclusion;
