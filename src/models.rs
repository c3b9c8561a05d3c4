//! Data structures produced while resolving and packaging a project.

use std::path::PathBuf;

use serde::Serialize;

/// Origin of an asset in the resolved set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetSource {
  /// The main LaTeX document.
  MainDocument,
  /// The bibliography, explicit or derived from the main document name.
  Bibliography,
  /// A relative `INPUT` record of the dependency trace.
  Trace,
  /// A file added with `--include`.
  Include,
}

/// One member of the asset set, keeping the form the user or engine wrote it in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetRecord {
  /// Path as supplied, used for diagnostic output.
  pub path: PathBuf,
  /// Absolute, normalised path used for membership tests.
  pub absolute: PathBuf,
  /// Where the asset came from.
  pub source: AssetSource,
}

/// Serializable summary of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct BundleSummary {
  /// Every asset that was requested, in resolution order.
  pub assets: Vec<AssetRecord>,
  /// Archive entry names written, relative to the staging root.
  pub staged_files: Vec<String>,
  /// Directory holding the clean copy.
  pub staging_dir: PathBuf,
  /// Written archive.
  pub archive: PathBuf,
  /// Whether the staged copy was built successfully by the engine.
  pub verified: bool,
}
