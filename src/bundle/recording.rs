//! In-memory sink that records calls instead of touching the filesystem.

use std::path::{Path, PathBuf};

use anyhow::Result;

use super::AssetSink;

/// Sink remembering every announced directory and delivered file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecordingSink {
  /// Relative directories, in announcement order.
  pub dirs: Vec<PathBuf>,
  /// `(source, relative)` pairs, in delivery order.
  pub files: Vec<(PathBuf, PathBuf)>,
}

impl AssetSink for RecordingSink {
  fn enter_dir(&mut self, relative: &Path) -> Result<()> {
    self.dirs.push(relative.to_path_buf());
    Ok(())
  }

  fn deliver(&mut self, source: &Path, relative: &Path) -> Result<()> {
    self.files.push((source.to_path_buf(), relative.to_path_buf()));
    Ok(())
  }
}
