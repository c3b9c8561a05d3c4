//! Sink writing the clean copy of the project into a staging directory.

use std::fs::{self, File, FileTimes};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use super::AssetSink;

/// Sink reproducing delivered files below a staging root.
#[derive(Debug)]
pub struct StagingSink {
  root: PathBuf,
}

impl StagingSink {
  /// Create a sink writing below `root`. The root itself is created on the first
  /// [`AssetSink::enter_dir`] call.
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  /// Staging root.
  pub fn root(&self) -> &Path {
    &self.root
  }
}

impl AssetSink for StagingSink {
  fn enter_dir(&mut self, relative: &Path) -> Result<()> {
    let target = self.root.join(relative);
    fs::create_dir_all(&target)
      .with_context(|| format!("failed to create {}", target.display()))
  }

  fn deliver(&mut self, source: &Path, relative: &Path) -> Result<()> {
    let destination = self.root.join(relative);
    copy_with_metadata(source, &destination)?;
    debug!(file = %relative.display(), "staged");
    Ok(())
  }
}

/// Copy file contents and permissions, then carry over access and modification times.
fn copy_with_metadata(source: &Path, destination: &Path) -> Result<()> {
  fs::copy(source, destination).with_context(|| {
    format!(
      "failed to copy {} to {}",
      source.display(),
      destination.display()
    )
  })?;

  let metadata =
    fs::metadata(source).with_context(|| format!("failed to stat {}", source.display()))?;
  let mut times = FileTimes::new();
  if let Ok(accessed) = metadata.accessed() {
    times = times.set_accessed(accessed);
  }
  if let Ok(modified) = metadata.modified() {
    times = times.set_modified(modified);
  }

  File::options()
    .write(true)
    .open(destination)
    .and_then(|file| file.set_times(times))
    .with_context(|| format!("failed to set timestamps on {}", destination.display()))
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::time::{Duration, SystemTime};
  use tempfile::tempdir;

  #[test]
  fn copies_contents_and_modification_time() -> Result<()> {
    let temp = tempdir()?;
    let source = temp.path().join("main.tex");
    fs::write(&source, b"\\documentclass{article}")?;
    let past = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000_000);
    File::options()
      .write(true)
      .open(&source)?
      .set_times(FileTimes::new().set_modified(past))?;

    let mut sink = StagingSink::new(temp.path().join("stage"));
    sink.enter_dir(Path::new(""))?;
    sink.deliver(&source, Path::new("main.tex"))?;

    let staged = sink.root().join("main.tex");
    assert_eq!(fs::read(&staged)?, b"\\documentclass{article}");
    assert_eq!(fs::metadata(&staged)?.modified()?, past);
    Ok(())
  }

  #[test]
  fn delivery_into_missing_directory_fails() -> Result<()> {
    let temp = tempdir()?;
    let source = temp.path().join("a.tex");
    fs::write(&source, b"a")?;

    let mut sink = StagingSink::new(temp.path().join("stage"));
    sink.enter_dir(Path::new(""))?;
    assert!(sink.deliver(&source, Path::new("missing/a.tex")).is_err());
    Ok(())
  }
}
