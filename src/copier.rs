//! Filtered recursive copy of the project tree.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::trace;

use crate::bundle::AssetSink;
use crate::selection::AssetInclusion;

/// Walk `source_root` top-down and hand every included entry to `sink`.
///
/// Directories are announced through [`AssetSink::enter_dir`] before their contents, files
/// are delivered with their path relative to `source_root`. Entries within a directory are
/// visited in name order. The first error aborts the walk.
///
/// Returns the number of delivered files.
pub fn copy_tree<I, S>(source_root: &Path, selection: &I, sink: &mut S) -> Result<usize>
where
  I: AssetInclusion + ?Sized,
  S: AssetSink + ?Sized,
{
  sink.enter_dir(Path::new(""))?;
  copy_subtree(source_root, Path::new(""), selection, sink)
}

fn copy_subtree<I, S>(dir: &Path, relative: &Path, selection: &I, sink: &mut S) -> Result<usize>
where
  I: AssetInclusion + ?Sized,
  S: AssetSink + ?Sized,
{
  let mut names = fs::read_dir(dir)
    .with_context(|| format!("failed to read {}", dir.display()))?
    .map(|entry| entry.map(|entry| entry.file_name()))
    .collect::<std::io::Result<Vec<_>>>()
    .with_context(|| format!("failed to list {}", dir.display()))?;
  names.sort();

  let mut delivered = 0;
  for name in names {
    let path = dir.join(&name);
    // Broken symlinks count as files, so a required one fails loudly on delivery.
    let is_dir = fs::metadata(&path).is_ok_and(|metadata| metadata.is_dir());
    if !selection.is_included(&path, is_dir) {
      trace!(path = %path.display(), "excluded");
      continue;
    }

    let child_relative: PathBuf = relative.join(&name);
    if is_dir {
      sink.enter_dir(&child_relative)?;
      delivered += copy_subtree(&path, &child_relative, selection, sink)?;
    } else {
      sink.deliver(&path, &child_relative)?;
      delivered += 1;
    }
  }

  Ok(delivered)
}
