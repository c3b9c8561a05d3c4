//! Zip archive sink, the write-once package built alongside the staging directory.

use std::fs::{self, File};
use std::io::{self, Seek, Write};
use std::path::Path;

use anyhow::{Context, Result};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use super::AssetSink;
use crate::asset_paths::archive_name;

/// Sink appending every delivered file to a zip archive.
///
/// Entries carry a fixed timestamp so that identical inputs produce identical archives.
pub struct ArchiveSink<W: Write + Seek> {
  writer: ZipWriter<W>,
  options: SimpleFileOptions,
  entries: Vec<String>,
}

impl ArchiveSink<File> {
  /// Create (or truncate) the archive file at `path`.
  pub fn create(path: &Path) -> Result<Self> {
    let file =
      File::create(path).with_context(|| format!("failed to create zip: {}", path.display()))?;
    Ok(Self::new(file))
  }
}

impl<W: Write + Seek> ArchiveSink<W> {
  /// Start an archive on top of `writer`.
  pub fn new(writer: W) -> Self {
    let options = SimpleFileOptions::default()
      .compression_method(CompressionMethod::Deflated)
      .last_modified_time(DateTime::default());
    Self {
      writer: ZipWriter::new(writer),
      options,
      entries: Vec::new(),
    }
  }

  /// Names of the entries written so far.
  pub fn entries(&self) -> &[String] {
    &self.entries
  }

  /// Write the central directory and release the writer, returning the entry names.
  pub fn finish(self) -> Result<(W, Vec<String>)> {
    let writer = self
      .writer
      .finish()
      .context("failed to finalize zip archive")?;
    Ok((writer, self.entries))
  }
}

impl<W: Write + Seek> AssetSink for ArchiveSink<W> {
  fn deliver(&mut self, source: &Path, relative: &Path) -> Result<()> {
    let name = archive_name(relative);
    let mut source_file = File::open(source)
      .with_context(|| format!("failed to open file for zip: {}", source.display()))?;
    let options = self.options.clone().unix_permissions(file_mode(source)?);

    self
      .writer
      .start_file(name.clone(), options)
      .with_context(|| format!("failed to add file to zip: {name}"))?;
    io::copy(&mut source_file, &mut self.writer)
      .with_context(|| format!("failed to write file to zip: {name}"))?;
    self.entries.push(name);
    Ok(())
  }
}

#[cfg(unix)]
fn file_mode(path: &Path) -> Result<u32> {
  use std::os::unix::fs::PermissionsExt;

  let metadata = fs::metadata(path).with_context(|| format!("failed to stat {}", path.display()))?;
  Ok(metadata.permissions().mode() & 0o7777)
}

#[cfg(not(unix))]
fn file_mode(path: &Path) -> Result<u32> {
  let metadata = fs::metadata(path).with_context(|| format!("failed to stat {}", path.display()))?;
  Ok(if metadata.permissions().readonly() { 0o444 } else { 0o644 })
}
