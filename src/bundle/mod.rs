//! Destinations for the files selected by the filtered copy.
//!
//! The tree walk hands every selected file to an [`AssetSink`] and stays unaware of how
//! many places the file ends up in. [`TeeSink`] fans one delivery out to two sinks, which is
//! how the staging directory and the archive are populated in a single pass.

pub mod archive;
pub mod recording;
pub mod staging;

use std::path::Path;

use anyhow::Result;

pub use archive::ArchiveSink;
pub use recording::RecordingSink;
pub use staging::StagingSink;

/// Receiver of the directories and files chosen by the filtered copy.
///
/// Paths handed to the sink are relative to the copy root.
pub trait AssetSink {
  /// Called before any entry of the directory `relative` is delivered. The root directory is
  /// announced with an empty path.
  fn enter_dir(&mut self, _relative: &Path) -> Result<()> {
    Ok(())
  }

  /// Store the file at `source` under the name `relative`.
  fn deliver(&mut self, source: &Path, relative: &Path) -> Result<()>;
}

impl<S: AssetSink + ?Sized> AssetSink for &mut S {
  fn enter_dir(&mut self, relative: &Path) -> Result<()> {
    (**self).enter_dir(relative)
  }

  fn deliver(&mut self, source: &Path, relative: &Path) -> Result<()> {
    (**self).deliver(source, relative)
  }
}

/// Sink forwarding every call to two sinks, first to `primary` then to `secondary`.
#[derive(Debug)]
pub struct TeeSink<A, B> {
  /// Sink receiving each call first.
  pub primary: A,
  /// Sink receiving each call second.
  pub secondary: B,
}

impl<A, B> TeeSink<A, B> {
  /// Combine two sinks.
  pub fn new(primary: A, secondary: B) -> Self {
    Self { primary, secondary }
  }

  /// Split the tee back into its parts.
  pub fn into_inner(self) -> (A, B) {
    (self.primary, self.secondary)
  }
}

impl<A: AssetSink, B: AssetSink> AssetSink for TeeSink<A, B> {
  fn enter_dir(&mut self, relative: &Path) -> Result<()> {
    self.primary.enter_dir(relative)?;
    self.secondary.enter_dir(relative)
  }

  fn deliver(&mut self, source: &Path, relative: &Path) -> Result<()> {
    self.primary.deliver(source, relative)?;
    self.secondary.deliver(source, relative)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::path::PathBuf;

  #[test]
  fn tee_forwards_calls_to_both_sinks_in_order() -> Result<()> {
    let mut tee = TeeSink::new(RecordingSink::default(), RecordingSink::default());
    tee.enter_dir(Path::new(""))?;
    tee.deliver(Path::new("/p/a.tex"), Path::new("a.tex"))?;

    let (first, second) = tee.into_inner();
    assert_eq!(first.files, second.files);
    assert_eq!(first.dirs, vec![PathBuf::new()]);
    assert_eq!(first.files, vec![(PathBuf::from("/p/a.tex"), PathBuf::from("a.tex"))]);
    Ok(())
  }

  #[test]
  fn tee_stops_at_first_failure() {
    struct Failing;
    impl AssetSink for Failing {
      fn deliver(&mut self, _source: &Path, _relative: &Path) -> Result<()> {
        anyhow::bail!("disk full")
      }
    }

    let mut recorder = RecordingSink::default();
    let mut tee = TeeSink::new(Failing, &mut recorder);
    assert!(tee.deliver(Path::new("/p/a.tex"), Path::new("a.tex")).is_err());
    drop(tee);
    assert!(recorder.files.is_empty());
  }
}
