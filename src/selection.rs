//! Inclusion rules deciding which directory entries take part in the filtered copy.

use std::path::Path;

use crate::asset_paths::is_required;
use crate::assets::AssetSet;

/// Trait describing the per-entry decision made while walking the project tree.
pub trait AssetInclusion {
  /// Returns `true` when the entry at the absolute path `candidate` should be copied
  /// (files) or descended into (directories).
  fn is_included(&self, candidate: &Path, is_dir: bool) -> bool;
}

impl AssetInclusion for AssetSet {
  fn is_included(&self, candidate: &Path, is_dir: bool) -> bool {
    is_required(candidate, is_dir, self)
  }
}

impl<F> AssetInclusion for F
where
  F: Fn(&Path, bool) -> bool,
{
  fn is_included(&self, candidate: &Path, is_dir: bool) -> bool {
    self(candidate, is_dir)
  }
}
