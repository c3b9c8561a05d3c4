use std::path::Path;

use crate::assets::AssetSet;

/// Decide whether a directory entry takes part in the filtered copy.
///
/// An entry is required when its absolute path is an asset, or when it is a directory that
/// contains (or is) an asset path. Ancestor matching compares whole path components, unlike a
/// raw string-prefix match: `chap` is not an ancestor of `chapters/intro.tex`.
pub fn is_required(candidate: &Path, is_dir: bool, assets: &AssetSet) -> bool {
    if assets.contains(candidate) {
        return true;
    }
    is_dir && assets.iter().any(|asset| asset.starts_with(candidate))
}
