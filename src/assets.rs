//! Assembly of the asset set: every file the clean copy must contain.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::asset_paths::{absolutize, is_project_local};
use crate::config::BundlerConfig;
use crate::error::{BundleError, BundleResult, InputKind};
use crate::models::{AssetRecord, AssetSource};
use crate::trace::TraceEntry;

/// Deduplicated set of absolute asset paths. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct AssetSet {
  members: BTreeSet<PathBuf>,
  records: Vec<AssetRecord>,
}

impl AssetSet {
  /// Build a set directly from absolute paths.
  pub fn from_absolute(paths: impl IntoIterator<Item = PathBuf>) -> Self {
    let mut set = Self::default();
    for path in paths {
      set.insert(path.clone(), path, AssetSource::Include);
    }
    set
  }

  fn insert(&mut self, path: PathBuf, absolute: PathBuf, source: AssetSource) {
    if self.members.insert(absolute.clone()) {
      self.records.push(AssetRecord {
        path,
        absolute,
        source,
      });
    }
  }

  /// Whether `path` is exactly a member of the set.
  pub fn contains(&self, path: &Path) -> bool {
    self.members.contains(path)
  }

  /// Iterate the absolute member paths in sorted order.
  pub fn iter(&self) -> impl Iterator<Item = &Path> {
    self.members.iter().map(PathBuf::as_path)
  }

  /// Members in resolution order, with their original spelling.
  pub fn records(&self) -> &[AssetRecord] {
    &self.records
  }

  /// Number of distinct assets.
  pub fn len(&self) -> usize {
    self.members.len()
  }

  /// Returns true when the set holds no assets.
  pub fn is_empty(&self) -> bool {
    self.members.is_empty()
  }
}

/// Incremental builder for an [`AssetSet`].
///
/// Relative paths are resolved against the project directory, which is the directory the
/// engine was run from when it recorded the trace.
#[derive(Debug)]
pub struct AssetSetBuilder {
  project_dir: PathBuf,
  set: AssetSet,
}

impl AssetSetBuilder {
  /// Start a set rooted at `project_dir` containing the main document and bibliography.
  pub fn new(project_dir: impl Into<PathBuf>, main_doc: &Path, bibliography: &Path) -> Self {
    let mut builder = Self {
      project_dir: project_dir.into(),
      set: AssetSet::default(),
    };
    builder.add(main_doc, AssetSource::MainDocument);
    builder.add(bibliography, AssetSource::Bibliography);
    builder
  }

  /// Add the project-local records of a dependency trace, discarding absolute ones.
  ///
  /// Records that do not exist on disk are kept; they simply never match during the copy.
  pub fn trace_entries<'a>(mut self, entries: impl IntoIterator<Item = TraceEntry<'a>>) -> Self {
    for entry in entries {
      if is_project_local(entry.path) {
        self.add(Path::new(entry.path), AssetSource::Trace);
      } else {
        debug!(line = entry.line, path = entry.path, "skipping non-local trace entry");
      }
    }
    self
  }

  /// Force-add manually specified files.
  pub fn includes<P: AsRef<Path>>(mut self, includes: impl IntoIterator<Item = P>) -> Self {
    for include in includes {
      self.add(include.as_ref(), AssetSource::Include);
    }
    self
  }

  /// Finish the set.
  pub fn build(self) -> AssetSet {
    self.set
  }

  fn add(&mut self, path: &Path, source: AssetSource) {
    let absolute = absolutize(&self.project_dir, path);
    self.set.insert(path.to_path_buf(), absolute, source);
  }
}

/// Resolve the bibliography for `main_doc`.
///
/// An explicit file must exist. Without one, the main document's base name with the
/// bibliography extension is assumed, and its absence is a [`BundleError::MissingBibliography`].
pub fn resolve_bibliography(
  config: &BundlerConfig,
  project_dir: &Path,
  main_doc: &Path,
  explicit: Option<&Path>,
) -> BundleResult<PathBuf> {
  match explicit {
    Some(path) => {
      if !absolutize(project_dir, path).is_file() {
        return Err(BundleError::MissingInput {
          kind: InputKind::Bibliography,
          path: path.to_path_buf(),
        });
      }
      Ok(path.to_path_buf())
    }
    None => {
      let path = config.default_bibliography(main_doc);
      if !absolutize(project_dir, &path).exists() {
        return Err(BundleError::MissingBibliography { path });
      }
      Ok(path)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::trace::TraceParser;
  use std::fs;
  use tempfile::tempdir;

  const TRACE: &str = "PWD /p\nINPUT chapters/intro.tex\nINPUT /usr/share/texmf/foo.sty\nINPUT main.tex\n";

  #[test]
  fn keeps_local_trace_entries_and_drops_absolute_ones() {
    let parser = TraceParser::default();
    let assets = AssetSetBuilder::new("/p", Path::new("main.tex"), Path::new("main.bib"))
      .trace_entries(parser.entries(TRACE))
      .build();

    let members: Vec<&Path> = assets.iter().collect();
    assert_eq!(members, vec![
      Path::new("/p/chapters/intro.tex"),
      Path::new("/p/main.bib"),
      Path::new("/p/main.tex"),
    ]);
    assert!(assets.iter().all(|path| !path.starts_with("/usr")));
  }

  #[test]
  fn records_keep_first_spelling_and_source() {
    let assets = AssetSetBuilder::new("/p", Path::new("main.tex"), Path::new("main.bib"))
      .trace_entries(TraceParser::default().entries("INPUT ./main.tex\nINPUT fig.pdf\n"))
      .includes(["extra/data.csv", "fig.pdf"])
      .build();

    let listed: Vec<(&Path, AssetSource)> = assets
      .records()
      .iter()
      .map(|record| (record.path.as_path(), record.source))
      .collect();
    assert_eq!(listed, vec![
      (Path::new("main.tex"), AssetSource::MainDocument),
      (Path::new("main.bib"), AssetSource::Bibliography),
      (Path::new("fig.pdf"), AssetSource::Trace),
      (Path::new("extra/data.csv"), AssetSource::Include),
    ]);
    assert_eq!(assets.len(), 4);
  }

  #[test]
  fn defaults_bibliography_to_main_document_name() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("thesis.bib"), "").unwrap();

    let bib = resolve_bibliography(
      &BundlerConfig::default(),
      dir.path(),
      Path::new("thesis.tex"),
      None,
    )
    .unwrap();
    assert_eq!(bib, PathBuf::from("thesis.bib"));
  }

  #[test]
  fn missing_default_bibliography_is_fatal() {
    let dir = tempdir().unwrap();
    let err = resolve_bibliography(
      &BundlerConfig::default(),
      dir.path(),
      Path::new("main.tex"),
      None,
    )
    .unwrap_err();
    assert!(matches!(err, BundleError::MissingBibliography { .. }));
    assert_eq!(err.exit_code(), 1);
  }

  #[test]
  fn explicit_bibliography_must_exist() {
    let dir = tempdir().unwrap();
    let err = resolve_bibliography(
      &BundlerConfig::default(),
      dir.path(),
      Path::new("main.tex"),
      Some(Path::new("refs.bib")),
    )
    .unwrap_err();
    assert!(matches!(err, BundleError::MissingInput {
      kind: InputKind::Bibliography,
      ..
    }));
  }
}
