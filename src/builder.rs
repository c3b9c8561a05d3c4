//! Bundling orchestrator: resolves the asset set, produces the clean copy and archive, and
//! test-builds the result.

use std::fs;
use std::path::{Path, PathBuf};

use same_file::is_same_file;
use tracing::{info, warn};

use crate::asset_paths::absolutize;
use crate::assets::{AssetSet, AssetSetBuilder, resolve_bibliography};
use crate::bundle::{ArchiveSink, StagingSink, TeeSink};
use crate::config::BundlerConfig;
use crate::copier::copy_tree;
use crate::engine::TypesetEngine;
use crate::error::{BundleError, BundleResult, InputKind};
use crate::models::BundleSummary;
use crate::trace::{TraceParser, read_trace};
use crate::verify::{record_dependencies, verify_build};

/// Inputs of a single bundling run.
#[derive(Debug, Clone)]
pub struct BundleRequest {
  /// Main LaTeX document, relative to the project directory or absolute.
  pub main_doc: PathBuf,
  /// Explicit bibliography. Derived from the main document when absent.
  pub bib_file: Option<PathBuf>,
  /// Extra files added regardless of the dependency trace.
  pub includes: Vec<PathBuf>,
  /// Directory receiving the clean copy. Must not exist unless removal is confirmed.
  pub output_dir: PathBuf,
  /// Zip archive to write.
  pub archive: PathBuf,
  /// Run the engine in recorder mode first instead of reusing an existing trace.
  pub record: bool,
  /// Test-build the clean copy.
  pub verify: bool,
}

impl BundleRequest {
  /// Request with the default behaviour: record the trace, then verify the copy.
  pub fn new(main_doc: impl Into<PathBuf>, output_dir: impl Into<PathBuf>, archive: impl Into<PathBuf>) -> Self {
    Self {
      main_doc: main_doc.into(),
      bib_file: None,
      includes: Vec::new(),
      output_dir: output_dir.into(),
      archive: archive.into(),
      record: true,
      verify: true,
    }
  }
}

/// Resolved asset set together with the locations the copy works on.
#[derive(Debug, Clone)]
pub struct BundlePlan {
  /// Every file the clean copy must contain.
  pub assets: AssetSet,
  /// Directory containing the main document; root of the filtered copy.
  pub source_root: PathBuf,
  /// Main document name relative to `source_root`, used for the test build.
  pub document: PathBuf,
}

/// High-level helper driving a bundling run against one project directory.
pub struct Bundler<'a, E: TypesetEngine + ?Sized> {
  config: &'a BundlerConfig,
  engine: &'a E,
  project_dir: PathBuf,
}

impl<'a, E: TypesetEngine + ?Sized> Bundler<'a, E> {
  /// Create a bundler. Relative request paths are resolved against `project_dir`, which is
  /// also where the recording build runs.
  pub fn new(config: &'a BundlerConfig, engine: &'a E, project_dir: impl Into<PathBuf>) -> Self {
    Self {
      config,
      engine,
      project_dir: project_dir.into(),
    }
  }

  /// Validate the inputs, record and parse the dependency trace, and build the asset set.
  pub fn plan(&self, request: &BundleRequest) -> BundleResult<BundlePlan> {
    let main_abs = absolutize(&self.project_dir, &request.main_doc);
    if !main_abs.is_file() {
      return Err(BundleError::MissingInput {
        kind: InputKind::MainDocument,
        path: request.main_doc.clone(),
      });
    }
    if let Some(missing) = request
      .includes
      .iter()
      .find(|include| !absolutize(&self.project_dir, include).is_file())
    {
      return Err(BundleError::MissingInput {
        kind: InputKind::Include,
        path: missing.clone(),
      });
    }
    let bibliography = resolve_bibliography(
      self.config,
      &self.project_dir,
      &request.main_doc,
      request.bib_file.as_deref(),
    )?;

    if request.record {
      record_dependencies(self.engine, &self.project_dir, &request.main_doc)?;
    }

    let trace_path = self.config.trace_path(&request.main_doc);
    let trace_text = read_trace(&absolutize(&self.project_dir, &trace_path), &request.main_doc)?;
    let parser = TraceParser::new(&self.config.trace_marker);

    let assets = AssetSetBuilder::new(&self.project_dir, &request.main_doc, &bibliography)
      .trace_entries(parser.entries(&trace_text))
      .includes(&request.includes)
      .build();
    info!(assets = assets.len(), trace = %trace_path.display(), "resolved asset set");

    let source_root = main_abs
      .parent()
      .map(Path::to_path_buf)
      .unwrap_or_else(|| self.project_dir.clone());
    let document = main_abs
      .file_name()
      .map(PathBuf::from)
      .unwrap_or_else(|| request.main_doc.clone());

    Ok(BundlePlan {
      assets,
      source_root,
      document,
    })
  }

  /// Produce the clean copy and the archive for `plan`, then test-build the copy.
  ///
  /// `confirm_removal` is asked before a pre-existing output directory is deleted. The archive
  /// is removed again when the copy or the test build fails.
  pub fn package(
    &self,
    plan: &BundlePlan,
    request: &BundleRequest,
    confirm_removal: impl FnOnce(&Path) -> bool,
  ) -> BundleResult<BundleSummary> {
    let staging_dir = absolutize(&self.project_dir, &request.output_dir);
    let archive_path = absolutize(&self.project_dir, &request.archive);
    prepare_output_dir(&staging_dir, &plan.source_root, confirm_removal)?;

    let staged_files = match write_copy(plan, &staging_dir, &archive_path) {
      Ok(entries) => entries,
      Err(source) => {
        discard_archive(&archive_path);
        return Err(BundleError::Copy {
          staging: staging_dir,
          source,
        });
      }
    };
    info!(
      files = staged_files.len(),
      archive = %archive_path.display(),
      "wrote clean copy"
    );

    if request.verify {
      if let Err(err) = verify_build(self.engine, &staging_dir, &plan.document) {
        discard_archive(&archive_path);
        return Err(err);
      }
    }

    Ok(BundleSummary {
      assets: plan.assets.records().to_vec(),
      staged_files,
      staging_dir,
      archive: archive_path,
      verified: request.verify,
    })
  }
}

/// Make sure `staging_dir` does not exist, removing it after confirmation when it does.
fn prepare_output_dir(
  staging_dir: &Path,
  source_root: &Path,
  confirm_removal: impl FnOnce(&Path) -> bool,
) -> BundleResult<()> {
  if !staging_dir.exists() {
    return Ok(());
  }

  let contains_project = source_root.starts_with(staging_dir)
    || is_same_file(staging_dir, source_root).unwrap_or(false);
  if contains_project {
    return Err(BundleError::OutputIsSource {
      path: staging_dir.to_path_buf(),
    });
  }

  if !confirm_removal(staging_dir) {
    return Err(BundleError::Aborted {
      path: staging_dir.to_path_buf(),
    });
  }

  let removal = if staging_dir.is_dir() {
    fs::remove_dir_all(staging_dir)
  } else {
    fs::remove_file(staging_dir)
  };
  removal.map_err(|source| {
    BundleError::io(format!("failed to remove {}", staging_dir.display()), source)
  })
}

fn write_copy(plan: &BundlePlan, staging_dir: &Path, archive_path: &Path) -> anyhow::Result<Vec<String>> {
  let archive = ArchiveSink::create(archive_path)?;
  let mut sink = TeeSink::new(StagingSink::new(staging_dir), archive);
  copy_tree(&plan.source_root, &plan.assets, &mut sink)?;

  let (_, archive) = sink.into_inner();
  let (_, entries) = archive.finish()?;
  Ok(entries)
}

fn discard_archive(archive_path: &Path) {
  if let Err(err) = fs::remove_file(archive_path) {
    if err.kind() != std::io::ErrorKind::NotFound {
      warn!(archive = %archive_path.display(), error = %err, "failed to remove archive");
    }
  }
}
