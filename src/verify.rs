//! Engine runs around the copy: recording the dependency trace and test-building the result.

use std::path::Path;

use tracing::{info, warn};

use crate::engine::{BuildMode, TypesetEngine};
use crate::error::{BundleError, BundleResult};
use crate::workdir::with_working_dir;

/// Run the engine in recorder mode on `main_doc` from `project_dir`.
pub fn record_dependencies<E: TypesetEngine + ?Sized>(
  engine: &E,
  project_dir: &Path,
  main_doc: &Path,
) -> BundleResult<()> {
  let code = run_in(engine, project_dir, BuildMode::Record, main_doc)?;
  if code != 0 {
    warn!(code, "recording dependencies failed");
    return Err(BundleError::RecordingFailed { code });
  }
  Ok(())
}

/// Build `document` inside `staging_dir` to prove the clean copy is self-sufficient.
///
/// `document` is resolved relative to the staging directory. A non-zero exit code yields
/// [`BundleError::VerificationFailed`] carrying that code.
pub fn verify_build<E: TypesetEngine + ?Sized>(
  engine: &E,
  staging_dir: &Path,
  document: &Path,
) -> BundleResult<()> {
  let code = run_in(engine, staging_dir, BuildMode::Verify, document)?;
  if code != 0 {
    warn!(code, staging = %staging_dir.display(), "test build failed");
    return Err(BundleError::VerificationFailed { code });
  }
  info!(staging = %staging_dir.display(), "test build succeeded");
  Ok(())
}

fn run_in<E: TypesetEngine + ?Sized>(
  engine: &E,
  dir: &Path,
  mode: BuildMode,
  document: &Path,
) -> BundleResult<i32> {
  with_working_dir(dir, || engine.run(mode, document))
    .map_err(|source| BundleError::io(format!("failed to enter {}", dir.display()), source))?
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::cell::RefCell;
  use std::env;
  use std::path::PathBuf;
  use tempfile::tempdir;

  /// Engine answering with a fixed code and remembering where it was run.
  struct FixedEngine {
    code: i32,
    calls: RefCell<Vec<(BuildMode, PathBuf, bool)>>,
  }

  impl FixedEngine {
    fn new(code: i32) -> Self {
      Self {
        code,
        calls: RefCell::new(Vec::new()),
      }
    }
  }

  impl TypesetEngine for FixedEngine {
    fn run(&self, mode: BuildMode, document: &Path) -> BundleResult<i32> {
      let cwd = env::current_dir().expect("current dir");
      self
        .calls
        .borrow_mut()
        .push((mode, cwd, document.exists()));
      Ok(self.code)
    }
  }

  #[test]
  fn verification_runs_inside_staging_directory() {
    let temp = tempdir().unwrap();
    std::fs::write(temp.path().join("main.tex"), "x").unwrap();
    let engine = FixedEngine::new(0);

    verify_build(&engine, temp.path(), Path::new("main.tex")).unwrap();

    let calls = engine.calls.borrow();
    assert_eq!(calls.len(), 1);
    let (mode, cwd, found) = &calls[0];
    assert_eq!(*mode, BuildMode::Verify);
    assert_eq!(cwd.canonicalize().unwrap(), temp.path().canonicalize().unwrap());
    assert!(*found);
  }

  #[test]
  fn non_zero_verification_carries_exit_code() {
    let temp = tempdir().unwrap();
    let err = verify_build(&FixedEngine::new(12), temp.path(), Path::new("main.tex")).unwrap_err();
    assert!(matches!(err, BundleError::VerificationFailed { code: 12 }));
    assert_eq!(err.exit_code(), 12);
  }

  #[test]
  fn failed_recording_is_reported() {
    let temp = tempdir().unwrap();
    let err =
      record_dependencies(&FixedEngine::new(1), temp.path(), Path::new("main.tex")).unwrap_err();
    assert!(matches!(err, BundleError::RecordingFailed { code: 1 }));
  }

  #[test]
  fn missing_staging_directory_is_an_io_error() {
    let temp = tempdir().unwrap();
    let engine = FixedEngine::new(0);
    let err = verify_build(&engine, &temp.path().join("absent"), Path::new("main.tex")).unwrap_err();
    assert!(matches!(err, BundleError::Io { .. }));
    assert!(engine.calls.borrow().is_empty());
  }
}
