//! Scoped change of the process working directory.
//!
//! The working directory is global process state. Every change made through this module
//! holds a process-wide lock until the previous directory has been restored, so concurrent
//! callers (including parallel tests) are serialized.

use std::env;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::warn;

static WORKDIR_LOCK: Mutex<()> = Mutex::new(());

/// Guard restoring the previous working directory when dropped.
#[derive(Debug)]
pub struct WorkingDirGuard {
  previous: PathBuf,
  _lock: MutexGuard<'static, ()>,
}

impl WorkingDirGuard {
  /// Change into `dir`, remembering the current working directory.
  pub fn enter(dir: &Path) -> io::Result<Self> {
    let lock = WORKDIR_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let previous = env::current_dir()?;
    env::set_current_dir(dir)?;
    Ok(Self {
      previous,
      _lock: lock,
    })
  }
}

impl Drop for WorkingDirGuard {
  fn drop(&mut self) {
    if let Err(err) = env::set_current_dir(&self.previous) {
      warn!(
        dir = %self.previous.display(),
        error = %err,
        "failed to restore working directory"
      );
    }
  }
}

/// Run `f` with `dir` as working directory and restore the previous one afterwards,
/// also when `f` fails or panics.
pub fn with_working_dir<T>(dir: &Path, f: impl FnOnce() -> T) -> io::Result<T> {
  let _guard = WorkingDirGuard::enter(dir)?;
  Ok(f())
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::panic::{AssertUnwindSafe, catch_unwind};
  use tempfile::tempdir;

  fn current() -> PathBuf {
    let _lock = WORKDIR_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    env::current_dir().unwrap()
  }

  #[test]
  fn runs_callback_inside_directory_and_restores() {
    let temp = tempdir().unwrap();
    let target = temp.path().canonicalize().unwrap();
    let before = current();

    let seen = with_working_dir(&target, || env::current_dir().unwrap()).unwrap();
    assert_eq!(seen.canonicalize().unwrap(), target);
    assert_eq!(current(), before);
  }

  #[test]
  fn restores_after_callback_error() {
    let temp = tempdir().unwrap();
    let before = current();

    let result: Result<(), &str> = with_working_dir(temp.path(), || Err("build failed")).unwrap();
    assert!(result.is_err());
    assert_eq!(current(), before);
  }

  #[test]
  fn restores_after_panic() {
    let temp = tempdir().unwrap();
    let before = current();

    let outcome = catch_unwind(AssertUnwindSafe(|| {
      with_working_dir(temp.path(), || panic!("engine crashed")).unwrap()
    }));
    assert!(outcome.is_err());
    assert_eq!(current(), before);
  }

  #[test]
  fn missing_directory_leaves_working_directory_untouched() {
    let temp = tempdir().unwrap();
    let before = current();

    assert!(with_working_dir(&temp.path().join("absent"), || ()).is_err());
    assert_eq!(current(), before);
  }
}
