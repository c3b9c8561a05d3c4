//! The external typesetting engine, treated as a black box with an exit status.

use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

use tracing::info;

use crate::config::BundlerConfig;
use crate::error::{BundleError, BundleResult, EXIT_FAILURE};

/// Purpose of an engine run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
  /// Draft build that writes the dependency trace next to the document.
  Record,
  /// Full, non-interactive build that halts on the first error.
  Verify,
}

/// Typesetting engine invoked on a document inside the current working directory.
pub trait TypesetEngine {
  /// Build `document` and return the engine's exit code.
  ///
  /// Failing to start the engine is an error; a build failure is a non-zero code.
  fn run(&self, mode: BuildMode, document: &Path) -> BundleResult<i32>;
}

impl<E: TypesetEngine + ?Sized> TypesetEngine for &E {
  fn run(&self, mode: BuildMode, document: &Path) -> BundleResult<i32> {
    (**self).run(mode, document)
  }
}

/// Engine backed by an executable such as `pdflatex`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandEngine {
  program: String,
  record_args: Vec<String>,
  verify_args: Vec<String>,
}

impl CommandEngine {
  /// Engine using the executable and arguments from `config`.
  pub fn from_config(config: &BundlerConfig) -> Self {
    Self {
      program: config.engine.clone(),
      record_args: config.record_args.clone(),
      verify_args: config.verify_args.clone(),
    }
  }

  fn command(&self, mode: BuildMode, document: &Path) -> Command {
    let args = match mode {
      BuildMode::Record => &self.record_args,
      BuildMode::Verify => &self.verify_args,
    };
    let mut command = Command::new(&self.program);
    command.args(args).arg(document).stdin(Stdio::null());
    command
  }
}

impl TypesetEngine for CommandEngine {
  fn run(&self, mode: BuildMode, document: &Path) -> BundleResult<i32> {
    info!(program = %self.program, ?mode, document = %document.display(), "running engine");
    let status = self
      .command(mode, document)
      .status()
      .map_err(|source| BundleError::ToolLaunch {
        program: self.program.clone(),
        source,
      })?;
    Ok(exit_code(status))
  }
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
  use std::os::unix::process::ExitStatusExt;

  status
    .code()
    .or_else(|| status.signal().map(|signal| 128 + signal))
    .unwrap_or(EXIT_FAILURE)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
  status.code().unwrap_or(EXIT_FAILURE)
}
