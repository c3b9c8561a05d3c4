//! Error taxonomy for a bundling run and its mapping onto process exit codes.

use std::path::PathBuf;

use crate::config::ConfigError;

/// Result alias used by the bundling pipeline.
pub type BundleResult<T> = Result<T, BundleError>;

/// Exit code reported when the bibliography cannot be located.
pub const EXIT_MISSING_BIBLIOGRAPHY: i32 = 1;
/// Exit code reported for missing inputs, including the dependency trace.
pub const EXIT_MISSING_INPUT: i32 = 2;
/// Exit code reported when the typesetting engine could not be started.
pub const EXIT_TOOL_LAUNCH: i32 = 127;
/// Exit code for every other fatal failure.
pub const EXIT_FAILURE: i32 = 1;

/// Kind of user supplied input that failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
  /// The main LaTeX document.
  MainDocument,
  /// An explicitly supplied bibliography file.
  Bibliography,
  /// A manually included file.
  Include,
}

impl std::fmt::Display for InputKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::MainDocument => f.write_str("main document"),
      Self::Bibliography => f.write_str("bibliography file"),
      Self::Include => f.write_str("include"),
    }
  }
}

/// Errors that terminate a bundling run.
#[derive(Debug, thiserror::Error)]
pub enum BundleError {
  /// A file named on the command line does not exist.
  #[error("{kind} {} does not exist", .path.display())]
  MissingInput {
    /// Which input was missing.
    kind: InputKind,
    /// Path as supplied by the user.
    path: PathBuf,
  },
  /// No bibliography was supplied and the default one does not exist.
  #[error("no bib file found at {}", .path.display())]
  MissingBibliography {
    /// Default bibliography path that was probed.
    path: PathBuf,
  },
  /// The dependency trace written by the recording run is missing or unreadable.
  #[error("cannot read dependency file {}", .path.display())]
  MissingDependencyFile {
    /// Expected trace location.
    path: PathBuf,
    /// Main document the trace belongs to.
    document: PathBuf,
    /// Underlying I/O error.
    #[source]
    source: std::io::Error,
  },
  /// The dependency-recording build exited with a non-zero status.
  #[error("recording dependencies failed with exit code {code}")]
  RecordingFailed {
    /// Exit code of the engine.
    code: i32,
  },
  /// The test build of the staged copy exited with a non-zero status.
  #[error("test build failed with exit code {code}")]
  VerificationFailed {
    /// Exit code of the engine.
    code: i32,
  },
  /// The typesetting engine could not be started at all.
  #[error("failed to launch {program}")]
  ToolLaunch {
    /// Program that was invoked.
    program: String,
    /// Underlying I/O error.
    #[source]
    source: std::io::Error,
  },
  /// The user declined to remove a pre-existing output directory.
  #[error("aborted: {} was left untouched", .path.display())]
  Aborted {
    /// Output directory that already existed.
    path: PathBuf,
  },
  /// The output directory points at the project that is being bundled.
  #[error("output directory {} is the project directory itself", .path.display())]
  OutputIsSource {
    /// Offending output directory.
    path: PathBuf,
  },
  /// A configuration file could not be read or parsed.
  #[error(transparent)]
  Config(#[from] ConfigError),
  /// Filesystem failure while preparing, copying, or cleaning up.
  #[error("{context}")]
  Io {
    /// What was being attempted.
    context: String,
    /// Underlying I/O error.
    #[source]
    source: std::io::Error,
  },
  /// Failure while copying assets into the staging directory or the archive.
  #[error("failed to build the clean copy in {}", .staging.display())]
  Copy {
    /// Staging directory being populated.
    staging: PathBuf,
    /// Underlying error chain.
    #[source]
    source: anyhow::Error,
  },
}

impl BundleError {
  /// Wrap an I/O error with a description of the failed operation.
  pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
    Self::Io {
      context: context.into(),
      source,
    }
  }

  /// Process exit code for this error.
  ///
  /// Engine failures propagate the engine's own code unchanged.
  pub fn exit_code(&self) -> i32 {
    match self {
      Self::MissingBibliography { .. } => EXIT_MISSING_BIBLIOGRAPHY,
      Self::MissingInput { .. }
      | Self::MissingDependencyFile { .. }
      | Self::OutputIsSource { .. }
      | Self::Config(_) => EXIT_MISSING_INPUT,
      Self::RecordingFailed { code } | Self::VerificationFailed { code } => *code,
      Self::ToolLaunch { .. } => EXIT_TOOL_LAUNCH,
      Self::Aborted { .. } | Self::Io { .. } | Self::Copy { .. } => EXIT_FAILURE,
    }
  }

  /// Remediation hint shown to the user alongside the error, if any.
  pub fn hint(&self) -> Option<String> {
    match self {
      Self::MissingBibliography { .. } => Some("Specify one with -b".to_string()),
      Self::MissingDependencyFile { document, .. } => Some(format!(
        "Run a full build of {} with the -recorder flag (or drop --no-record) to create it.",
        document.display()
      )),
      Self::ToolLaunch { program, .. } => {
        Some(format!("Make sure {program} is installed and on PATH, or pass --engine."))
      }
      Self::OutputIsSource { .. } => Some("Choose a different directory with -o".to_string()),
      Self::VerificationFailed { .. } => {
        Some("The archive was removed; add missing files with -i and retry.".to_string())
      }
      _ => None,
    }
  }
}
