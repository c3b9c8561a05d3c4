//! Bundler configuration describing the typesetting engine and file naming conventions.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// File name searched for in the project directory when no configuration is given explicitly.
pub const DEFAULT_CONFIG_FILE: &str = "tex-bundler.json";

/// Discoverable configuration describing how dependencies are recorded and verified.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BundlerConfig {
    /// Executable used for both the recording and the verification build.
    pub engine: String,
    /// Arguments placed before the document for the dependency-recording build.
    pub record_args: Vec<String>,
    /// Arguments placed before the document for the verification build.
    pub verify_args: Vec<String>,
    /// Extension of the dependency trace written next to the main document.
    pub trace_extension: String,
    /// Extension used to derive the default bibliography path.
    pub bibliography_extension: String,
    /// Marker token that starts every relevant trace record.
    pub trace_marker: String,
    /// Folder created inside a fresh temporary directory when no output directory is given.
    pub staging_dir_name: String,
}

impl Default for BundlerConfig {
    fn default() -> Self {
        Self {
            engine: "pdflatex".into(),
            record_args: vec![
                "-recorder".into(),
                "-draftmode".into(),
                "-halt-on-error".into(),
            ],
            verify_args: vec!["-halt-on-error".into(), "-interaction=nonstopmode".into()],
            trace_extension: "fls".into(),
            bibliography_extension: "bib".into(),
            trace_marker: "INPUT".into(),
            staging_dir_name: "textractor".into(),
        }
    }
}

/// Errors raised while loading an explicitly requested configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read {}", .path.display())]
    Io {
        /// Path that caused the error.
        path: PathBuf,
        /// Source I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Failed to parse the JSON configuration.
    #[error("failed to parse {}", .path.display())]
    Parse {
        /// Path that caused the error.
        path: PathBuf,
        /// Source parse error.
        #[source]
        source: serde_json::Error,
    },
}

impl BundlerConfig {
    /// Attempt to load configuration from the provided project directory.
    ///
    /// A missing or malformed file falls back to the defaults.
    pub fn discover(project_dir: &Path) -> Self {
        let candidate = project_dir.join(DEFAULT_CONFIG_FILE);
        match Self::load(&candidate) {
            Ok(config) => config,
            Err(ConfigError::Io { .. }) => Self::default(),
            Err(err) => {
                tracing::warn!(error = %err, "ignoring invalid configuration");
                Self::default()
            }
        }
    }

    /// Read configuration from a specific JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Replace the configured engine executable.
    pub fn with_engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = engine.into();
        self
    }

    /// Location of the dependency trace produced for `main_doc`.
    pub fn trace_path(&self, main_doc: &Path) -> PathBuf {
        main_doc.with_extension(&self.trace_extension)
    }

    /// Bibliography assumed when none is supplied: the main document's base name with the
    /// bibliography extension.
    pub fn default_bibliography(&self, main_doc: &Path) -> PathBuf {
        main_doc.with_extension(&self.bibliography_extension)
    }
}
