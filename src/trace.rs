//! Parser for the dependency trace (`.fls`) written by a recording build.
//!
//! Only records of the form `<MARKER> <path>` are of interest. Everything else in the trace,
//! such as `PWD` and `OUTPUT` records, is skipped without complaint.

use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tracing::warn;

use crate::error::{BundleError, BundleResult};

/// Marker used by TeX engines for files read during a `-recorder` run.
pub const DEFAULT_MARKER: &str = "INPUT";

/// One input record of the dependency trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceEntry<'a> {
  /// One-based line number inside the trace.
  pub line: usize,
  /// Raw path as written by the engine, absolute or relative.
  pub path: &'a str,
}

/// Recogniser for trace records starting with a fixed marker token.
#[derive(Debug, Clone)]
pub struct TraceParser {
  pattern: Regex,
}

impl TraceParser {
  /// Build a parser for records beginning with `marker` followed by whitespace.
  pub fn new(marker: &str) -> Self {
    if marker == DEFAULT_MARKER {
      return default_parser().clone();
    }
    Self {
      pattern: record_pattern(marker),
    }
  }

  /// Lazily extract candidate paths from the trace text, in file order.
  pub fn entries<'a>(&'a self, text: &'a str) -> impl Iterator<Item = TraceEntry<'a>> + 'a {
    text.lines().enumerate().filter_map(move |(index, line)| {
      self
        .pattern
        .captures(line)
        .and_then(|caps| caps.name("path"))
        .map(|path| TraceEntry {
          line: index + 1,
          path: path.as_str(),
        })
    })
  }
}

impl Default for TraceParser {
  fn default() -> Self {
    default_parser().clone()
  }
}

fn default_parser() -> &'static TraceParser {
  static PARSER: OnceLock<TraceParser> = OnceLock::new();
  PARSER.get_or_init(|| TraceParser {
    pattern: record_pattern(DEFAULT_MARKER),
  })
}

fn record_pattern(marker: &str) -> Regex {
  Regex::new(&format!(r"^{}\s+(?P<path>\S.*)$", regex::escape(marker)))
    .expect("invalid trace record regex")
}

/// Read the trace file belonging to `document`.
///
/// A missing or unreadable trace means the recording build has to be (re-)run. Bytes that are
/// not valid UTF-8 are replaced rather than rejected; engines write paths in the file system's
/// encoding.
pub fn read_trace(path: &Path, document: &Path) -> BundleResult<String> {
  let bytes = fs::read(path).map_err(|source| BundleError::MissingDependencyFile {
    path: path.to_path_buf(),
    document: document.to_path_buf(),
    source,
  })?;
  match String::from_utf8(bytes) {
    Ok(text) => Ok(text),
    Err(err) => {
      warn!(trace = %path.display(), "dependency trace is not valid UTF-8");
      Ok(String::from_utf8_lossy(err.as_bytes()).into_owned())
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::tempdir;

  const SAMPLE: &str = "PWD /home/user/paper\n\
INPUT /usr/share/texlive/texmf-dist/web2c/texmf.cnf\n\
INPUT main.tex\n\
OUTPUT main.log\n\
INPUT ./chapters/intro.tex\n\
INPUT /usr/share/texmf/foo.sty\n\
INPUTS notes.tex\n";

  fn paths(parser: &TraceParser, text: &str) -> Vec<String> {
    parser
      .entries(text)
      .map(|entry| entry.path.to_string())
      .collect()
  }

  #[test]
  fn extracts_input_records_in_order() {
    let parser = TraceParser::default();
    assert_eq!(paths(&parser, SAMPLE), vec![
      "/usr/share/texlive/texmf-dist/web2c/texmf.cnf",
      "main.tex",
      "./chapters/intro.tex",
      "/usr/share/texmf/foo.sty",
    ]);
  }

  #[test]
  fn reports_one_based_line_numbers() {
    let parser = TraceParser::default();
    let lines: Vec<_> = parser.entries(SAMPLE).map(|entry| entry.line).collect();
    assert_eq!(lines, vec![2, 3, 5, 6]);
  }

  #[test]
  fn keeps_spaces_inside_paths_and_skips_empty_records() {
    let parser = TraceParser::default();
    let text = "INPUT figures/my plot.pdf\r\nINPUT   \nINPUT\n  INPUT indented.tex\n";
    assert_eq!(paths(&parser, text), vec!["figures/my plot.pdf"]);
  }

  #[test]
  fn supports_custom_markers() {
    let parser = TraceParser::new("READ+");
    assert_eq!(paths(&parser, "READ+ a.tex\nINPUT b.tex\n"), vec!["a.tex"]);
  }

  #[test]
  fn missing_trace_is_reported_as_missing_dependency_file() {
    let dir = tempdir().unwrap();
    let err = read_trace(&dir.path().join("main.fls"), Path::new("main.tex")).unwrap_err();
    assert!(matches!(err, BundleError::MissingDependencyFile { .. }));
    assert_eq!(err.exit_code(), 2);
  }

  #[test]
  fn non_utf8_trace_is_read_lossily() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("main.fls");
    fs::write(&path, b"INPUT caf\xe9.tex\nINPUT main.tex\n").unwrap();

    let text = read_trace(&path, Path::new("main.tex")).unwrap();
    assert_eq!(paths(&TraceParser::default(), &text), vec![
      "caf\u{FFFD}.tex",
      "main.tex",
    ]);
  }
}
