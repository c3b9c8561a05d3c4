//! tex-bundler CLI - extract the build-essential files of a LaTeX project and zip them.
//!
//! Usage: tex-bundler [OPTIONS] <ZIP_FILE>

use std::env;
use std::error::Error;
use std::path::{Path, PathBuf};

use clap::Parser;
use dialoguer::Confirm;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use tex_bundler::error::BundleError;
use tex_bundler::{BundleRequest, Bundler, BundlerConfig, CommandEngine};

/// Extract build-essential files from a LaTeX project and zip them.
#[derive(Parser, Debug)]
#[command(name = "tex-bundler", version, about, long_about = None)]
struct Cli {
  /// Zip archive to write. Removed again if the test build fails.
  zip_file: PathBuf,

  /// Main LaTeX document.
  #[arg(short, long, default_value = "main.tex")]
  main_doc: PathBuf,

  /// Output directory for the clean copy [default: fresh temporary directory].
  #[arg(short, long)]
  output_dir: Option<PathBuf>,

  /// Bib file. Defaults to the main document's name with a .bib extension.
  #[arg(short, long)]
  bib_file: Option<PathBuf>,

  /// Additional files to include (repeatable).
  #[arg(short, long = "include")]
  include: Vec<PathBuf>,

  /// Remove an existing output directory without asking.
  #[arg(short, long)]
  yes: bool,

  /// Reuse the existing dependency trace instead of running a recording build.
  #[arg(long)]
  no_record: bool,

  /// Skip the test build of the clean copy.
  #[arg(long)]
  no_verify: bool,

  /// Typesetting engine executable [default: pdflatex].
  #[arg(long)]
  engine: Option<String>,

  /// Configuration file [default: tex-bundler.json in the working directory].
  #[arg(long)]
  config: Option<PathBuf>,

  /// Print a JSON summary of the run.
  #[arg(long)]
  json: bool,

  /// Verbosity level (-v, -vv).
  #[arg(short, long, action = clap::ArgAction::Count)]
  verbose: u8,
}

fn main() {
  let cli = Cli::parse();
  init_tracing(cli.verbose);
  let code = match run(&cli) {
    Ok(()) => 0,
    Err(err) => {
      report(&err);
      err.exit_code()
    }
  };
  std::process::exit(code);
}

/// Initialize tracing on stderr; stdout carries the asset list.
fn init_tracing(verbose: u8) {
  let filter = match verbose {
    0 => "tex_bundler=warn",
    1 => "tex_bundler=info",
    _ => "tex_bundler=debug",
  };
  let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

  tracing_subscriber::fmt()
    .with_env_filter(env_filter)
    .with_target(false)
    .with_writer(std::io::stderr)
    .init();
}

fn run(cli: &Cli) -> Result<(), BundleError> {
  let project_dir = env::current_dir()
    .map_err(|source| BundleError::io("failed to determine working directory", source))?;

  let mut config = match &cli.config {
    Some(path) => BundlerConfig::load(path)?,
    None => BundlerConfig::discover(&project_dir),
  };
  if let Some(engine) = &cli.engine {
    config = config.with_engine(engine.clone());
  }
  let engine = CommandEngine::from_config(&config);

  // Held until the run ends so the default output directory is cleaned up afterwards.
  let mut scratch = None;
  let output_dir = match &cli.output_dir {
    Some(dir) => dir.clone(),
    None => {
      let temp = tempfile::Builder::new()
        .prefix("tex-bundler")
        .tempdir()
        .map_err(|source| BundleError::io("failed to create temporary directory", source))?;
      let dir = temp.path().join(&config.staging_dir_name);
      scratch = Some(temp);
      dir
    }
  };

  let mut request = BundleRequest::new(&cli.main_doc, output_dir, &cli.zip_file);
  request.bib_file = cli.bib_file.clone();
  request.includes = cli.include.clone();
  request.record = !cli.no_record;
  request.verify = !cli.no_verify;

  let bundler = Bundler::new(&config, &engine, &project_dir);
  let plan = bundler.plan(&request)?;
  for record in plan.assets.records() {
    println!("{}", record.path.display());
  }

  let summary = bundler.package(&plan, &request, |dir| cli.yes || confirm_removal(dir))?;
  if summary.verified {
    println!("=== SUCCESS: Test build succeeded! ===");
  }
  if cli.json {
    match serde_json::to_string_pretty(&summary) {
      Ok(json) => println!("{json}"),
      Err(err) => warn!(error = %err, "failed to serialize summary"),
    }
  }

  drop(scratch);
  Ok(())
}

fn confirm_removal(dir: &Path) -> bool {
  Confirm::new()
    .with_prompt(format!(
      "This will remove all content in {}. Proceed?",
      dir.display()
    ))
    .default(false)
    .interact()
    .unwrap_or_else(|err| {
      warn!(error = %err, "confirmation prompt failed");
      false
    })
}

fn report(err: &BundleError) {
  match err {
    BundleError::VerificationFailed { .. } => eprintln!("=== FAILURE: Test build failed! ==="),
    BundleError::RecordingFailed { .. } => {
      eprintln!("=== FAILURE: Recording dependencies failed! ===")
    }
    _ => {}
  }

  eprintln!("error: {err}");
  let mut source = err.source();
  while let Some(cause) = source {
    eprintln!("  caused by: {cause}");
    source = cause.source();
  }
  if let Some(hint) = err.hint() {
    eprintln!("hint: {hint}");
  }
}
