//! uniqmove - Command-line interface for the unique file transfer engine.
//!
//! Copies every distinct file content under a source tree into a flat
//! destination directory once, reporting duplicates and per-file failures.

use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use engine::{
    spawn_transfer, DigestAlgorithm, ErrorKind, OutcomeEvent, RunConfig, RunEvent, RunSummary,
    DEFAULT_CHUNK_SIZE,
};

/// uniqmove - copy unique files, skip duplicate content
#[derive(Parser, Debug)]
#[command(name = "uniqmove")]
#[command(version)]
#[command(about = "Copy each distinct file content from a tree into one directory")]
struct Args {
    /// Source directory (scanned recursively)
    #[arg(long, value_name = "PATH")]
    src: PathBuf,

    /// Destination directory (must exist)
    #[arg(long, value_name = "PATH")]
    dst: PathBuf,

    /// Digest algorithm: md5 or blake3
    #[arg(long, value_name = "ALGORITHM", default_value = "md5")]
    hash: String,

    /// Read buffer size in bytes used while hashing
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Re-hash each copy and compare it against the source
    #[arg(long)]
    verify: bool,

    /// Do not carry source modification times over to copies
    #[arg(long)]
    no_preserve_mtime: bool,

    /// Print one line per file
    #[arg(long)]
    verbose: bool,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    json: bool,
}

/// Renders run events to stderr
struct CliProgress {
    verbose: bool,
    start_time: Instant,
    failures: Vec<(PathBuf, ErrorKind, String)>,
}

impl CliProgress {
    fn new(verbose: bool) -> Self {
        CliProgress {
            verbose,
            start_time: Instant::now(),
            failures: Vec::new(),
        }
    }

    fn format_bytes(bytes: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = bytes as f64;
        let mut unit_idx = 0;

        while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
            size /= 1024.0;
            unit_idx += 1;
        }

        format!("{:.2} {}", size, UNITS[unit_idx])
    }

    fn format_duration(elapsed: std::time::Duration) -> String {
        let secs = elapsed.as_secs();
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        let secs = secs % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, mins, secs)
        } else if mins > 0 {
            format!("{}m {}s", mins, secs)
        } else {
            format!("{}s", secs)
        }
    }

    fn handle(&mut self, event: &RunEvent) {
        match event {
            RunEvent::Started { source, destination, .. } => {
                eprintln!("Analyzing files...");
                eprintln!("  Source: {}", source.display());
                eprintln!("  Destination: {}", destination.display());
                eprintln!();
            }
            RunEvent::Outcome(outcome) => self.on_outcome(outcome),
            RunEvent::Summary(summary) => self.on_summary(summary),
        }
    }

    fn on_outcome(&mut self, outcome: &OutcomeEvent) {
        if self.verbose {
            let status = match outcome {
                OutcomeEvent::Copied { .. } => "Copied",
                OutcomeEvent::Duplicate { .. } => "Duplicate",
                OutcomeEvent::Failed { .. } => "Failed",
            };
            eprintln!("{:>9}: {}", status, outcome.path().display());
        }

        if let OutcomeEvent::Failed { path, kind, message } = outcome {
            self.failures.push((path.clone(), *kind, message.clone()));
        }
    }

    fn on_summary(&self, summary: &RunSummary) {
        eprintln!();
        eprintln!("Total files found: {}", summary.total_files);
        eprintln!("Duplicates: {}", summary.duplicate_count);
        eprintln!("Unique files copied: {}", summary.transferred_count);
        eprintln!("Errors: {}", summary.error_count);
        eprintln!("Bytes copied: {}", Self::format_bytes(summary.bytes_transferred));
        eprintln!("Elapsed: {}", Self::format_duration(self.start_time.elapsed()));

        if !self.failures.is_empty() {
            eprintln!();
            eprintln!("Failed files:");
            for (path, kind, message) in &self.failures {
                eprintln!("  [{}] {}: {}", kind, path.display(), message);
            }
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // A subscriber may already be installed (tests); keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Parse arguments, run, and map the outcome to an exit code
fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    let exit_code = match run_cli(&args) {
        Ok(summary) if summary.error_count == 0 => 0,
        Ok(summary) => {
            eprintln!("Error: {} file(s) could not be processed", summary.error_count);
            1
        }
        Err(msg) => {
            eprintln!("Error: {}", msg);
            2
        }
    };

    std::process::exit(exit_code);
}

/// Main CLI logic - separated for testability
fn run_cli(args: &Args) -> Result<RunSummary, String> {
    let algorithm: DigestAlgorithm = args.hash.parse()?;

    let config = RunConfig::new(&args.src, &args.dst)
        .with_algorithm(algorithm)
        .with_chunk_size(args.chunk_size)
        .with_verify_after_copy(args.verify)
        .with_preserve_mtime(!args.no_preserve_mtime);

    config.validate().map_err(|e| e.to_string())?;

    let handle = spawn_transfer(config);
    let mut progress = CliProgress::new(args.verbose);
    for event in handle.events().iter() {
        progress.handle(&event);
    }

    let summary = handle
        .join()
        .map_err(|e| format!("Run failed: {}", e))?;

    if args.json {
        let json = serde_json::to_string_pretty(&summary)
            .map_err(|e| format!("Failed to serialize summary: {}", e))?;
        println!("{}", json);
    }

    Ok(summary)
}
