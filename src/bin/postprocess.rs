//! The postprocess command for PDFNLT.
//!
//! Usage:
//!   postprocess [options] XHTML...
//!
//! Each input is annotated (figure references, inline math, citations,
//! positions, sentence ids) and its tables are written into the output
//! directory.

use clap::Parser;
use pdfnlt_postprocess::pipeline::{LogLevel, Pipeline, PipelineConfig, DEFAULT_OUT_DIR};
use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "postprocess", version, about = "The postprocess script for PDFNLT.")]
struct Args {
    /// Execute with batch mode.
    #[arg(short, long)]
    batch: bool,

    /// Output messages to FILE.
    #[arg(short, long, value_name = "FILE")]
    log: Option<PathBuf>,

    /// Insert positions into the xhtml.
    #[arg(short, long)]
    map: bool,

    /// Output files to DIR.
    #[arg(short, long, value_name = "DIR")]
    out: Option<PathBuf>,

    /// Show less messages.
    #[arg(short, long)]
    quiet: bool,

    /// Show more messages.
    #[arg(short, long)]
    verbose: bool,

    /// Analyzed XHTML files.
    #[arg(value_name = "XHTML", required = true)]
    xhtml: Vec<PathBuf>,
}

fn init_logger(level: LogLevel, file: Option<&PathBuf>) -> std::io::Result<()> {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level.to_level_filter());
    match file {
        Some(path) => {
            builder.target(env_logger::Target::Pipe(Box::new(File::create(path)?)));
        },
        None => {
            builder.target(env_logger::Target::Stderr);
        },
    }
    builder.init();
    Ok(())
}

/// Pipeline settings implied by the command line, except the output directory.
fn build_config(args: &Args) -> PipelineConfig {
    PipelineConfig::default()
        .with_batch(args.batch)
        .with_positions(args.map)
        .with_log_level(LogLevel::from_flags(args.quiet, args.verbose))
}

fn main() -> ExitCode {
    let args = Args::parse();

    let mut config = build_config(&args);
    if let Err(e) = init_logger(config.log_level, args.log.as_ref()) {
        eprintln!("Cannot open log file: {}", e);
        return ExitCode::FAILURE;
    }

    let out_dir = match &args.out {
        Some(dir) => dir.clone(),
        None => {
            log::info!("Using the default outdir: {}", DEFAULT_OUT_DIR);
            PathBuf::from(DEFAULT_OUT_DIR)
        },
    };
    config = config.with_out_dir(out_dir);

    match Pipeline::with_config(config).run(&args.xhtml) {
        Ok(report) => {
            log::info!(
                "Processed {} file(s), {} failed",
                report.processed.len(),
                report.failed.len()
            );
            ExitCode::SUCCESS
        },
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        },
    }
}
