mod classfile;
mod config;
mod descriptor;
mod exclusions;
mod ir;
mod opcodes;
mod report;
mod rules;
mod scan;
#[cfg(test)]
mod testutil;
mod walk;

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// CLI arguments for classlint execution.
#[derive(Parser, Debug)]
#[command(
    name = "classlint",
    about = "Rule-driven linter that flags forbidden member, opcode, and type uses in JVM class files and JAR archives.",
    version
)]
struct Cli {
    /// Rule configuration file.
    #[arg(long, short = 'c', value_name = "PATH")]
    config: PathBuf,
    /// Class file, directory tree, or JAR archive to scan.
    #[arg(long, short = 't', value_name = "PATH")]
    target: PathBuf,
    /// Report destination; defaults to stdout.
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
    /// Emit the report as JSON instead of text.
    #[arg(long)]
    json: bool,
    #[arg(long)]
    quiet: bool,
    #[arg(long)]
    timing: bool,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.quiet);
    run(cli)
}

fn run(cli: Cli) -> Result<ExitCode> {
    if !cli.target.exists() {
        anyhow::bail!("target not found: {}", cli.target.display());
    }

    let started_at = Instant::now();
    let rules = config::load(&cli.config)?;
    let inputs = walk::collect_inputs(&cli.target)?;
    let output = scan::scan_inputs(&inputs, &rules)?;
    let sorted = output.report.into_sorted();

    let mut writer = output_writer(cli.output.as_deref())?;
    if cli.json {
        serde_json::to_writer_pretty(&mut writer, &sorted)
            .context("failed to serialize report")?;
        writer.write_all(b"\n").context("failed to write report")?;
    } else {
        report::render_text(&sorted, &mut writer)?;
    }

    if cli.timing && !cli.quiet {
        eprintln!(
            "timing: total_ms={} classes={} skipped={}",
            started_at.elapsed().as_millis(),
            output.scanned,
            output.skipped
        );
    }

    // Findings exit distinctly from both clean runs and crashes.
    if sorted.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(2))
    }
}

fn init_logging(quiet: bool) {
    let level = if quiet { Level::ERROR } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn output_writer(output: Option<&Path>) -> Result<Box<dyn Write>> {
    match output {
        Some(path) if path == Path::new("-") => Ok(Box::new(io::stdout())),
        Some(path) => Ok(Box::new(
            File::create(path).with_context(|| format!("failed to open {}", path.display()))?,
        )),
        None => Ok(Box::new(io::stdout())),
    }
}
