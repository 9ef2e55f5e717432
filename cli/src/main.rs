//! rosterpdf CLI - employee roster PDF generator

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use rosterpdf::{
    AssetStorage, BatchSummary, DatasetLocator, Job, JobReport, QrProvisioner, ReportOptions,
    ReportSink, Rosterpdf,
};

/// Job submitted when no names are given.
const DEFAULT_JOB: &str = "zaposleni-0";

#[derive(Parser)]
#[command(name = "rosterpdf")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Generate employee roster PDFs concurrently", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate one PDF per job name
    #[command(alias = "gen")]
    Generate {
        /// Job names (defaults to zaposleni-0)
        #[arg(value_name = "NAMES")]
        names: Vec<String>,

        /// Read additional job names from a file, one per line
        #[arg(long, value_name = "FILE")]
        jobs_file: Option<PathBuf>,

        /// Number of worker threads
        #[arg(short, long, env = "ROSTERPDF_WORKERS")]
        workers: Option<usize>,

        /// Output directory
        #[arg(short, long, value_name = "DIR", env = "ROSTERPDF_OUTPUT")]
        output: Option<PathBuf>,

        /// Directory holding <job>.json datasets
        #[arg(long, value_name = "DIR", conflicts_with = "dataset")]
        data_dir: Option<PathBuf>,

        /// Single dataset shared by every job
        #[arg(long, value_name = "FILE")]
        dataset: Option<PathBuf>,

        /// Logo image placed in the page header
        #[arg(long, value_name = "FILE", env = "ROSTERPDF_LOGO")]
        logo: Option<PathBuf>,

        /// Text encoded in the header QR code
        #[arg(long, value_name = "TEXT")]
        qr_payload: Option<String>,

        /// Write the batch summary as JSON
        #[arg(long, value_name = "FILE")]
        summary: Option<PathBuf>,
    },

    /// Write a QR code PNG
    Qr {
        /// Text to encode
        #[arg(value_name = "PAYLOAD")]
        payload: String,

        /// Output PNG file
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Image side in pixels
        #[arg(long, default_value = "256")]
        size: u32,
    },

    /// Show version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate {
            names,
            jobs_file,
            workers,
            output,
            data_dir,
            dataset,
            logo,
            qr_payload,
            summary,
        } => {
            let options = build_options(workers, output, data_dir, dataset, logo, qr_payload);
            cmd_generate(names, jobs_file.as_deref(), options, summary.as_deref())
        }
        Commands::Qr {
            payload,
            output,
            size,
        } => cmd_qr(&payload, &output, size),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn build_options(
    workers: Option<usize>,
    output: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    dataset: Option<PathBuf>,
    logo: Option<PathBuf>,
    qr_payload: Option<String>,
) -> ReportOptions {
    let mut options = ReportOptions::new();

    if let Some(workers) = workers {
        options = options.with_workers(workers);
    }
    if let Some(dir) = output {
        options = options.with_output_dir(dir);
    }
    if let Some(path) = dataset {
        options = options.with_dataset(DatasetLocator::shared(path));
    } else if let Some(dir) = data_dir {
        options = options.with_dataset(DatasetLocator::per_job(dir));
    }
    if let Some(path) = logo {
        options = options.with_logo(path);
    }
    if let Some(payload) = qr_payload {
        options = options.with_qr_payload(payload);
    }

    options
}

/// Parse a jobs file: one name per line, blank lines and `#` comments ignored.
fn parse_jobs(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}

fn collect_names(
    mut names: Vec<String>,
    jobs_file: Option<&Path>,
) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    if let Some(path) = jobs_file {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Cannot read jobs file {}: {}", path.display(), e))?;
        names.extend(parse_jobs(&contents));
    }

    if names.is_empty() {
        names.push(DEFAULT_JOB.to_string());
    }

    Ok(names)
}

/// Number of distinct names; repeats are skipped by the dispatcher.
fn unique_count(names: &[String]) -> usize {
    names.iter().collect::<HashSet<_>>().len()
}

/// Progress bar that doubles as the dispatcher's report sink.
struct ProgressSink {
    pb: ProgressBar,
}

impl ProgressSink {
    fn new(total: usize) -> Self {
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );
        Self { pb }
    }

    fn finish(&self) {
        self.pb.finish_and_clear();
    }
}

impl ReportSink for ProgressSink {
    fn job_started(&self, job: &Job, _worker: usize) {
        self.pb.set_message(job.name().to_string());
    }

    fn job_finished(&self, report: &JobReport) {
        let worker = report
            .worker
            .map(|w| format!("worker {}", w))
            .unwrap_or_else(|| "rejected".to_string());

        let line = match (report.output(), report.error()) {
            (Some(output), _) => {
                let mut line = format!(
                    "{} {} {} ({} rows, {} ms, {})",
                    "✓".green(),
                    report.job.bold(),
                    output.path.display(),
                    output.rows,
                    report.elapsed.as_millis(),
                    worker.dimmed()
                );
                if !output.asset_embedded {
                    line.push_str(&format!(" {}", "no QR".yellow()));
                }
                if output.overflow_rows > 0 {
                    line.push_str(&format!(
                        " {}",
                        format!("{} rows past page end", output.overflow_rows).yellow()
                    ));
                }
                line
            }
            (None, Some(error)) => format!(
                "{} {} {} ({})",
                "✗".red(),
                report.job.bold(),
                error.to_string().red(),
                worker.dimmed()
            ),
            (None, None) => format!("{} {}", "?".yellow(), report.job),
        };

        self.pb.println(line);
        self.pb.inc(1);
    }
}

fn cmd_generate(
    names: Vec<String>,
    jobs_file: Option<&Path>,
    options: ReportOptions,
    summary_path: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let names = collect_names(names, jobs_file)?;
    let started = Instant::now();

    let unique = unique_count(&names);

    log::info!(
        "generating {} report(s) with {} worker(s)",
        unique,
        options.workers
    );

    let sink = ProgressSink::new(unique);
    let summary = Rosterpdf::with_options(options).run_with_sink(names, &sink)?;
    sink.finish();

    print_summary(&summary, started);

    if let Some(path) = summary_path {
        let json = serde_json::to_string_pretty(&summary)?;
        fs::write(path, json)?;
        println!("{} {}", "Summary saved to".green(), path.display());
    }

    Ok(())
}

fn print_summary(summary: &BatchSummary, started: Instant) {
    println!();
    println!("{}", "Batch Summary".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "Attempted".bold(), summary.attempted);
    println!("{}: {}", "Succeeded".bold(), summary.succeeded.to_string().green());
    if summary.failed > 0 {
        println!("{}: {}", "Failed".bold(), summary.failed.to_string().red());
    } else {
        println!("{}: {}", "Failed".bold(), summary.failed);
    }
    if !summary.skipped_duplicates.is_empty() {
        println!(
            "{}: {}",
            "Skipped duplicates".bold(),
            summary.skipped_duplicates.join(", ").yellow()
        );
    }
    println!(
        "{}: {:.2}s",
        "Elapsed".bold(),
        started.elapsed().as_secs_f64()
    );

    for report in summary.failures() {
        if let (Some(stage), Some(error)) = (report.stage(), report.error()) {
            println!(
                "  {} {} [{}] {}",
                "└─".dimmed(),
                report.job,
                stage,
                error
            );
        }
    }
}

fn cmd_qr(payload: &str, output: &Path, size: u32) -> Result<(), Box<dyn std::error::Error>> {
    let asset = QrProvisioner::new()
        .with_storage(AssetStorage::Memory)
        .with_size(size)
        .generate(payload)?;
    let png = asset.png_bytes()?;
    asset.release()?;

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(output, png)?;

    println!(
        "{} {} ({}x{} px)",
        "Saved to".green(),
        output.display(),
        size,
        size
    );
    Ok(())
}

fn cmd_version() {
    println!("{} {}", "rosterpdf".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Employee roster PDF generator");
    println!();
    println!("Repository: {}", "https://github.com/iyulab/rosterpdf".dimmed());
    println!("License: MIT");
}
