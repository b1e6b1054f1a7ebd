//! tanzif-pdf - Margin cleaner for scanned Arabic book PDFs
//!
//! CLI entry point

use anyhow::Context;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tanzif_pdf::{
    exit_codes, CliOverrides, Config, PdfPipeline, ProcessReport, ProgressCallback,
    ProgressTracker, RenderError,
};

#[derive(Parser)]
#[command(
    name = "tanzif-pdf",
    version,
    about = "Cleans scanner stains and edge artifacts from scanned Arabic book PDFs"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean one PDF or a directory of PDFs
    Clean(CleanArgs),
    /// Show environment and external tool status
    Info,
}

#[derive(clap::Args)]
struct CleanArgs {
    /// Input PDF file or directory
    input: PathBuf,

    /// Output directory (default: "output" next to the input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Config file path (default: ./tanzif.toml or the user config dir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Processing resolution
    #[arg(long, default_value_t = 200)]
    dpi: u32,

    /// Do not re-center content on edited pages
    #[arg(long)]
    no_center: bool,

    /// Disable OCR margin checks (every margin candidate is protected)
    #[arg(long)]
    no_ocr: bool,

    /// OCR languages, e.g. "ara+eng"
    #[arg(long)]
    ocr_lang: Option<String>,

    /// Worker threads for page analysis (default: core count)
    #[arg(long)]
    threads: Option<usize>,

    /// Analyze only the first N pages
    #[arg(long)]
    max_pages: Option<usize>,

    /// Skip files whose output already exists
    #[arg(long)]
    skip_existing: bool,

    /// Verbose output (repeat for debug logging)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress progress and summary output
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Clean(args) => run_clean(&args),
        Commands::Info => run_info(),
    };

    std::process::exit(match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            exit_codes::GENERAL_ERROR
        }
    });
}

// ============ Progress Callback Implementation ============

/// Page progress bar for the CLI.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new(quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            let bar = ProgressBar::new(0);
            bar.set_style(
                ProgressStyle::with_template("  {msg:<16} [{bar:40}] {pos}/{len}")
                    .expect("static template")
                    .progress_chars("=>-"),
            );
            bar
        };
        Self { bar }
    }
}

impl ProgressCallback for CliProgress {
    fn on_step_start(&self, step: &str) {
        self.bar.set_message(step.to_string());
    }

    fn on_step_progress(&self, current: usize, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(current as u64);
    }

    fn on_step_complete(&self, _step: &str, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

// ============ Clean Command ============

fn run_clean(args: &CleanArgs) -> anyhow::Result<i32> {
    init_logging(args.verbose);
    let start_time = Instant::now();

    if !args.input.exists() {
        eprintln!("Error: input path does not exist: {}", args.input.display());
        return Ok(exit_codes::INPUT_NOT_FOUND);
    }

    let pdf_files = collect_pdf_files(&args.input)?;
    if pdf_files.is_empty() {
        eprintln!("Error: no PDF files found in input path");
        return Ok(exit_codes::INPUT_NOT_FOUND);
    }

    let file_config = match &args.config {
        Some(path) => Config::load_from_path(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::load().unwrap_or_default(),
    };
    let pipeline_config = file_config.merge_with_cli(&create_cli_overrides(args));
    let pipeline = PdfPipeline::new(pipeline_config);

    let output_dir = match &args.output {
        Some(dir) => dir.clone(),
        None => default_output_dir(&args.input),
    };
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("creating output directory {}", output_dir.display()))?;

    let output_mode = if args.quiet {
        tanzif_pdf::OutputMode::Quiet
    } else {
        tanzif_pdf::OutputMode::from_verbosity(args.verbose)
    };
    let mut tracker = ProgressTracker::new(pdf_files.len(), output_mode);
    let mut ok_count = 0usize;
    let mut skip_count = 0usize;
    let mut error_count = 0usize;

    for (idx, pdf_path) in pdf_files.iter().enumerate() {
        let output_pdf = output_path_for(pdf_path, &output_dir);

        if args.skip_existing && output_pdf.exists() {
            if !args.quiet {
                println!(
                    "[{}/{}] Skipping (exists): {}",
                    idx + 1,
                    pdf_files.len(),
                    pdf_path.display()
                );
            }
            skip_count += 1;
            continue;
        }

        if !args.quiet {
            tracker.start_file(idx + 1, &pdf_path.display().to_string());
        }

        let progress = CliProgress::new(args.quiet);
        match pipeline.process(pdf_path, &output_pdf, &progress) {
            Ok(report) => {
                ok_count += 1;
                if !args.quiet {
                    print_report(&report, &output_pdf);
                }
            }
            Err(tanzif_pdf::PipelineError::Render(RenderError::InputNotFound(path))) => {
                eprintln!("Error: input not found: {}", path.display());
                error_count += 1;
            }
            Err(e) => {
                eprintln!("Error processing {}: {}", pdf_path.display(), e);
                error_count += 1;
            }
        }
    }

    if !args.quiet {
        ProgressTracker::print_summary(pdf_files.len(), ok_count, skip_count, error_count);
        println!("Total time: {:.2}s", start_time.elapsed().as_secs_f64());
    }

    Ok(if error_count > 0 {
        exit_codes::GENERAL_ERROR
    } else {
        exit_codes::SUCCESS
    })
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init();
}

/// Create CLI overrides; only values the user can express on the command
/// line are overridden, the rest stay with the config file.
fn create_cli_overrides(args: &CleanArgs) -> CliOverrides {
    const DEFAULT_DPI: u32 = 200;

    let mut overrides = CliOverrides::new();
    if args.dpi != DEFAULT_DPI {
        overrides.dpi = Some(args.dpi);
    }
    if args.no_center {
        overrides.center_content = Some(false);
    }
    if args.no_ocr {
        overrides.ocr_enabled = Some(false);
    }
    overrides.ocr_languages = args.ocr_lang.clone();
    overrides.threads = args.threads;
    overrides.max_pages = args.max_pages;
    overrides
}

/// Collect PDF files from input path (file or directory)
fn collect_pdf_files(input: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut pdf_files = Vec::new();

    if input.is_file() {
        if input.extension().is_some_and(|ext| ext == "pdf") {
            pdf_files.push(input.to_path_buf());
        }
    } else if input.is_dir() {
        for entry in std::fs::read_dir(input)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "pdf") {
                pdf_files.push(path);
            }
        }
        pdf_files.sort();
    }

    Ok(pdf_files)
}

fn default_output_dir(input: &Path) -> PathBuf {
    let base = if input.is_dir() {
        input
    } else {
        input.parent().unwrap_or(Path::new("."))
    };
    base.join("output")
}

fn output_path_for(input: &Path, output_dir: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.pdf".to_string());
    output_dir.join(format!("cleaned_{}", name))
}

fn print_report(report: &ProcessReport, output: &Path) {
    println!();
    println!("{}", "=".repeat(60));
    println!("Cleaning Report");
    println!("{}", "=".repeat(60));
    println!("  Total pages   : {}", report.total_pages);
    println!("  Edited pages  : {}", report.edited_count());
    if report.total_pages > 0 {
        let ratio = report.edited_count() as f64 / report.total_pages as f64 * 100.0;
        println!("  Edit ratio    : {:.1}%", ratio);
    }
    println!("  Elapsed       : {:.1}s", report.elapsed_seconds);

    if report.edited_pages.is_empty() {
        println!("  Edited        : none (no artifacts found)");
    } else {
        let mut listed: Vec<String> = report
            .edited_pages
            .iter()
            .take(20)
            .map(|p| p.to_string())
            .collect();
        if report.edited_pages.len() > 20 {
            listed.push(format!("... (+{} more)", report.edited_pages.len() - 20));
        }
        println!("  Edited        : {}", listed.join(", "));
    }

    println!("  Output        : {}", output.display());
    println!("{}", "=".repeat(60));
}

// ============ Info Command ============

fn run_info() -> anyhow::Result<i32> {
    println!("tanzif-pdf v{}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("System Information:");
    println!("  Platform: {}", std::env::consts::OS);
    println!("  Arch: {}", std::env::consts::ARCH);
    println!("  CPUs: {}", num_cpus::get());

    println!();
    println!("PDF Rasterization:");
    check_tool_with_version("pdftoppm", "Poppler", &["-v"]);

    println!();
    println!("OCR:");
    check_tool_with_version("tesseract", "Tesseract", &["--version"]);

    println!();
    println!("Config File Locations:");
    println!("  Local: ./tanzif.toml");
    if let Some(path) = Config::user_config_path() {
        println!("  User:  {}", path.display());
    }

    Ok(exit_codes::SUCCESS)
}

fn check_tool_with_version(cmd: &str, name: &str, version_args: &[&str]) {
    match which::which(cmd) {
        Ok(path) => {
            if let Ok(output) = std::process::Command::new(&path).args(version_args).output() {
                // Poppler prints its version banner on stderr.
                let text = if output.stdout.is_empty() {
                    String::from_utf8_lossy(&output.stderr).into_owned()
                } else {
                    String::from_utf8_lossy(&output.stdout).into_owned()
                };
                let first_line = text.lines().next().unwrap_or("");
                if !first_line.is_empty() && first_line.len() < 80 {
                    println!("  {}: {} ({})", name, first_line.trim(), path.display());
                } else {
                    println!("  {}: {} (found)", name, path.display());
                }
            } else {
                println!("  {}: {} (found)", name, path.display());
            }
        }
        Err(_) => println!("  {}: Not found", name),
    }
}
