//! CLI binary for booklet2json.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ExtractOptions`, runs the batch and prints a summary.

use anyhow::{Context, Result};
use booklet2json::{
    plan_jobs, run_batch, BatchReport, BookOutcome, Catalogue, DataLayout, ElementStrategy,
    ExtractOptions, ExtractionProgressCallback, MergePolicy, OutputMode, PageWarning,
    PdfiumBackend, ProgressCallback,
};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar reused for every book, with a log
/// line per finished or failed book printed above it.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Total books in the batch, for the `[i/n]` prefix.
    books: AtomicUsize,
    /// Books started so far.
    started: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Binding pdfium…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            books: AtomicUsize::new(0),
            started: AtomicUsize::new(0),
        })
    }

    /// Switch to the page-counting style for a book of `total` pages.
    fn activate_bar(&self, book: u32, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        let i = self.started.fetch_add(1, Ordering::SeqCst) + 1;
        let n = self.books.load(Ordering::SeqCst);
        self.bar.set_style(progress_style);
        self.bar.set_length(total as u64);
        self.bar.set_position(0);
        self.bar.set_prefix(format!("[{i}/{n}] Book {book}"));
        self.bar.set_message("");
        self.bar.reset_elapsed();
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_books: usize) {
        self.books.store(total_books, Ordering::SeqCst);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Extracting {total_books} book(s)…"))
        ));
    }

    fn on_book_start(&self, book: u32, total_pages: usize) {
        self.activate_bar(book, total_pages);
    }

    fn on_page_complete(&self, _book: u32, page: u32, _done: usize, _total: usize) {
        self.bar.set_message(format!("page {page}"));
        self.bar.inc(1);
    }

    fn on_page_warning(&self, _book: u32, warning: &PageWarning) {
        self.bar
            .println(format!("    {} {}", yellow("⚠"), dim(&warning.to_string())));
    }

    fn on_book_complete(&self, book: u32, pages: usize) {
        self.bar.println(format!(
            "  {} Book {:<5} {}",
            green("✓"),
            book,
            dim(&format!("{pages} pages"))
        ));
    }

    fn on_book_failed(&self, book: u32, error: &str) {
        let msg = truncate(error, 100);
        self.bar
            .println(format!("  {} Book {:<5} {}", red("✗"), book, red(&msg)));
    }

    fn on_batch_complete(&self, _succeeded: usize, _failed: usize) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract books 1 and 3 through 6
  booklet2json 1,3-6

  # Re-extract pages 2 and 4 of book 7, keep the other stored pages
  booklet2json 7 2,4 --merge-policy splice-subset

  # Print JSON lines instead of writing data/{book}.json
  booklet2json 1-10 --stdout --no-images > books.jsonl

  # First run with the page-classifying grouping
  booklet2json 12 --elements heuristic

LAYOUT (relative to --root):
  downloads/{book}.pdf                 source booklet
  data/{book}.json                     extracted pages and elements
  data/images/{book}/page_{n}.png      rendered pages
  data/images/{book}/title.png         page 1 at --title-scale
  data/images/{book}/title_small.png   page 1 at --title-small-scale
  data/index.json                      catalogue (read only, for titles)

EXIT STATUS:
  0  every book succeeded
  1  at least one book failed, or pdfium could not be loaded
  2  invalid book or page selection

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH   Directory containing libpdfium
  RUST_LOG          Override the log filter
"#;

/// Extract PDF booklets into per-book JSON.
#[derive(Parser, Debug)]
#[command(
    name = "booklet2json",
    version,
    about = "Extract text and page images from PDF booklets into editable JSON",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Books to extract: 5, 3-6, or 1,3-6,9.
    #[arg(env = "BOOKLET2JSON_BOOKS")]
    books: String,

    /// Restrict extraction to these pages (same syntax). Default: all pages.
    #[arg(env = "BOOKLET2JSON_PAGES")]
    pages: Option<String>,

    /// Print one JSON line per book instead of writing data/{book}.json.
    #[arg(long, env = "BOOKLET2JSON_STDOUT")]
    stdout: bool,

    /// Render scale for page images (1.0 = 72 DPI).
    #[arg(long, env = "BOOKLET2JSON_SCALE", default_value_t = 2.0)]
    scale: f32,

    /// Render scale for title.png.
    #[arg(long, env = "BOOKLET2JSON_TITLE_SCALE", default_value_t = 4.0)]
    title_scale: f32,

    /// Render scale for title_small.png.
    #[arg(long, env = "BOOKLET2JSON_TITLE_SMALL_SCALE", default_value_t = 1.5)]
    title_small_scale: f32,

    /// Skip page and title images.
    #[arg(long, env = "BOOKLET2JSON_NO_IMAGES")]
    no_images: bool,

    /// Project root containing downloads/ and data/.
    #[arg(long, env = "BOOKLET2JSON_ROOT", default_value = ".")]
    root: PathBuf,

    /// How fresh pages combine with an existing data/{book}.json.
    #[arg(long, env = "BOOKLET2JSON_MERGE_POLICY", value_enum, default_value = "replace-all")]
    merge_policy: MergePolicyArg,

    /// How elements are generated on a first run.
    #[arg(long, env = "BOOKLET2JSON_ELEMENTS", value_enum, default_value = "contiguous")]
    elements: ElementsArg,

    /// Keep a trailing page-number line in page text.
    #[arg(long, env = "BOOKLET2JSON_KEEP_PAGE_NUMBERS")]
    keep_page_numbers: bool,

    /// Regenerate elements even when stored output has them (discards edits).
    #[arg(long, env = "BOOKLET2JSON_RESET_ELEMENTS")]
    reset_elements: bool,

    /// Disable progress bar.
    #[arg(long, env = "BOOKLET2JSON_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "BOOKLET2JSON_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "BOOKLET2JSON_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum MergePolicyArg {
    ReplaceAll,
    SpliceSubset,
}

impl From<MergePolicyArg> for MergePolicy {
    fn from(v: MergePolicyArg) -> Self {
        match v {
            MergePolicyArg::ReplaceAll => MergePolicy::ReplaceAll,
            MergePolicyArg::SpliceSubset => MergePolicy::SpliceSubset,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum ElementsArg {
    Contiguous,
    Heuristic,
}

impl From<ElementsArg> for ElementStrategy {
    fn from(v: ElementsArg) -> Self {
        match v {
            ElementsArg::Contiguous => ElementStrategy::Contiguous,
            ElementsArg::Heuristic => ElementStrategy::Heuristic,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", red("error:"), e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    // ── Logging setup ────────────────────────────────────────────────────
    // INFO-level library logs are suppressed while the progress bar is
    // active; the bar already reports per-book progress.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Selection ────────────────────────────────────────────────────────
    let jobs = match plan_jobs(&cli.books, cli.pages.as_deref()) {
        Ok(jobs) => jobs,
        Err(e) => {
            eprintln!("{} {}", red("error:"), e);
            return Ok(ExitCode::from(2));
        }
    };

    // ── Build options ────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new();
        Some(cb as Arc<dyn ExtractionProgressCallback>)
    } else {
        None
    };
    let options = build_options(&cli, progress_cb.clone())?;
    let layout = DataLayout::new(cli.root.clone());

    // ── Run batch ────────────────────────────────────────────────────────
    let backend = match PdfiumBackend::bind() {
        Ok(backend) => backend,
        Err(e) => {
            if let Some(cb) = &progress_cb {
                cb.on_batch_complete(0, 0);
            }
            return Err(anyhow::Error::new(e).context("Cannot start extraction"));
        }
    };

    let stdout = io::stdout();
    let mut sink = stdout.lock();
    let report = run_batch(&backend, &jobs, &options, &layout, &mut sink);

    // ── Summary ──────────────────────────────────────────────────────────
    let catalogue = match Catalogue::load(&layout.index_path()) {
        Ok(c) => c,
        Err(e) => {
            warn!("{}", e);
            None
        }
    };
    print_summary(&report, catalogue.as_ref(), cli.quiet);

    Ok(if report.has_failures() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Map CLI args to `ExtractOptions`.
fn build_options(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExtractOptions> {
    let output_mode = if cli.stdout {
        OutputMode::Stdout
    } else {
        OutputMode::File
    };

    let mut builder = ExtractOptions::builder()
        .scale(cli.scale)
        .title_scale(cli.title_scale)
        .title_small_scale(cli.title_small_scale)
        .render_images(!cli.no_images)
        .output_mode(output_mode)
        .merge_policy(cli.merge_policy.clone().into())
        .element_strategy(cli.elements.clone().into())
        .strip_page_numbers(!cli.keep_page_numbers)
        .reset_elements(cli.reset_elements);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Per-book result lines on stderr. With `quiet`, only failures.
fn print_summary(report: &BatchReport, catalogue: Option<&Catalogue>, quiet: bool) {
    let label = |book: u32| match catalogue.and_then(|c| c.title_for(book)) {
        Some(title) => format!("Book {book} «{title}»"),
        None => format!("Book {book}"),
    };

    for outcome in &report.outcomes {
        match outcome {
            BookOutcome::Succeeded {
                book,
                pages,
                elements,
                elements_preserved,
                output,
                warnings,
            } => {
                if quiet {
                    continue;
                }
                let kept = if *elements_preserved { ", kept" } else { "" };
                let dest = output
                    .as_ref()
                    .map(|p| format!("  →  {}", bold(&p.display().to_string())))
                    .unwrap_or_default();
                eprintln!(
                    "{} {}  {} pages  {} elements{}{}",
                    if warnings.is_empty() {
                        green("✔")
                    } else {
                        yellow("⚠")
                    },
                    label(*book),
                    pages,
                    elements,
                    dim(kept),
                    dest
                );
                for w in warnings {
                    eprintln!("    {} {}", yellow("⚠"), dim(&w.to_string()));
                }
            }
            BookOutcome::Failed { book, error } => {
                eprintln!("{} {}  {}", red("✘"), label(*book), red(error));
            }
        }
    }

    if !quiet {
        eprintln!(
            "{} succeeded, {} failed, {} warnings  {}",
            bold(&report.succeeded().to_string()),
            if report.has_failures() {
                red(&report.failed().to_string())
            } else {
                report.failed().to_string()
            },
            report.warning_count(),
            dim(&format!("{}ms", report.total_duration_ms)),
        );
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let head: String = s.chars().take(max_chars - 1).collect();
        format!("{head}\u{2026}")
    } else {
        s.to_string()
    }
}
