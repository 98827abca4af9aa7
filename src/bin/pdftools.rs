//! CLI binary for pdftools-client.
//!
//! A thin shim over the library crate: one subcommand per tool panel, plus
//! an interactive `shell` that keeps a [`Session`] alive across submissions.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pdftools_client::{
    ClientConfig, InputSet, Operation, PageBounds, Panel, RequestState, Session,
    SubmissionCallback, SubmissionReport, Submitter,
};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
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

// ── Terminal callback using indicatif ────────────────────────────────────────

/// Shows a spinner while a panel is busy and prints the single outcome line
/// of each submission.
struct CliCallback {
    /// Spinner for the request in flight, if progress display is on.
    bar: Mutex<Option<ProgressBar>>,
    show_progress: bool,
    quiet: bool,
}

impl CliCallback {
    fn new(show_progress: bool, quiet: bool) -> Arc<Self> {
        Arc::new(Self {
            bar: Mutex::new(None),
            show_progress,
            quiet,
        })
    }

    fn print(&self, line: String) {
        match self.bar.lock().ok().and_then(|b| b.clone()) {
            Some(bar) => bar.println(line),
            None => eprintln!("{line}"),
        }
    }
}

impl SubmissionCallback for CliCallback {
    fn on_busy(&self, op: Operation) {
        if !self.show_progress {
            return;
        }
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix(op.spec().label);
        bar.set_message("waiting for server…");
        bar.enable_steady_tick(Duration::from_millis(80));
        if let Ok(mut slot) = self.bar.lock() {
            *slot = Some(bar);
        }
    }

    fn on_saved(&self, _op: Operation, path: &Path, bytes: usize) {
        if self.quiet {
            return;
        }
        self.print(format!(
            "{} Saved {}  {}",
            green("✔"),
            bold(&path.display().to_string()),
            dim(&format!("{bytes} bytes")),
        ));
    }

    fn on_failure(&self, op: Operation, message: &str) {
        self.print(format!("{} {}: {}", red("✘"), op.spec().label, red(message)));
    }

    fn on_idle(&self, _op: Operation) {
        if let Some(bar) = self.bar.lock().ok().and_then(|mut b| b.take()) {
            bar.finish_and_clear();
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Merge two PDFs (saved as the server's suggested name, or merged.pdf)
  pdftools --api-base http://localhost:5000/api merge a.pdf b.pdf

  # Split pages 1-3 into the downloads directory
  pdftools -o downloads split report.pdf --from 1 --to 3

  # Convert to text / Word
  pdftools to-text report.pdf
  pdftools to-docx report.pdf

  # OCR a batch of scans
  pdftools ocr page1.png page2.jpg

  # Show the request without sending it
  pdftools --dry-run --json merge a.pdf b.pdf

  # Interactive panels
  pdftools shell

ENVIRONMENT VARIABLES:
  PDFTOOLS_API_BASE      Backend origin + prefix, e.g. http://localhost:5000/api
  PDFTOOLS_OUTPUT_DIR    Where results are saved (default: current directory)
  PDFTOOLS_OVERWRITE     Replace existing files instead of adding " (1)"
  PDFTOOLS_TIMEOUT       Whole-request timeout in seconds (default: none)
  RUST_LOG               Override log filtering (e.g. pdftools_client=debug)
"#;

/// Merge, split and convert PDFs through a remote processing service.
#[derive(Parser, Debug)]
#[command(
    name = "pdftools",
    version,
    about = "Merge, split and convert PDFs through a remote processing service",
    long_about = "Upload PDFs or images to a PDF-processing backend (merge, split by page \
range, PDF to text, PDF to Word, image OCR) and save the file it returns. All processing \
happens on the server; this tool validates the selection, sends it, and saves the result.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Backend origin and path prefix, e.g. http://localhost:5000/api.
    #[arg(long, env = "PDFTOOLS_API_BASE", global = true)]
    api_base: Option<String>,

    /// Directory to save results into.
    #[arg(short, long, env = "PDFTOOLS_OUTPUT_DIR", default_value = ".", global = true)]
    output_dir: PathBuf,

    /// Replace an existing file instead of saving as "name (1).ext".
    #[arg(long, env = "PDFTOOLS_OVERWRITE", global = true)]
    overwrite: bool,

    /// Whole-request timeout in seconds (default: wait indefinitely).
    #[arg(long, env = "PDFTOOLS_TIMEOUT", global = true)]
    timeout: Option<u64>,

    /// Print the submission report as JSON on stdout.
    #[arg(long, global = true)]
    json: bool,

    /// Validate and show the request without sending it.
    #[arg(short = 'n', long, global = true)]
    dry_run: bool,

    /// Disable the spinner.
    #[arg(long, env = "PDFTOOLS_NO_PROGRESS", global = true)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFTOOLS_VERBOSE", global = true)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDFTOOLS_QUIET", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Merge two or more PDFs into one.
    Merge {
        /// PDF files, in merge order.
        files: Vec<PathBuf>,
    },
    /// Extract a page range from a PDF.
    Split {
        /// The PDF to split.
        file: Vec<PathBuf>,
        /// First page (1-based, inclusive).
        #[arg(long, allow_hyphen_values = true)]
        from: Option<i64>,
        /// Last page (1-based, inclusive).
        #[arg(long, allow_hyphen_values = true)]
        to: Option<i64>,
    },
    /// Extract the text of a PDF.
    #[command(alias = "txt")]
    ToText {
        /// The PDF to convert.
        file: Vec<PathBuf>,
    },
    /// Convert a PDF to a Word document.
    #[command(alias = "docx")]
    ToDocx {
        /// The PDF to convert.
        file: Vec<PathBuf>,
    },
    /// Run OCR on one or more images.
    Ocr {
        /// Image files.
        images: Vec<PathBuf>,
    },
    /// Interactive session: pick a tool, submit, go back.
    Shell,
}

impl Command {
    /// The operation and selection this command submits, `None` for `shell`.
    fn into_submission(self) -> Option<(Operation, InputSet, Option<PageBounds>)> {
        match self {
            Command::Merge { files } => Some((Operation::Merge, InputSet::new(files), None)),
            Command::Split { file, from, to } => Some((
                Operation::Split,
                InputSet::new(file),
                Some(PageBounds::new(from, to)),
            )),
            Command::ToText { file } => Some((Operation::ToText, InputSet::new(file), None)),
            Command::ToDocx { file } => Some((Operation::ToDocx, InputSet::new(file), None)),
            Command::Ocr { images } => Some((Operation::Ocr, InputSet::new(images), None)),
            Command::Shell => None,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner and outcome lines carry the feedback that matters; INFO
    // logs are only shown when progress display is off.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
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

    // ── Build config ─────────────────────────────────────────────────────
    let config = build_config(&cli)?;
    let callback = CliCallback::new(show_progress, cli.quiet);
    let submitter = Submitter::new(&config)
        .context("Failed to create HTTP client")?
        .with_callback(callback);

    let Some((op, inputs, bounds)) = cli.command.into_submission() else {
        return run_shell(&submitter, cli.dry_run).await;
    };

    // ── Run one submission ───────────────────────────────────────────────
    let session = Session::new();
    let report = if cli.dry_run {
        submitter.plan(op, inputs, bounds).await
    } else {
        submitter.submit(session.flag(op), op, inputs, bounds).await
    };

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise report")?
        );
    } else if let SubmissionReport::Planned { request } = &report {
        print_plan(request);
    }

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Map CLI args to `ClientConfig`.
fn build_config(cli: &Cli) -> Result<ClientConfig> {
    let mut builder = ClientConfig::builder(cli.api_base.clone().unwrap_or_default())
        .output_dir(&cli.output_dir)
        .overwrite(cli.overwrite);
    if let Some(secs) = cli.timeout {
        builder = builder.request_timeout_secs(secs);
    }
    builder.build().context("Invalid configuration")
}

fn print_plan(request: &pdftools_client::PreparedRequest) {
    println!("{} POST {}", cyan("◆"), bold(&request.display_url()));
    for part in &request.parts {
        println!(
            "  {}  {}  {}",
            dim(part.field),
            part.file_name,
            dim(&format!("{} · {} bytes", part.mime, part.data.len()))
        );
    }
}

// ── Interactive shell ────────────────────────────────────────────────────────

const SHELL_HELP: &str = "\
Commands:
  tools                     list the available tools
  use <tool>                open a tool panel (merge, split, to-text, to-docx, ocr)
  submit <files…> [--from N --to N]
                            submit files to the open panel
  back                      close the panel
  status                    show the open panel and busy state
  help                      show this help
  quit                      leave the shell";

/// One parsed shell line.
#[derive(Debug, PartialEq, Eq)]
enum ShellCommand {
    Tools,
    Use(Operation),
    Submit {
        files: Vec<PathBuf>,
        bounds: PageBounds,
    },
    Back,
    Status,
    Help,
    Quit,
    Empty,
}

fn parse_shell_line(line: &str) -> Result<ShellCommand, String> {
    let mut words = line.split_whitespace();
    let Some(cmd) = words.next() else {
        return Ok(ShellCommand::Empty);
    };

    match cmd.to_ascii_lowercase().as_str() {
        "tools" => Ok(ShellCommand::Tools),
        "use" | "open" => {
            let tool = words.next().ok_or("usage: use <tool>")?;
            Ok(ShellCommand::Use(tool.parse()?))
        }
        "submit" => {
            let mut files = Vec::new();
            let mut bounds = PageBounds::default();
            while let Some(word) = words.next() {
                match word {
                    "--from" => bounds.from = words.next().and_then(|v| v.parse().ok()),
                    "--to" => bounds.to = words.next().and_then(|v| v.parse().ok()),
                    path => files.push(PathBuf::from(path)),
                }
            }
            Ok(ShellCommand::Submit { files, bounds })
        }
        "back" => Ok(ShellCommand::Back),
        "status" => Ok(ShellCommand::Status),
        "help" | "?" => Ok(ShellCommand::Help),
        "quit" | "exit" => Ok(ShellCommand::Quit),
        other => Err(format!("unknown command '{other}' (try 'help')")),
    }
}

async fn run_shell(submitter: &Submitter, dry_run: bool) -> Result<ExitCode> {
    let mut session = Session::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    eprintln!("{} {}", cyan("◆"), bold("pdftools shell, type 'help' for commands"));

    loop {
        let prompt = format!("{}> ", session.navigator.active());
        stdout.write_all(prompt.as_bytes()).await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await.context("Failed to read stdin")? else {
            break;
        };

        let command = match parse_shell_line(&line) {
            Ok(c) => c,
            Err(msg) => {
                eprintln!("{}", red(&msg));
                continue;
            }
        };

        match command {
            ShellCommand::Empty => {}
            ShellCommand::Help => eprintln!("{SHELL_HELP}"),
            ShellCommand::Quit => break,
            ShellCommand::Tools => {
                for op in Operation::ALL {
                    let spec = op.spec();
                    eprintln!("  {:<8} {}  {}", op.name(), spec.label, dim(spec.path));
                }
            }
            ShellCommand::Use(op) => session.navigator.select(op),
            ShellCommand::Back => {
                if !session.navigator.back() {
                    eprintln!("{}", dim("already at the tool list"));
                }
            }
            ShellCommand::Status => eprintln!("{}", status_line(&session)),
            ShellCommand::Submit { files, bounds } => {
                let Panel::Tool(op) = session.navigator.active() else {
                    eprintln!("{}", red("open a tool first: use <tool>"));
                    continue;
                };
                let bounds = (op == Operation::Split).then_some(bounds);
                let inputs = InputSet::new(files);
                let report = if dry_run {
                    submitter.plan(op, inputs, bounds).await
                } else {
                    submitter.submit(session.flag(op), op, inputs, bounds).await
                };
                if let SubmissionReport::Planned { request } = &report {
                    print_plan(request);
                }
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// The open panel and whether any panel has a request in flight.
fn status_line(session: &Session) -> String {
    let state = if session.is_busy() {
        RequestState::Busy
    } else {
        RequestState::Idle
    };
    format!("panel: {}  state: {state:?}", session.navigator.active())
}
