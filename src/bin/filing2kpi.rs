//! CLI binary for filing2kpi.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ReportConfig`, drives the backend client and export pipeline, and prints
//! results.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use filing2kpi::export::CaptureRegion;
use filing2kpi::{
    paginate, sort_filings, BackendClient, DirectoryDownloader, EmailDraft, ExportPipeline,
    ExportProgress, ExportProgressCallback, ExportState, FilingQuery, HttpTransport,
    ImageRegionCapturer, ParsedFiling, ReportConfig, Row, SortDirection, SortKey, Statement,
    StatementRows,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner that follows the export state machine.
struct CliExportProgress {
    bar: ProgressBar,
}

impl CliExportProgress {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Export");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ExportProgressCallback for CliExportProgress {
    fn on_state_change(&self, state: ExportState) {
        match state {
            ExportState::Capturing => self.bar.set_message("Capturing charts…"),
            ExportState::Submitting => self.bar.set_message("Submitting report…"),
            ExportState::Succeeded => self.bar.set_message("Done"),
            ExportState::Failed => self.bar.set_message("Failed"),
            ExportState::Idle => self.bar.finish_and_clear(),
        }
    }

    fn on_captured(&self, images: usize) {
        self.bar
            .println(format!("  {} {} region(s) captured", green("✓"), images));
    }

    fn on_response(&self, status: u16) {
        self.bar.println(format!("  {}", dim(&format!("HTTP {status}"))));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # KPI rows from a parsed filing saved as JSON
  filing2kpi rows parsed.json

  # Parse a filing through the backend
  filing2kpi parse S100TR7I --json

  # List annual reports filed in a range, oldest first
  filing2kpi list --edinet-code E02144 --start 2024-01-01 --end 2024-06-30 \
      --doc-types 120 --sort date --asc

  # Download a PDF report of two rendered charts
  filing2kpi export pdf --region pl.png --region bs.png --out reports/

  # Email the same charts
  filing2kpi export email --to analyst@example.com --region pl.png --region bs.png

ENVIRONMENT VARIABLES:
  BACKEND_API_BASE_URL     Backend base URL (default http://localhost:8000)
  API_USER                 Basic-auth user (default admin)
  API_PASSWORD             Basic-auth password
  FILING2KPI_TIMEOUT_SECS  Request timeout in seconds (default 60)
"#;

/// Turn EDINET filings into KPI rows and export chart reports.
#[derive(Parser, Debug)]
#[command(
    name = "filing2kpi",
    version,
    about = "Turn EDINET filings into KPI rows and export chart reports",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    backend: BackendArgs,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "FILING2KPI_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "FILING2KPI_QUIET")]
    quiet: bool,

    /// Disable the progress spinner.
    #[arg(long, global = true, env = "FILING2KPI_NO_PROGRESS")]
    no_progress: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct BackendArgs {
    /// Backend base URL.
    #[arg(long, global = true, env = "BACKEND_API_BASE_URL")]
    base_url: Option<String>,

    /// Basic-auth user.
    #[arg(long, global = true, env = "API_USER")]
    api_user: Option<String>,

    /// Basic-auth password.
    #[arg(long, global = true, env = "API_PASSWORD", hide_env_values = true)]
    api_password: Option<String>,

    /// Request timeout in seconds.
    #[arg(long, global = true, env = "FILING2KPI_TIMEOUT_SECS")]
    timeout: Option<u64>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print KPI rows from a parsed-filing JSON file (`-` for stdin).
    Rows {
        input: PathBuf,
        /// Output rows as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Parse a filing through the backend and print its KPI rows.
    Parse {
        document_id: String,
        /// Output rows as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List a company's filings.
    List(ListArgs),

    /// Export captured charts as a report.
    #[command(subcommand)]
    Export(ExportCommand),
}

#[derive(Args, Debug)]
struct ListArgs {
    /// EDINET code of the filer (e.g. E02144).
    #[arg(long)]
    edinet_code: String,

    /// Single submission day, YYYY-MM-DD.
    #[arg(long, conflicts_with_all = ["start", "end"])]
    date: Option<String>,

    /// Range start, YYYY-MM-DD.
    #[arg(long, requires = "end")]
    start: Option<String>,

    /// Range end, YYYY-MM-DD.
    #[arg(long, requires = "start")]
    end: Option<String>,

    /// Document-type codes: 120,130,140,150,160.
    #[arg(long, value_delimiter = ',')]
    doc_types: Vec<String>,

    /// Column to sort by.
    #[arg(long, value_enum, default_value = "date")]
    sort: SortArg,

    /// Sort ascending (default is descending).
    #[arg(long)]
    asc: bool,

    /// Page to show, 1-based.
    #[arg(long, default_value_t = 1)]
    page: usize,

    /// Rows per page.
    #[arg(long, default_value_t = filing2kpi::filings::DEFAULT_PAGE_SIZE)]
    page_size: usize,

    /// Output the page as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum SortArg {
    DocId,
    Submitter,
    Title,
    Date,
}

impl From<SortArg> for SortKey {
    fn from(v: SortArg) -> Self {
        match v {
            SortArg::DocId => SortKey::DocId,
            SortArg::Submitter => SortKey::Submitter,
            SortArg::Title => SortKey::Title,
            SortArg::Date => SortKey::Date,
        }
    }
}

#[derive(Args, Debug)]
struct CaptureArgs {
    /// Rendered chart image; repeat for several regions, in order.
    #[arg(long = "region", value_name = "FILE")]
    regions: Vec<PathBuf>,

    /// Device pixel ratio of the rendered images.
    #[arg(long, default_value_t = 1.0)]
    device_pixel_ratio: f64,
}

#[derive(Subcommand, Debug)]
enum ExportCommand {
    /// Request a PDF report and save it.
    Pdf {
        #[command(flatten)]
        capture: CaptureArgs,
        /// Report title.
        #[arg(long)]
        title: Option<String>,
        /// Directory to save the PDF into.
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },

    /// Send the report by email.
    Email {
        #[command(flatten)]
        capture: CaptureArgs,
        /// Recipient address.
        #[arg(long)]
        to: String,
        #[arg(long)]
        subject: Option<String>,
        #[arg(long)]
        message: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli.backend)?;

    match cli.command {
        Command::Rows { ref input, json } => {
            let filing = read_filing(input)?;
            print_rows(&StatementRows::from_filing(&filing), json)?;
        }
        Command::Parse {
            ref document_id,
            json,
        } => {
            let client = BackendClient::new(&config).context("Failed to create backend client")?;
            let filing = client
                .parse_document(document_id)
                .await
                .with_context(|| format!("Failed to parse document {document_id}"))?;
            print_rows(&StatementRows::from_filing(&filing), json)?;
        }
        Command::List(ref args) => run_list(&config, args).await?,
        Command::Export(ref export) => {
            let show_progress = !cli.quiet && !cli.no_progress;
            run_export(config, export, show_progress, cli.quiet).await?;
        }
    }
    Ok(())
}

fn build_config(args: &BackendArgs) -> Result<ReportConfig> {
    let mut builder = ReportConfig::builder();
    if let Some(ref url) = args.base_url {
        builder = builder.base_url(url);
    }
    if let Some(ref user) = args.api_user {
        builder = builder.api_user(user);
    }
    if let Some(ref password) = args.api_password {
        builder = builder.api_password(password);
    }
    if let Some(secs) = args.timeout {
        builder = builder.timeout_secs(secs);
    }
    builder.build().context("Invalid configuration")
}

fn read_filing(input: &Path) -> Result<ParsedFiling> {
    let text = if input == Path::new("-") {
        io::read_to_string(io::stdin()).context("Failed to read stdin")?
    } else {
        std::fs::read_to_string(input)
            .with_context(|| format!("Failed to read {}", input.display()))?
    };
    let value: serde_json::Value = serde_json::from_str(&text).context("Input is not JSON")?;
    // Accept both a bare filing and the backend's `{"parsed": {...}}` envelope.
    let filing = value.get("parsed").cloned().unwrap_or(value);
    serde_json::from_value(filing).context("Input is not a parsed filing")
}

fn print_rows(rows: &StatementRows, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(rows).context("Failed to serialise rows")?
        );
        return Ok(());
    }
    if rows.is_empty() {
        eprintln!("No KPI rows could be resolved.");
        return Ok(());
    }
    for statement in Statement::ALL {
        let section = rows.get(statement);
        if section.is_empty() {
            continue;
        }
        println!("{}", bold(statement.title()));
        for Row { x, value } in section {
            println!("  {:<20} {:>20}", x, format_value(*value));
        }
    }
    Ok(())
}

fn format_value(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.0}")
    } else {
        format!("{v}")
    }
}

async fn run_list(config: &ReportConfig, args: &ListArgs) -> Result<()> {
    let query = match (&args.date, &args.start, &args.end) {
        (Some(date), _, _) => FilingQuery::day(&args.edinet_code, date)?,
        (None, Some(start), Some(end)) => FilingQuery::range(&args.edinet_code, start, end)?,
        _ => bail!("Give either --date or both --start and --end"),
    }
    .with_doc_types(&args.doc_types);

    let client = BackendClient::new(config).context("Failed to create backend client")?;
    let mut filings = client
        .list_filings(&query)
        .await
        .context("Failed to list filings")?;

    let direction = if args.asc {
        SortDirection::Asc
    } else {
        SortDirection::Desc
    };
    sort_filings(&mut filings, args.sort.into(), direction);
    let page = paginate(&filings, args.page, args.page_size);

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(page.items).context("Failed to serialise filings")?
        );
        return Ok(());
    }
    for f in page.items {
        println!("{:<10} {:<18} {:<30} {}", f.doc_id, f.date, f.submitter, f.title);
    }
    eprintln!(
        "{}",
        dim(&format!(
            "{} - {} / {}  (page {}/{})",
            page.first_index, page.last_index, page.total_items, page.page, page.total_pages
        ))
    );
    Ok(())
}

fn capturer(args: &CaptureArgs) -> ImageRegionCapturer {
    args.regions
        .iter()
        .enumerate()
        .fold(ImageRegionCapturer::new(args.device_pixel_ratio), |c, (i, path)| {
            let id = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| format!("region-{i}"));
            c.with_region(CaptureRegion::new(id, path).with_class("chart-capture"))
        })
}

async fn run_export(
    config: ReportConfig,
    command: &ExportCommand,
    show_progress: bool,
    quiet: bool,
) -> Result<()> {
    let capture = match command {
        ExportCommand::Pdf { capture, .. } | ExportCommand::Email { capture, .. } => capture,
    };
    let out = match command {
        ExportCommand::Pdf { out, .. } => out.clone(),
        ExportCommand::Email { .. } => PathBuf::from("."),
    };

    let transport = HttpTransport::new(&config).context("Failed to create HTTP client")?;
    let mut pipeline = ExportPipeline::new(
        config,
        capturer(capture),
        transport,
        DirectoryDownloader::new(out),
    );
    if show_progress {
        pipeline = pipeline.with_progress(CliExportProgress::new() as ExportProgress);
    }

    match command {
        ExportCommand::Pdf { title, .. } => {
            let report = pipeline
                .export_pdf(title.as_deref())
                .await
                .context("PDF export failed")?;
            if !quiet {
                eprintln!(
                    "{}  {} image(s)  {} bytes  →  {}",
                    green("✔"),
                    report.images,
                    report.size,
                    bold(&report.path.display().to_string()),
                );
            }
        }
        ExportCommand::Email {
            to,
            subject,
            message,
            ..
        } => {
            let mut draft = EmailDraft::new(to);
            draft.subject = subject.clone();
            draft.message = message.clone();
            let receipt = pipeline
                .export_email(&draft)
                .await
                .context("Email export failed")?;
            if !quiet {
                eprintln!(
                    "{}  {} image(s) sent to {}  {}",
                    green("✔"),
                    receipt.images,
                    bold(&receipt.to),
                    dim(receipt.status.as_deref().unwrap_or("")),
                );
            }
        }
    }
    Ok(())
}
