//! CLI binary for pdf2xlsx.
//!
//! A thin terminal front end over the library: flags become input events on
//! a `SubmissionController`, one submit is run, and on success the workbook
//! is saved. Every message shown comes from the session view.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2xlsx::{
    ClientConfig, ObserverHandle, Phase, SessionObserver, SessionView, SourceFile,
    SubmissionController, SubmitOutcome,
};
use std::io;
use std::path::PathBuf;
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
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI observer using indicatif ─────────────────────────────────────────────

/// Terminal observer: a spinner while the request is in flight, replaced by
/// the final status line once the cycle resolves.
struct CliObserver {
    bar: ProgressBar,
}

impl CliObserver {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        Arc::new(Self { bar })
    }
}

impl SessionObserver for CliObserver {
    fn on_state_change(&self, view: &SessionView) {
        match view.phase {
            Phase::Validating => self.bar.set_message("Checking inputs…"),
            Phase::Submitting => self.bar.set_message(view.status_message.clone()),
            Phase::Succeeded => {
                self.bar.finish_and_clear();
                eprintln!("{} {}", green("✔"), view.status_message);
            }
            // the error itself is reported by main
            Phase::Failed => self.bar.finish_and_clear(),
            Phase::Idle if view.error_message.is_some() => self.bar.finish_and_clear(),
            Phase::Idle => {}
        }
    }

    fn on_request_start(&self, _cycle: u64, append: bool) {
        self.bar
            .set_prefix(if append { "Appending" } else { "Extracting" });
        self.bar.enable_steady_tick(Duration::from_millis(80));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract products into a new workbook (saved as ./products_details.xlsx)
  pdf2xlsx catalogue.pdf

  # Append to an existing workbook, save into ./out
  pdf2xlsx catalogue.pdf --append --excel products.xlsx -o out

  # Point at a remote service
  pdf2xlsx --api-base-url https://extract.example.com catalogue.pdf

  # Machine-readable final state
  pdf2xlsx --json catalogue.pdf

ENVIRONMENT VARIABLES:
  PDF2XLSX_API_BASE_URL   Extraction service base URL (default http://localhost:5000)
  PDF2XLSX_OUTPUT_DIR     Directory the workbook is saved into
  PDF2XLSX_TIMEOUT        Request timeout in seconds
  RUST_LOG                Override log filter (e.g. pdf2xlsx=debug)

The downloaded workbook is always named products_details.xlsx.
"#;

/// Extract product details from a PDF into an Excel workbook.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2xlsx",
    version,
    about = "Extract product details from a PDF into an Excel workbook",
    long_about = "Upload a PDF catalogue to the product-extraction service and save the \
resulting spreadsheet. Optionally append the products to an existing workbook.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF document to upload.
    pdf: PathBuf,

    /// Append to an existing workbook instead of creating a new one.
    #[arg(long)]
    append: bool,

    /// Existing .xlsx workbook to append to (used with --append).
    #[arg(long, value_name = "XLSX")]
    excel: Option<PathBuf>,

    /// Directory to save products_details.xlsx into.
    #[arg(short, long, env = "PDF2XLSX_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Extraction service base URL. Falls back to PDF2XLSX_API_BASE_URL.
    #[arg(long)]
    api_base_url: Option<String>,

    /// Request timeout in seconds.
    #[arg(long, env = "PDF2XLSX_TIMEOUT", default_value_t = 120,
          value_parser = clap::value_parser!(u64).range(1..))]
    timeout: u64,

    /// Print the final session state as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "PDF2XLSX_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2XLSX_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2XLSX_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives all the feedback that matters; keep INFO logs out of
    // its way unless asked for.
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

    // ── Build controller ─────────────────────────────────────────────────
    let observer: Option<ObserverHandle> = if show_progress {
        Some(CliObserver::new() as ObserverHandle)
    } else {
        None
    };
    let config = build_config(&cli, observer)?;
    let controller =
        SubmissionController::new(config).context("Failed to set up the HTTP client")?;

    // ── Input events ─────────────────────────────────────────────────────
    let pdf = SourceFile::load(&cli.pdf)
        .await
        .context("Failed to read the PDF")?;
    controller.set_pdf(Some(pdf));
    controller.set_append_mode(cli.append);

    if let Some(ref path) = cli.excel {
        if !cli.append {
            warn!("--excel given without --append; the workbook will not be sent");
        }
        let excel = SourceFile::load(path)
            .await
            .context("Failed to read the Excel workbook")?;
        controller.set_spreadsheet(Some(excel));
    }

    // ── Submit ───────────────────────────────────────────────────────────
    let outcome = controller.submit().await;
    let view = controller.view();

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&view).context("Failed to serialise session state")?
        );
    }

    match outcome {
        SubmitOutcome::Succeeded(artifact) => {
            let path = controller
                .save_download(&cli.output_dir)
                .await
                .context("Failed to save the spreadsheet")?;
            if !cli.quiet {
                if !show_progress && !cli.json {
                    eprintln!("{} {}", green("✔"), view.status_message);
                }
                eprintln!(
                    "   {}  {}",
                    bold(&path.display().to_string()),
                    dim(&format!("{} bytes", artifact.len())),
                );
            }
            Ok(())
        }
        SubmitOutcome::Rejected(err) | SubmitOutcome::Failed(err) => {
            let message = view
                .error_message
                .unwrap_or_else(|| err.user_message().to_string());
            anyhow::bail!("{} {message}", red("✘"))
        }
        SubmitOutcome::Ignored | SubmitOutcome::Superseded => {
            anyhow::bail!("Submission did not complete")
        }
    }
}

/// Map CLI args to `ClientConfig`.
fn build_config(cli: &Cli, observer: Option<ObserverHandle>) -> Result<ClientConfig> {
    let base_url = match cli.api_base_url {
        Some(ref url) => url.clone(),
        None => {
            ClientConfig::from_env()
                .context("Invalid PDF2XLSX_API_BASE_URL")?
                .base_url
        }
    };

    let mut builder = ClientConfig::builder()
        .base_url(base_url)
        .request_timeout_secs(cli.timeout);

    if let Some(obs) = observer {
        builder = builder.observer(obs);
    }

    builder.build().context("Invalid configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_append_flags() {
        let cli = Cli::try_parse_from([
            "pdf2xlsx",
            "catalogue.pdf",
            "--append",
            "--excel",
            "products.xlsx",
            "-o",
            "out",
        ])
        .unwrap();
        assert!(cli.append);
        assert_eq!(cli.excel, Some(PathBuf::from("products.xlsx")));
        assert_eq!(cli.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn explicit_base_url_wins() {
        let cli = Cli::try_parse_from([
            "pdf2xlsx",
            "--api-base-url",
            "https://extract.example.com/",
            "catalogue.pdf",
        ])
        .unwrap();
        let config = build_config(&cli, None).unwrap();
        assert_eq!(config.upload_url(), "https://extract.example.com/upload");
        assert_eq!(config.request_timeout, Duration::from_secs(120));
    }

    #[test]
    fn zero_timeout_is_rejected_by_parser() {
        assert!(Cli::try_parse_from(["pdf2xlsx", "--timeout", "0", "a.pdf"]).is_err());
    }
}
