//! # pdf2xlsx
//!
//! Submit a PDF product catalogue to a remote extraction service and get the
//! extracted product details back as an Excel workbook, either a new one or
//! appended to a workbook you already have.
//!
//! The extraction itself happens on the service. This crate is the client
//! side: it collects the inputs, checks they are present, sends one
//! multipart request at a time, and turns the response into a download.
//!
//! ## Submission cycle
//!
//! ```text
//! inputs ──▶ submit()
//!             │
//!             ├─ 1. Validate   PDF present? spreadsheet present in append mode?
//!             ├─ 2. Send       POST {base}/upload  (pdf, append, excel)
//!             ├─ 3. Resolve    2xx → download handle, anything else → Failed
//!             └─ 4. Save       on demand, as products_details.xlsx
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2xlsx::{ClientConfig, SourceFile, SubmissionController, SubmitOutcome};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Base URL from PDF2XLSX_API_BASE_URL (default http://localhost:5000)
//!     let controller = SubmissionController::new(ClientConfig::from_env()?)?;
//!
//!     controller.set_pdf(Some(SourceFile::load("catalogue.pdf").await?));
//!     controller.set_append_mode(true);
//!     controller.set_spreadsheet(Some(SourceFile::load("products.xlsx").await?));
//!
//!     match controller.submit().await {
//!         SubmitOutcome::Succeeded(_) => {
//!             let path = controller.save_download(".").await?;
//!             println!("saved {}", path.display());
//!         }
//!         _ => eprintln!("{}", controller.view().error_message.unwrap_or_default()),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2xlsx` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf2xlsx = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod controller;
pub mod download;
pub mod error;
pub mod input;
pub mod messages;
pub mod observer;
pub mod session;
pub mod transport;
pub mod view;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ClientConfig, ClientConfigBuilder};
pub use controller::{SubmissionController, SubmitOutcome};
pub use download::{DownloadArtifact, DownloadHandle, DownloadLink, DownloadStore, DOWNLOAD_FILENAME};
pub use error::{Pdf2XlsxError, SubmitError};
pub use input::{FileKind, SourceFile};
pub use observer::{NoopObserver, ObserverHandle, SessionObserver};
pub use session::{Phase, SubmissionRequest, UploadSession};
pub use transport::{HttpTransport, UploadTransport};
pub use view::SessionView;
