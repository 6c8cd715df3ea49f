//! Error types for the pdf2xlsx library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Pdf2XlsxError`] (**fatal**): the operation cannot proceed at all
//!   (input file missing, invalid configuration, nothing to save). Returned as
//!   `Err(Pdf2XlsxError)` from loaders, config builders and
//!   [`crate::controller::SubmissionController::save_download`].
//!
//! * [`SubmitError`] (**per-cycle**): one submission was rejected locally or
//!   failed remotely, but the session is intact and can be resubmitted.
//!   Carried inside [`crate::controller::SubmitOutcome`] and never propagated
//!   with `?` out of the controller.
//!
//! Only [`SubmitError::user_message`] is ever shown to the user; the
//! `Display` text of transport errors is diagnostic and goes to the log.

use crate::messages;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2xlsx library.
#[derive(Debug, Error)]
pub enum Pdf2XlsxError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The HTTP client could not be constructed (TLS backend, etc.).
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    // ── Download errors ───────────────────────────────────────────────────
    /// A save was requested but no artifact is available.
    #[error("No spreadsheet is ready to download.\nSubmit a PDF first.")]
    NoDownload,

    /// Could not create or write the downloaded spreadsheet.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Why a single submission cycle did not produce a spreadsheet.
///
/// The first two variants are validation errors detected before any network
/// activity; the rest are transport/remote errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    // ── Validation ────────────────────────────────────────────────────────
    /// No PDF has been selected.
    #[error("no PDF selected")]
    MissingPdf,

    /// Append mode is on but no spreadsheet has been selected.
    #[error("append mode is on but no spreadsheet is selected")]
    MissingSpreadsheet,

    // ── Transport / remote ────────────────────────────────────────────────
    /// The service answered with a non-2xx status.
    #[error("service returned HTTP {status}{}", detail_suffix(.detail))]
    HttpStatus { status: u16, detail: Option<String> },

    /// The request could not be sent or the body could not be read.
    #[error("request to '{url}' failed: {reason}")]
    Network { url: String, reason: String },

    /// No response within the configured timeout.
    #[error("no response within the {limit_ms}ms limit")]
    Timeout { limit_ms: u64 },

    /// A multipart field could not be assembled; nothing was sent.
    #[error("could not build the '{field}' part: {reason}")]
    InvalidPart { field: &'static str, reason: String },

    /// The caller dropped the submit before the response arrived.
    #[error("submission cancelled before the service answered")]
    Cancelled,
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default()
}

impl SubmitError {
    /// `true` for errors detected locally before any request was sent.
    pub fn is_validation(&self) -> bool {
        matches!(self, SubmitError::MissingPdf | SubmitError::MissingSpreadsheet)
    }

    /// The fixed text shown to the user for this error.
    pub fn user_message(&self) -> &'static str {
        match self {
            SubmitError::MissingPdf => messages::MISSING_PDF,
            SubmitError::MissingSpreadsheet => messages::MISSING_SPREADSHEET,
            SubmitError::HttpStatus { .. }
            | SubmitError::Network { .. }
            | SubmitError::Timeout { .. }
            | SubmitError::InvalidPart { .. }
            | SubmitError::Cancelled => messages::SUBMIT_FAILED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_have_distinct_messages() {
        assert!(SubmitError::MissingPdf.is_validation());
        assert!(SubmitError::MissingSpreadsheet.is_validation());
        assert_ne!(
            SubmitError::MissingPdf.user_message(),
            SubmitError::MissingSpreadsheet.user_message()
        );
    }

    #[test]
    fn transport_errors_share_generic_message() {
        let errors = [
            SubmitError::HttpStatus {
                status: 500,
                detail: Some("boom".into()),
            },
            SubmitError::Network {
                url: "http://localhost:5000/upload".into(),
                reason: "connection refused".into(),
            },
            SubmitError::Timeout { limit_ms: 30_000 },
            SubmitError::InvalidPart {
                field: "pdf",
                reason: "bad mime".into(),
            },
            SubmitError::Cancelled,
        ];
        for e in &errors {
            assert!(!e.is_validation());
            assert_eq!(e.user_message(), messages::SUBMIT_FAILED);
        }
    }

    #[test]
    fn http_status_display_includes_detail() {
        let e = SubmitError::HttpStatus {
            status: 400,
            detail: Some("No file uploaded".into()),
        };
        let msg = e.to_string();
        assert!(msg.contains("400"), "got: {msg}");
        assert!(msg.contains("No file uploaded"), "got: {msg}");

        let bare = SubmitError::HttpStatus {
            status: 502,
            detail: None,
        };
        assert_eq!(bare.to_string(), "service returned HTTP 502");
    }

    #[test]
    fn output_write_failed_display() {
        let e = Pdf2XlsxError::OutputWriteFailed {
            path: PathBuf::from("/tmp/out/products_details.xlsx"),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        };
        let msg = e.to_string();
        assert!(msg.contains("products_details.xlsx"));
        assert!(msg.contains("disk full"));
    }
}
