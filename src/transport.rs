//! Outbound transport: one multipart POST per submission cycle.
//!
//! The controller talks to the service through the [`UploadTransport`]
//! trait so tests (and alternative front ends) can substitute their own.
//! [`HttpTransport`] is the real implementation.
//!
//! ## Wire format
//!
//! `POST {base_url}/upload` with a `multipart/form-data` body:
//!
//! | Field    | Content                         | When            |
//! |----------|---------------------------------|-----------------|
//! | `pdf`    | PDF bytes, original filename    | always          |
//! | `append` | `"true"` / `"false"`            | always          |
//! | `excel`  | workbook bytes, original name   | iff append mode |
//!
//! A 2xx response body is the spreadsheet; it is returned untouched. On
//! failure the service answers `{"error": "..."}`, which is kept for the
//! log and never shown to the user.

use crate::config::ClientConfig;
use crate::error::{Pdf2XlsxError, SubmitError};
use crate::input::{FileKind, SourceFile};
use crate::session::SubmissionRequest;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Sends a captured submission and returns the raw response body.
#[async_trait]
pub trait UploadTransport: Send + Sync {
    async fn upload(&self, request: &SubmissionRequest) -> Result<Vec<u8>, SubmitError>;
}

/// [`UploadTransport`] over HTTP via reqwest.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    upload_url: String,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, Pdf2XlsxError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Pdf2XlsxError::ClientBuild(e.to_string()))?;
        Ok(Self {
            client,
            upload_url: config.upload_url(),
            timeout: config.request_timeout,
        })
    }

    pub fn upload_url(&self) -> &str {
        &self.upload_url
    }

    fn network_error(&self, e: reqwest::Error) -> SubmitError {
        if e.is_timeout() {
            SubmitError::Timeout {
                limit_ms: self.timeout.as_millis() as u64,
            }
        } else {
            SubmitError::Network {
                url: self.upload_url.clone(),
                reason: e.to_string(),
            }
        }
    }

    fn build_form(&self, request: &SubmissionRequest) -> Result<Form, SubmitError> {
        let mut form = Form::new()
            .part("pdf", file_part("pdf", &request.pdf, FileKind::Pdf)?)
            .text("append", if request.append { "true" } else { "false" });

        if request.append {
            if let Some(ref excel) = request.spreadsheet {
                form = form.part("excel", file_part("excel", excel, FileKind::Spreadsheet)?);
            }
        }
        Ok(form)
    }
}

fn file_part(field: &'static str, file: &SourceFile, kind: FileKind) -> Result<Part, SubmitError> {
    part_with_mime(field, file, kind.mime())
}

fn part_with_mime(field: &'static str, file: &SourceFile, mime: &str) -> Result<Part, SubmitError> {
    Part::bytes(file.bytes().to_vec())
        .file_name(file.name().to_string())
        .mime_str(mime)
        .map_err(|e| SubmitError::InvalidPart {
            field,
            reason: e.to_string(),
        })
}

#[async_trait]
impl UploadTransport for HttpTransport {
    async fn upload(&self, request: &SubmissionRequest) -> Result<Vec<u8>, SubmitError> {
        let form = self.build_form(request)?;
        debug!(
            "POST {} (cycle {}, pdf {} bytes, append={})",
            self.upload_url,
            request.cycle,
            request.pdf.len(),
            request.append
        );

        let response = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.network_error(e))?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| self.network_error(e))?;

        if !status.is_success() {
            let detail = error_detail(&body);
            warn!(
                "Upload rejected with HTTP {}: {}",
                status.as_u16(),
                detail.as_deref().unwrap_or("<no body>")
            );
            return Err(SubmitError::HttpStatus {
                status: status.as_u16(),
                detail,
            });
        }

        debug!("HTTP {} with {} bytes", status.as_u16(), body.len());
        Ok(body.to_vec())
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

const MAX_DETAIL_CHARS: usize = 200;

/// Pull a diagnostic out of a failure body: the service's `error` field if
/// it sent JSON, otherwise the (truncated) text.
fn error_detail(body: &[u8]) -> Option<String> {
    if let Ok(parsed) = serde_json::from_slice::<ErrorBody>(body) {
        return Some(parsed.error);
    }
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if text.chars().count() > MAX_DETAIL_CHARS {
        let cut: String = text.chars().take(MAX_DETAIL_CHARS - 1).collect();
        Some(format!("{cut}\u{2026}"))
    } else {
        Some(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_detail_prefers_json_error_field() {
        let body = br#"{"error": "Please upload an Excel file to append"}"#;
        assert_eq!(
            error_detail(body).as_deref(),
            Some("Please upload an Excel file to append")
        );
    }

    #[test]
    fn error_detail_falls_back_to_text() {
        assert_eq!(
            error_detail(b"  Bad Gateway \n").as_deref(),
            Some("Bad Gateway")
        );
        assert_eq!(error_detail(b""), None);
        assert_eq!(error_detail(b"   "), None);
    }

    #[test]
    fn error_detail_truncates_long_pages() {
        let page = "x".repeat(5000);
        let detail = error_detail(page.as_bytes()).unwrap();
        assert_eq!(detail.chars().count(), MAX_DETAIL_CHARS);
        assert!(detail.ends_with('\u{2026}'));
    }

    #[test]
    fn file_parts_accept_both_mime_types() {
        let pdf = SourceFile::from_bytes("a.pdf", b"%PDF".to_vec());
        let xlsx = SourceFile::from_bytes("b.xlsx", b"PK\x03\x04".to_vec());
        assert!(file_part("pdf", &pdf, FileKind::Pdf).is_ok());
        assert!(file_part("excel", &xlsx, FileKind::Spreadsheet).is_ok());
    }

    #[test]
    fn invalid_part_is_not_a_network_failure() {
        let pdf = SourceFile::from_bytes("a.pdf", b"%PDF".to_vec());
        let err = part_with_mime("pdf", &pdf, "not a mime").unwrap_err();
        assert!(matches!(err, SubmitError::InvalidPart { field: "pdf", .. }));
        assert!(err.to_string().starts_with("could not build the 'pdf' part"));
    }

    #[test]
    fn transport_uses_configured_endpoint() {
        let config = ClientConfig::builder()
            .base_url("http://127.0.0.1:9/")
            .build()
            .unwrap();
        let transport = HttpTransport::new(&config).unwrap();
        assert_eq!(transport.upload_url(), "http://127.0.0.1:9/upload");
    }
}
