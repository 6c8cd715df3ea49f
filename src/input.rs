//! Input collection: the files the user picked and the append flag.
//!
//! Nothing here validates file *contents*; the service is the authority on
//! whether a PDF or workbook is usable. The only local checks are presence
//! checks, made by [`crate::session`] at submit time. The magic-byte helpers
//! below drive log hints only.

use crate::error::Pdf2XlsxError;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// MIME type sent with the `pdf` form field.
pub const PDF_MIME: &str = "application/pdf";

/// MIME type sent with the `excel` form field.
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Which picker a file came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Spreadsheet,
}

impl FileKind {
    pub fn mime(self) -> &'static str {
        match self {
            FileKind::Pdf => PDF_MIME,
            FileKind::Spreadsheet => XLSX_MIME,
        }
    }

    fn extension(self) -> &'static str {
        match self {
            FileKind::Pdf => "pdf",
            FileKind::Spreadsheet => "xlsx",
        }
    }

    fn magic(self) -> &'static [u8] {
        match self {
            FileKind::Pdf => b"%PDF",
            // xlsx is a zip container
            FileKind::Spreadsheet => b"PK\x03\x04",
        }
    }
}

/// A user-selected file: its display name and its bytes.
///
/// Cloning is cheap; the bytes are shared.
#[derive(Clone, PartialEq, Eq)]
pub struct SourceFile {
    name: String,
    bytes: Arc<[u8]>,
}

impl SourceFile {
    /// Wrap bytes already in memory.
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let bytes: Vec<u8> = bytes.into();
        Self {
            name: name.into(),
            bytes: Arc::from(bytes),
        }
    }

    /// Read a file from disk.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, Pdf2XlsxError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Pdf2XlsxError::FileNotFound {
                path: path.to_path_buf(),
            },
            std::io::ErrorKind::PermissionDenied => Pdf2XlsxError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => Pdf2XlsxError::Internal(format!("Failed to read {}: {}", path.display(), e)),
        })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        debug!("Loaded {} ({} bytes)", path.display(), bytes.len());
        Ok(Self::from_bytes(name, bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// `true` if the name or the leading bytes match what the picker expects.
    pub fn looks_like(&self, kind: FileKind) -> bool {
        let ext_ok = Path::new(&self.name)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(kind.extension()));
        ext_ok || self.bytes.starts_with(kind.magic())
    }

    /// Log a hint when a file does not look like the expected kind.
    ///
    /// The file is still accepted.
    pub(crate) fn warn_if_unexpected(&self, kind: FileKind) {
        if !self.looks_like(kind) {
            warn!(
                "'{}' does not look like a .{} file; sending it anyway",
                self.name,
                kind.extension()
            );
        }
    }
}

impl fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceFile")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// The raw inputs held by a session.
#[derive(Debug, Clone, Default)]
pub struct InputSelection {
    pub(crate) pdf: Option<SourceFile>,
    pub(crate) spreadsheet: Option<SourceFile>,
    pub(crate) append_mode: bool,
}

impl InputSelection {
    pub fn pdf(&self) -> Option<&SourceFile> {
        self.pdf.as_ref()
    }

    pub fn spreadsheet(&self) -> Option<&SourceFile> {
        self.spreadsheet.as_ref()
    }

    pub fn append_mode(&self) -> bool {
        self.append_mode
    }
}
