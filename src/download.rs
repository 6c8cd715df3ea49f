//! Download artifacts: response bytes exposed as a savable file.
//!
//! A [`DownloadStore`] is the registry of live artifacts. [`DownloadStore::create`]
//! registers the bytes and returns the owning [`DownloadHandle`]; dropping the
//! handle (or calling [`DownloadHandle::release`]) unregisters them. The session
//! holds at most one handle, so replacing it releases the old one and repeated
//! submissions cannot grow the store without bound.
//!
//! Readers that only need to save or inspect the bytes take a
//! [`DownloadArtifact`], a cheap snapshot that does not keep the registration
//! alive.

use crate::error::Pdf2XlsxError;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Every artifact is saved under this name, whatever the source PDF was called.
pub const DOWNLOAD_FILENAME: &str = "products_details.xlsx";

static SAVE_SEQ: AtomicU64 = AtomicU64::new(0);

#[derive(Default)]
struct StoreInner {
    next_id: u64,
    live: HashMap<u64, Arc<[u8]>>,
}

/// Registry of live download artifacts.
///
/// Cloning shares the same registry.
#[derive(Clone, Default)]
pub struct DownloadStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl DownloadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `bytes` and return the handle that owns the registration.
    pub fn create(&self, bytes: Vec<u8>) -> DownloadHandle {
        let bytes: Arc<[u8]> = Arc::from(bytes);
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.next_id += 1;
        let id = inner.next_id;
        inner.live.insert(id, Arc::clone(&bytes));
        debug!("Download {} created ({} bytes)", id, bytes.len());
        DownloadHandle {
            id,
            bytes,
            store: self.clone(),
        }
    }

    /// Number of artifacts currently registered.
    pub fn live_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .live
            .len()
    }

    /// `true` while the artifact with this id has not been released.
    pub fn is_live(&self, id: u64) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .live
            .contains_key(&id)
    }

    fn remove(&self, id: u64) {
        let removed = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .live
            .remove(&id);
        if removed.is_some() {
            debug!("Download {} released", id);
        }
    }
}

impl fmt::Debug for DownloadStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadStore")
            .field("live", &self.live_count())
            .finish()
    }
}

/// Exclusive owner of one registered artifact.
///
/// Not `Clone`: there is exactly one owner, and its drop is the release.
pub struct DownloadHandle {
    id: u64,
    bytes: Arc<[u8]>,
    store: DownloadStore,
}

impl DownloadHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn filename(&self) -> &'static str {
        DOWNLOAD_FILENAME
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Snapshot for readers; does not extend the registration.
    pub fn artifact(&self) -> DownloadArtifact {
        DownloadArtifact {
            id: self.id,
            filename: DOWNLOAD_FILENAME,
            bytes: Arc::clone(&self.bytes),
        }
    }

    /// Unregister the artifact now.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for DownloadHandle {
    fn drop(&mut self) {
        self.store.remove(self.id);
    }
}

impl fmt::Debug for DownloadHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadHandle")
            .field("id", &self.id)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Read-only view of an artifact's bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct DownloadArtifact {
    id: u64,
    filename: &'static str,
    bytes: Arc<[u8]>,
}

impl DownloadArtifact {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn filename(&self) -> &'static str {
        self.filename
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

    /// Write the artifact into `dir` as [`DOWNLOAD_FILENAME`].
    ///
    /// The bytes go to a uniquely named sibling temp file first and are
    /// renamed into place, so an interrupted save never leaves a truncated
    /// workbook behind and concurrent saves do not share a temp file.
    pub async fn save_to(&self, dir: impl AsRef<Path>) -> Result<PathBuf, Pdf2XlsxError> {
        let dir = dir.as_ref();
        let path = dir.join(self.filename);
        let write_err = |source: std::io::Error| Pdf2XlsxError::OutputWriteFailed {
            path: path.clone(),
            source,
        };

        tokio::fs::create_dir_all(dir).await.map_err(write_err)?;

        let tmp_path = dir.join(format!(
            ".{}.{}-{}.tmp",
            self.filename,
            std::process::id(),
            SAVE_SEQ.fetch_add(1, Ordering::Relaxed)
        ));
        let written = match tokio::fs::write(&tmp_path, &self.bytes).await {
            Ok(()) => tokio::fs::rename(&tmp_path, &path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(write_err(e));
        }

        debug!("Saved download {} to {}", self.id, path.display());
        Ok(path)
    }
}

impl fmt::Debug for DownloadArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadArtifact")
            .field("id", &self.id)
            .field("filename", &self.filename)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// What the presentation layer needs to render the download action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadLink {
    pub filename: &'static str,
    pub size: usize,
}

impl From<&DownloadHandle> for DownloadLink {
    fn from(handle: &DownloadHandle) -> Self {
        Self {
            filename: DOWNLOAD_FILENAME,
            size: handle.len(),
        }
    }
}
