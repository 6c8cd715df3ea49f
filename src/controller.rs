//! The submission workflow controller.
//!
//! [`SubmissionController`] owns the one [`UploadSession`], forwards input
//! events to it, and drives a submission cycle end to end:
//!
//! 1. `enter_validating`: refuse if a cycle is already running
//! 2. `finish_validation`: presence checks; on failure stop here, no request
//! 3. transport call, bounded by `request_timeout`
//! 4. `complete`: applied only if the response belongs to the current cycle
//!
//! The session lock is never held across the request, and observers are
//! notified after the lock is released. Callers share the controller with an
//! `Arc` when submits can overlap (a UI event loop, a spawned task).
//!
//! Dropping a `submit()` future mid-request is allowed: the cycle is
//! completed as [`SubmitError::Cancelled`] and the session ends up `Failed`.

use crate::config::ClientConfig;
use crate::download::{DownloadArtifact, DownloadStore};
use crate::error::{Pdf2XlsxError, SubmitError};
use crate::input::{FileKind, SourceFile};
use crate::observer::{NoopObserver, ObserverHandle};
use crate::session::{Completion, Phase, UploadSession};
use crate::transport::{HttpTransport, UploadTransport};
use crate::view::SessionView;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tracing::{debug, info, warn};

/// How a call to [`SubmissionController::submit`] ended.
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    /// A cycle was already in progress; nothing was sent.
    Ignored,
    /// Validation failed; nothing was sent.
    Rejected(SubmitError),
    /// The spreadsheet is ready.
    Succeeded(DownloadArtifact),
    /// The request failed; the session is resubmittable.
    Failed(SubmitError),
    /// The response arrived after its cycle was superseded and was discarded.
    Superseded,
}

impl SubmitOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmitOutcome::Succeeded(_))
    }

    /// The error for `Rejected` / `Failed` outcomes.
    pub fn error(&self) -> Option<&SubmitError> {
        match self {
            SubmitOutcome::Rejected(e) | SubmitOutcome::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Owns the upload session and runs submission cycles against the service.
pub struct SubmissionController {
    config: ClientConfig,
    transport: Arc<dyn UploadTransport>,
    session: Mutex<UploadSession>,
    store: DownloadStore,
    observer: ObserverHandle,
}

impl SubmissionController {
    /// Controller talking HTTP to `config.base_url`.
    pub fn new(config: ClientConfig) -> Result<Self, Pdf2XlsxError> {
        let transport = HttpTransport::new(&config)?;
        info!("Extraction service endpoint: {}", transport.upload_url());
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Controller using a caller-supplied transport.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn UploadTransport>) -> Self {
        let observer = config
            .observer
            .clone()
            .unwrap_or_else(|| Arc::new(NoopObserver));
        Self {
            config,
            transport,
            session: Mutex::new(UploadSession::new()),
            store: DownloadStore::new(),
            observer,
        }
    }

    fn with_session<R>(&self, f: impl FnOnce(&mut UploadSession) -> R) -> R {
        let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut session)
    }

    fn notify(&self) {
        let view = self.view();
        self.observer.on_state_change(&view);
    }

    // ── Read side ────────────────────────────────────────────────────────

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Current presentation view.
    pub fn view(&self) -> SessionView {
        self.with_session(|s| SessionView::of(s))
    }

    pub fn phase(&self) -> Phase {
        self.with_session(|s| s.phase())
    }

    /// The spreadsheet from the last successful cycle, if the session is `Succeeded`.
    pub fn download(&self) -> Option<DownloadArtifact> {
        self.with_session(|s| s.download().map(|h| h.artifact()))
    }

    /// Registry of live artifacts; at most one entry once a cycle settles.
    pub fn download_store(&self) -> &DownloadStore {
        &self.store
    }

    // ── Input events ─────────────────────────────────────────────────────

    pub fn set_pdf(&self, file: Option<SourceFile>) {
        if let Some(ref f) = file {
            f.warn_if_unexpected(FileKind::Pdf);
        }
        self.with_session(|s| s.set_pdf(file));
        self.notify();
    }

    pub fn set_spreadsheet(&self, file: Option<SourceFile>) {
        if let Some(ref f) = file {
            f.warn_if_unexpected(FileKind::Spreadsheet);
        }
        self.with_session(|s| s.set_spreadsheet(file));
        self.notify();
    }

    pub fn set_append_mode(&self, append: bool) {
        self.with_session(|s| s.set_append_mode(append));
        self.notify();
    }

    // ── Submission ───────────────────────────────────────────────────────

    /// Run one submission cycle.
    ///
    /// Never returns an error: every failure is recorded in the session and
    /// reported through the outcome, and the session stays resubmittable.
    pub async fn submit(&self) -> SubmitOutcome {
        let Some(prior) = self.with_session(UploadSession::enter_validating) else {
            return SubmitOutcome::Ignored;
        };
        self.notify();

        let request = match self.with_session(|s| s.finish_validation(prior)) {
            Ok(request) => request,
            Err(err) => {
                warn!("Submission rejected: {}", err);
                self.notify();
                return SubmitOutcome::Rejected(err);
            }
        };
        self.notify();

        let cycle = request.cycle;
        let mut guard = CycleGuard {
            controller: self,
            cycle,
            armed: true,
        };
        info!(
            "Cycle {}: submitting '{}' ({} bytes), append={}",
            cycle,
            request.pdf.name(),
            request.pdf.len(),
            request.append
        );
        self.observer.on_request_start(cycle, request.append);

        let start = Instant::now();
        let timeout = self.config.request_timeout;
        let result = match tokio::time::timeout(timeout, self.transport.upload(&request)).await {
            Ok(result) => result,
            Err(_) => Err(SubmitError::Timeout {
                limit_ms: timeout.as_millis() as u64,
            }),
        };
        let elapsed_ms = start.elapsed().as_millis() as u64;
        guard.armed = false;
        self.observer.on_request_complete(cycle, result.is_ok());

        let (completion, outcome) = match result {
            Ok(bytes) => {
                info!("Cycle {}: received {} bytes in {}ms", cycle, bytes.len(), elapsed_ms);
                let handle = self.store.create(bytes);
                let artifact = handle.artifact();
                (
                    self.with_session(|s| s.complete(cycle, Ok(handle))),
                    SubmitOutcome::Succeeded(artifact),
                )
            }
            Err(err) => {
                warn!("Cycle {}: failed after {}ms: {}", cycle, elapsed_ms, err);
                (
                    self.with_session(|s| s.complete(cycle, Err(err.clone()))),
                    SubmitOutcome::Failed(err),
                )
            }
        };

        if completion == Completion::Stale {
            debug!("Cycle {}: response discarded", cycle);
            return SubmitOutcome::Superseded;
        }
        self.notify();
        outcome
    }

    /// Save the current spreadsheet into `dir` as `products_details.xlsx`.
    ///
    /// This is the user-triggered download action; nothing is written until
    /// it is called.
    pub async fn save_download(&self, dir: impl AsRef<Path>) -> Result<PathBuf, Pdf2XlsxError> {
        let artifact = self.download().ok_or(Pdf2XlsxError::NoDownload)?;
        let path = artifact.save_to(dir).await?;
        info!("Saved {} bytes to {}", artifact.len(), path.display());
        Ok(path)
    }
}

/// Completes an in-flight cycle as cancelled if `submit()` is dropped
/// before the response is applied.
struct CycleGuard<'a> {
    controller: &'a SubmissionController,
    cycle: u64,
    armed: bool,
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let ctrl = self.controller;
        let completion = ctrl.with_session(|s| s.complete(self.cycle, Err(SubmitError::Cancelled)));
        warn!("Cycle {}: submit dropped before the service answered", self.cycle);
        ctrl.observer.on_request_complete(self.cycle, false);
        if completion != Completion::Stale {
            ctrl.notify();
        }
    }
}
