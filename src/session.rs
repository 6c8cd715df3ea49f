//! The upload session and its state transitions.
//!
//! [`UploadSession`] is plain owned data. Every transition is a method that
//! mutates it synchronously and performs no I/O, so the whole state machine is
//! testable without a transport or a UI:
//!
//! ```text
//!            submit()                 valid            2xx
//!  Idle ───────────────▶ Validating ────────▶ Submitting ─────▶ Succeeded
//!  Succeeded               │  invalid              │ error / timeout
//!  Failed   ◀──────────────┘ (back to prior)       └──────────────▶ Failed
//! ```
//!
//! The controller is responsible for running the request between
//! [`UploadSession::finish_validation`] and [`UploadSession::complete`].

use crate::download::DownloadHandle;
use crate::error::SubmitError;
use crate::input::{InputSelection, SourceFile};
use crate::messages;
use serde::Serialize;
use tracing::debug;

/// Where the session is in its submission cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Phase {
    /// Nothing submitted yet.
    #[default]
    Idle,
    /// Presence checks are running; transient.
    Validating,
    /// One request is outstanding.
    Submitting,
    /// The last cycle produced a download.
    Succeeded,
    /// The last cycle failed remotely.
    Failed,
}

impl Phase {
    /// `true` while a submit is being processed; further submits are ignored.
    pub fn is_busy(self) -> bool {
        matches!(self, Phase::Validating | Phase::Submitting)
    }
}

/// Everything the transport needs for one cycle, captured at submit time.
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    pub cycle: u64,
    pub pdf: SourceFile,
    pub append: bool,
    /// Present iff `append`.
    pub spreadsheet: Option<SourceFile>,
}

/// Result of feeding a response back into the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The response belonged to the current cycle; the session moved to this phase.
    Applied(Phase),
    /// The response belonged to an older cycle and was dropped.
    Stale,
}

/// The single stateful entity: inputs, phase, messages and the current download.
#[derive(Debug, Default)]
pub struct UploadSession {
    inputs: InputSelection,
    phase: Phase,
    status_message: String,
    error_message: Option<String>,
    download: Option<DownloadHandle>,
    cycle: u64,
}

impl UploadSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inputs(&self) -> &InputSelection {
        &self.inputs
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn download(&self) -> Option<&DownloadHandle> {
        self.download.as_ref()
    }

    /// Id of the most recent cycle that reached `Submitting` (0 before the first).
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    // ── Input collection ─────────────────────────────────────────────────

    /// Replace the selected PDF. Clears any error text.
    pub fn set_pdf(&mut self, file: Option<SourceFile>) {
        self.inputs.pdf = file;
        self.clear_on_input();
    }

    /// Replace the selected spreadsheet. Clears any error text.
    pub fn set_spreadsheet(&mut self, file: Option<SourceFile>) {
        self.inputs.spreadsheet = file;
        self.clear_on_input();
    }

    /// Toggle append mode. A previously chosen spreadsheet is kept but is
    /// ignored while append mode is off.
    pub fn set_append_mode(&mut self, append: bool) {
        self.inputs.append_mode = append;
    }

    fn clear_on_input(&mut self) {
        self.error_message = None;
        // the in-flight request already captured its inputs
        if !self.phase.is_busy() {
            self.status_message.clear();
        }
    }

    // ── Submission cycle ─────────────────────────────────────────────────

    /// Start a submit. Returns the phase to fall back to if validation fails,
    /// or `None` when a submit is already being processed.
    pub fn enter_validating(&mut self) -> Option<Phase> {
        if self.phase.is_busy() {
            debug!("Submit ignored: session is {:?}", self.phase);
            return None;
        }
        let prior = self.phase;
        self.phase = Phase::Validating;
        Some(prior)
    }

    /// Run the presence checks. Must follow [`Self::enter_validating`].
    ///
    /// On failure the session returns to `prior` with the error text set and
    /// nothing else changes. On success a new cycle starts: the previous
    /// download is released and the returned request is the one to send.
    pub fn finish_validation(&mut self, prior: Phase) -> Result<SubmissionRequest, SubmitError> {
        let checked = match (&self.inputs.pdf, self.inputs.append_mode, &self.inputs.spreadsheet) {
            (None, _, _) => Err(SubmitError::MissingPdf),
            (Some(_), true, None) => Err(SubmitError::MissingSpreadsheet),
            (Some(pdf), append, spreadsheet) => Ok((
                pdf.clone(),
                append,
                spreadsheet.as_ref().filter(|_| append).cloned(),
            )),
        };

        let (pdf, append, spreadsheet) = match checked {
            Ok(parts) => parts,
            Err(err) => {
                self.phase = prior;
                self.error_message = Some(err.user_message().to_string());
                return Err(err);
            }
        };

        if let Some(old) = self.download.take() {
            debug!("Releasing download {} from cycle {}", old.id(), self.cycle);
            old.release();
        }

        self.cycle += 1;
        self.phase = Phase::Submitting;
        self.status_message = messages::SUBMITTING.to_string();
        self.error_message = None;

        Ok(SubmissionRequest {
            cycle: self.cycle,
            pdf,
            append,
            spreadsheet,
        })
    }

    /// Apply the outcome of the request sent for `cycle`.
    ///
    /// Responses for any cycle other than the current one, or arriving when
    /// the session is not `Submitting`, are dropped; a dropped handle is
    /// released with it.
    pub fn complete(
        &mut self,
        cycle: u64,
        result: Result<DownloadHandle, SubmitError>,
    ) -> Completion {
        if cycle != self.cycle || self.phase != Phase::Submitting {
            debug!(
                "Dropping stale response for cycle {} (current {}, {:?})",
                cycle, self.cycle, self.phase
            );
            return Completion::Stale;
        }

        match result {
            Ok(handle) => {
                if let Some(old) = self.download.take() {
                    old.release();
                }
                self.download = Some(handle);
                self.phase = Phase::Succeeded;
                self.status_message = messages::SUCCEEDED.to_string();
                self.error_message = None;
            }
            Err(err) => {
                self.phase = Phase::Failed;
                self.status_message.clear();
                self.error_message = Some(err.user_message().to_string());
            }
        }
        Completion::Applied(self.phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::DownloadStore;

    fn pdf() -> SourceFile {
        SourceFile::from_bytes("catalogue.pdf", b"%PDF-1.7".to_vec())
    }

    fn xlsx() -> SourceFile {
        SourceFile::from_bytes("existing.xlsx", b"PK\x03\x04".to_vec())
    }

    fn begin(session: &mut UploadSession) -> Result<SubmissionRequest, SubmitError> {
        let prior = session.enter_validating().expect("not busy");
        session.finish_validation(prior)
    }

    #[test]
    fn new_session_is_idle_and_empty() {
        let s = UploadSession::new();
        assert_eq!(s.phase(), Phase::Idle);
        assert!(s.status_message().is_empty());
        assert!(s.error_message().is_none());
        assert!(s.download().is_none());
        assert_eq!(s.cycle(), 0);
    }

    #[test]
    fn missing_pdf_blocks_and_returns_to_prior() {
        let mut s = UploadSession::new();
        let err = begin(&mut s).unwrap_err();
        assert_eq!(err, SubmitError::MissingPdf);
        assert_eq!(s.phase(), Phase::Idle);
        assert_eq!(s.error_message(), Some(messages::MISSING_PDF));
        assert_eq!(s.cycle(), 0);
    }

    #[test]
    fn append_without_spreadsheet_has_distinct_error() {
        let mut s = UploadSession::new();
        s.set_pdf(Some(pdf()));
        s.set_append_mode(true);
        let err = begin(&mut s).unwrap_err();
        assert_eq!(err, SubmitError::MissingSpreadsheet);
        assert_eq!(s.error_message(), Some(messages::MISSING_SPREADSHEET));
        assert_ne!(messages::MISSING_SPREADSHEET, messages::MISSING_PDF);
        assert_eq!(s.phase(), Phase::Idle);
    }

    #[test]
    fn missing_pdf_wins_over_missing_spreadsheet() {
        let mut s = UploadSession::new();
        s.set_append_mode(true);
        assert_eq!(begin(&mut s).unwrap_err(), SubmitError::MissingPdf);
    }

    #[test]
    fn non_append_request_carries_no_spreadsheet() {
        let mut s = UploadSession::new();
        s.set_pdf(Some(pdf()));
        let req = begin(&mut s).unwrap();
        assert_eq!(req.cycle, 1);
        assert!(!req.append);
        assert!(req.spreadsheet.is_none());
        assert_eq!(req.pdf.name(), "catalogue.pdf");
        assert_eq!(s.phase(), Phase::Submitting);
        assert_eq!(s.status_message(), messages::SUBMITTING);
    }

    #[test]
    fn toggling_append_off_makes_spreadsheet_irrelevant() {
        let mut s = UploadSession::new();
        s.set_pdf(Some(pdf()));
        s.set_append_mode(true);
        s.set_spreadsheet(Some(xlsx()));
        s.set_append_mode(false);

        let req = begin(&mut s).unwrap();
        assert!(!req.append);
        assert!(req.spreadsheet.is_none());
        // still selected, just not sent
        assert!(s.inputs().spreadsheet().is_some());
    }

    #[test]
    fn append_request_carries_spreadsheet() {
        let mut s = UploadSession::new();
        s.set_pdf(Some(pdf()));
        s.set_append_mode(true);
        s.set_spreadsheet(Some(xlsx()));
        let req = begin(&mut s).unwrap();
        assert!(req.append);
        assert_eq!(req.spreadsheet.unwrap().name(), "existing.xlsx");
    }

    #[test]
    fn busy_session_ignores_submit() {
        let mut s = UploadSession::new();
        s.set_pdf(Some(pdf()));
        begin(&mut s).unwrap();
        assert!(s.enter_validating().is_none());
        assert_eq!(s.phase(), Phase::Submitting);
        assert_eq!(s.cycle(), 1);
    }

    #[test]
    fn success_stores_handle_and_resubmit_releases_it() {
        let store = DownloadStore::new();
        let mut s = UploadSession::new();
        s.set_pdf(Some(pdf()));

        let req = begin(&mut s).unwrap();
        let first = store.create(b"one".to_vec());
        let first_id = first.id();
        assert_eq!(s.complete(req.cycle, Ok(first)), Completion::Applied(Phase::Succeeded));
        assert_eq!(s.status_message(), messages::SUCCEEDED);
        assert_eq!(s.download().map(|d| d.id()), Some(first_id));

        let req = begin(&mut s).unwrap();
        assert!(!store.is_live(first_id), "old handle released on new cycle");
        assert!(s.download().is_none());

        let second = store.create(b"two".to_vec());
        s.complete(req.cycle, Ok(second));
        assert_eq!(store.live_count(), 1);
    }

    #[test]
    fn rejected_resubmit_keeps_existing_download() {
        let store = DownloadStore::new();
        let mut s = UploadSession::new();
        s.set_pdf(Some(pdf()));
        let req = begin(&mut s).unwrap();
        s.complete(req.cycle, Ok(store.create(b"sheet".to_vec())));

        s.set_append_mode(true);
        assert_eq!(begin(&mut s).unwrap_err(), SubmitError::MissingSpreadsheet);
        assert_eq!(s.phase(), Phase::Succeeded);
        assert!(s.download().is_some());
        assert_eq!(store.live_count(), 1);
    }

    #[test]
    fn failure_sets_generic_message_and_keeps_inputs() {
        let mut s = UploadSession::new();
        s.set_pdf(Some(pdf()));
        let req = begin(&mut s).unwrap();
        let completion = s.complete(req.cycle, Err(SubmitError::Timeout { limit_ms: 10 }));

        assert_eq!(completion, Completion::Applied(Phase::Failed));
        assert_eq!(s.error_message(), Some(messages::SUBMIT_FAILED));
        assert!(s.status_message().is_empty());
        assert!(s.inputs().pdf().is_some());
        assert!(begin(&mut s).is_ok(), "failed session is resubmittable");
    }

    #[test]
    fn input_clears_error_but_not_phase() {
        let mut s = UploadSession::new();
        s.set_pdf(Some(pdf()));
        let req = begin(&mut s).unwrap();
        s.complete(
            req.cycle,
            Err(SubmitError::HttpStatus {
                status: 500,
                detail: None,
            }),
        );
        assert_eq!(s.phase(), Phase::Failed);

        s.set_pdf(Some(pdf()));
        assert_eq!(s.phase(), Phase::Failed);
        assert!(s.error_message().is_none());
    }

    #[test]
    fn input_during_submit_keeps_progress_text() {
        let mut s = UploadSession::new();
        s.set_pdf(Some(pdf()));
        begin(&mut s).unwrap();
        s.set_spreadsheet(Some(xlsx()));
        assert_eq!(s.status_message(), messages::SUBMITTING);
    }

    #[test]
    fn stale_response_is_dropped_and_released() {
        let store = DownloadStore::new();
        let mut s = UploadSession::new();
        s.set_pdf(Some(pdf()));
        let req = begin(&mut s).unwrap();

        let stale = store.create(b"old".to_vec());
        assert_eq!(s.complete(req.cycle + 7, Ok(stale)), Completion::Stale);
        assert_eq!(s.phase(), Phase::Submitting);
        assert_eq!(store.live_count(), 0);

        s.complete(req.cycle, Err(SubmitError::Timeout { limit_ms: 1 }));
        // late duplicate for an already-resolved cycle
        assert_eq!(
            s.complete(req.cycle, Ok(store.create(b"late".to_vec()))),
            Completion::Stale
        );
        assert_eq!(s.phase(), Phase::Failed);
        assert_eq!(store.live_count(), 0);
    }
}
