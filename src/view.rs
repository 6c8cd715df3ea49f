//! Presentation view of a session.
//!
//! [`SessionView::of`] is the whole contract between the workflow and any
//! front end: a pure function of the current [`UploadSession`]. Front ends
//! render a view and forward user actions to the controller; they never
//! decide what is enabled or which message to show.

use crate::download::DownloadLink;
use crate::session::{Phase, UploadSession};
use serde::Serialize;

/// Everything a front end needs to draw the current state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    pub phase: Phase,
    pub status_message: String,
    pub error_message: Option<String>,
    pub pdf_name: Option<String>,
    pub append_mode: bool,
    pub spreadsheet_name: Option<String>,
    /// The spreadsheet picker is only relevant in append mode.
    pub show_spreadsheet_picker: bool,
    /// A request is being prepared or is in flight.
    pub busy: bool,
    /// The submit trigger should be enabled.
    pub submit_enabled: bool,
    /// Present only when a spreadsheet is ready to save.
    pub download: Option<DownloadLink>,
}

impl SessionView {
    pub fn of(session: &UploadSession) -> Self {
        let inputs = session.inputs();
        let busy = session.phase().is_busy();
        Self {
            phase: session.phase(),
            status_message: session.status_message().to_string(),
            error_message: session.error_message().map(str::to_string),
            pdf_name: inputs.pdf().map(|f| f.name().to_string()),
            append_mode: inputs.append_mode(),
            spreadsheet_name: inputs.spreadsheet().map(|f| f.name().to_string()),
            show_spreadsheet_picker: inputs.append_mode(),
            busy,
            submit_enabled: !busy,
            download: session.download().map(DownloadLink::from),
        }
    }
}
