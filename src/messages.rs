//! User-facing text for every session state.
//!
//! Centralising the strings here keeps the controller free of copy and lets
//! tests compare against the exact text the user sees. Transport diagnostics
//! never reach these strings; they are logged instead.

/// Shown when `submit()` is called without a PDF.
pub const MISSING_PDF: &str = "Please upload a PDF.";

/// Shown when append mode is on and no spreadsheet has been chosen.
pub const MISSING_SPREADSHEET: &str = "Please upload an Excel file to append.";

/// Status while the single outstanding request is in flight.
pub const SUBMITTING: &str = "Processing PDF and extracting product details...";

/// Status once the spreadsheet is ready to be saved.
pub const SUCCEEDED: &str = "PDF processed successfully. Click to download the Excel file.";

/// Generic failure text for any non-success response, network error or timeout.
pub const SUBMIT_FAILED: &str = "Failed to process the PDF. Please try again.";
