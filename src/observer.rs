//! Observer contract for session state changes.
//!
//! Inject an [`Arc<dyn SessionObserver>`] via
//! [`crate::config::ClientConfigBuilder::observer`] to be told whenever the
//! session changes. The presentation layer re-renders from the
//! [`SessionView`] it receives and holds no workflow logic of its own.
//!
//! Notifications are delivered after the controller has released its session
//! lock, so an observer may call back into the controller (for example to
//! read [`crate::controller::SubmissionController::view`]).
//!
//! # Example
//!
//! ```rust
//! use pdf2xlsx::{ClientConfig, SessionObserver, SessionView};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct Redraw {
//!     frames: AtomicUsize,
//! }
//!
//! impl SessionObserver for Redraw {
//!     fn on_state_change(&self, view: &SessionView) {
//!         self.frames.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{:?}: {}", view.phase, view.status_message);
//!     }
//! }
//!
//! let config = ClientConfig::builder()
//!     .observer(Arc::new(Redraw { frames: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use crate::view::SessionView;
use std::sync::Arc;

/// Receives controller notifications.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait SessionObserver: Send + Sync {
    /// Called after every change to the session, with the new view.
    fn on_state_change(&self, view: &SessionView) {
        let _ = view;
    }

    /// Called just before the request for submission cycle `cycle` is sent.
    fn on_request_start(&self, cycle: u64, append: bool) {
        let _ = (cycle, append);
    }

    /// Called when the request for `cycle` has resolved, before the result
    /// is applied to the session.
    fn on_request_complete(&self, cycle: u64, success: bool) {
        let _ = (cycle, success);
    }
}

/// A no-op implementation, used when no observer is configured.
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}

/// Convenience alias matching the type stored in [`crate::config::ClientConfig`].
pub type ObserverHandle = Arc<dyn SessionObserver>;
