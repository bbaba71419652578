//! # Matchday Gate
//!
//! Acquisition frontends for gate-entry ticket validation. Two ways for a
//! code to arrive - typed into a form or decoded off a camera frame - and
//! one path after that:
//!
//! ```text
//! camera frames ──► FrameDecoder ──┐
//!                                  ├──► ScanSession ──► Validator ──► ledger
//! typed input ─────────────────────┘    (debounce)        │
//!                                                         ▼
//!                                        feedback cue + history entry
//! ```
//!
//! - [`session`] - the per-operator debounce filter
//! - [`gatekeeper`] - the shared entry point: validate, signal, remember
//! - [`manual`] - the keyboard frontend
//! - [`camera`] - the continuous camera frontend and its state machine
//! - [`feedback`] - tones and haptics, best-effort by contract
//! - [`history`] - session-scoped attempts and running counters
//!
//! Device and audio hardware sit behind traits throughout, so everything
//! here runs unmodified in tests against scripted doubles.

pub mod camera;
pub mod feedback;
pub mod gatekeeper;
pub mod history;
pub mod manual;
pub mod session;

// Re-export the types frontends hand around
pub use camera::{CameraPhase, CameraScanner, DeviceError, ScannerHandle};
pub use feedback::{FeedbackCue, OperatorFeedback};
pub use gatekeeper::{GateOutcome, Gatekeeper, ScanReport};
pub use history::{HistoryTotals, ScanHistory};
pub use manual::ManualEntry;
pub use session::{Admission, ScanSession, SuppressReason};
