//! Streamed-response capture for a notebook/chat web surface.
//!
//! The chat application renders an answer incrementally; nothing in the DOM
//! announces "done". This crate decides completion by polling: capture a
//! [`snapshot::Snapshot`] of the page, pull the best response candidate out
//! of it ([`extract`]), strip UI chrome and echoed user input ([`clean`]),
//! and watch successive polls for text stability plus a clear busy
//! indicator ([`monitor`]).
//!
//! The crate owns no browser. A [`snapshot::SnapshotSource`] (implemented by
//! `folio-drivers`) hands it page state; everything here is deterministic
//! over that boundary, which is also what makes the protocol testable with
//! scripted sources.

pub mod clean;
pub mod extract;
pub mod monitor;
pub mod snapshot;

pub use clean::Cleaner;
pub use extract::{current_response, extract_response, NO_CONTENT_SENTINEL, RESPONSE_SELECTORS};
pub use monitor::{
    ResponseWaiter, WaitOptions, WaitOutcome, BUSY_INDICATOR_SELECTORS, POLL_INTERVAL,
    RESPONSE_TIMEOUT_SENTINEL,
};
pub use snapshot::{Snapshot, SnapshotSource, StaticSnapshot};

/// Length in characters, not bytes; thresholds below are prose-sized.
pub(crate) fn char_len(s: &str) -> usize {
    s.chars().count()
}
