//! Driver layer for notebook chat automation.
//!
//! This crate owns everything that touches a live browser: launching a
//! WebDriver-backed Chrome session with a persistent profile, navigating
//! notebooks, submitting chat messages, and capturing the page snapshots
//! the `folio-core` wait loop consumes.
//!
//! - [`folio_browser::driver::FolioDriver`]: WebDriver client wrapper
//! - [`folio_browser::session::NotebookSession`]: navigation, chat, snapshots
//! - [`folio_browser::stealth`]: launch arguments and automation-signal suppression
pub mod folio_browser;
