//! Common types shared across Folio crates.
//!
//! This crate defines the shared error taxonomy and the centralised
//! tracing/logging initialiser. It is intentionally lightweight so every
//! crate in the workspace can depend on it without heavy transitive costs.
//!
//! - [`FolioError`] and [`Result`]: shared error handling
//! - [`observability`]: tracing setup for binaries and tests

pub mod observability;

/// Error types used across the Folio system.
#[derive(thiserror::Error, Debug)]
pub enum FolioError {
    /// The browser session is not authenticated, or authentication state
    /// could not be established.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Sending a chat message or reading the chat surface failed.
    #[error("Chat error: {0}")]
    Chat(String),

    /// Navigating to a notebook failed or timed out.
    #[error("Navigation error: {0}")]
    Navigation(String),

    /// The underlying WebDriver session reported an error.
    #[error("Driver error: {0}")]
    Driver(#[from] anyhow::Error),

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation exceeded the configured timeout.
    #[error("Timeout occurred")]
    Timeout,
}

/// Convenient alias for results that use [`FolioError`].
pub type Result<T> = std::result::Result<T, FolioError>;
