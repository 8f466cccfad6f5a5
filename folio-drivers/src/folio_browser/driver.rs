use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Context;
use fantoccini::{Client, ClientBuilder};
use serde_json::json;
use tracing::info;
use webdriver::capabilities::Capabilities;

use folio_common::{FolioError, Result};
use folio_config::ServerConfig;

use crate::folio_browser::session::NotebookSession;
use crate::folio_browser::stealth;

/// Thin wrapper around a `fantoccini` WebDriver client configured for the
/// notebook application: persistent profile, automation-signal suppression,
/// optional headless mode.
pub struct FolioDriver {
    client: Client,
}

impl FolioDriver {
    /// Connect to the configured WebDriver endpoint and start a browser.
    ///
    /// The persistent profile directory is created on first launch so a
    /// manual sign-in survives across runs.
    pub async fn launch(config: &ServerConfig) -> Result<Self> {
        let profile_dir = if config.auth.use_persistent_session {
            let dir = PathBuf::from(config.expanded_profile_dir());
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create profile dir {}", dir.display()))?;
            Some(dir.canonicalize().unwrap_or(dir))
        } else {
            None
        };

        let args = stealth::chrome_args(config, profile_dir.as_deref());

        let mut chrome_opts = HashMap::new();
        chrome_opts.insert("args".to_string(), json!(args));

        let mut caps = Capabilities::new();
        caps.insert("goog:chromeOptions".to_string(), json!(chrome_opts));

        info!(
            target: "browser.driver",
            webdriver_url = %config.webdriver_url,
            headless = config.headless,
            persistent_profile = profile_dir.is_some(),
            "starting browser session"
        );

        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(&config.webdriver_url)
            .await
            .map_err(|e| FolioError::Driver(anyhow::Error::new(e)))?;

        Ok(Self { client })
    }

    /// Hand out a notebook session over this browser. The session clones
    /// the client handle; the driver keeps ownership of the browser.
    pub fn open_notebook_session(&self, config: &ServerConfig) -> Result<NotebookSession> {
        NotebookSession::new(self.client.clone(), config)
    }

    /// Close the underlying browser session.
    pub async fn close(self) -> Result<()> {
        self.client
            .close()
            .await
            .map_err(|e| FolioError::Driver(anyhow::Error::new(e)))?;
        Ok(())
    }
}
