use std::time::Duration;

use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::error::CmdError;
use fantoccini::key::Key;
use fantoccini::{Client, Locator};
use tracing::{debug, info, warn};
use url::Url;

use folio_common::{FolioError, Result};
use folio_config::ServerConfig;
use folio_core::extract::{TAIL_SCAN_LIMIT, TAIL_SELECTOR};
use folio_core::{
    current_response, Cleaner, ResponseWaiter, Snapshot, SnapshotSource, StaticSnapshot,
    BUSY_INDICATOR_SELECTORS, RESPONSE_SELECTORS,
};

use crate::folio_browser::stealth;

/// Chat input candidates, most specific first. Real notebook frontends
/// rename their hooks often, so the tail entries are deliberately loose.
const CHAT_INPUT_SELECTORS: &[&str] = &[
    "textarea[placeholder*='Ask']",
    "textarea[data-testid*='chat']",
    "textarea[aria-label*='message']",
    "[contenteditable='true'][role='textbox']",
    "input[type='text'][placeholder*='Ask']",
    "textarea:not([disabled])",
];

/// How long each chat-input candidate selector gets before falling through.
const INPUT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// One notebook tab: navigation, chat submission, and page snapshots.
///
/// Authentication state and the current notebook are explicit fields here,
/// never process-wide globals; callers serialize operations per session.
pub struct NotebookSession {
    client: Client,
    base_url: Url,
    page_timeout: Duration,
    current_notebook: Option<String>,
    authenticated: bool,
}

impl NotebookSession {
    pub(crate) fn new(client: Client, config: &ServerConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| FolioError::Config(format!("invalid base_url: {e}")))?;
        Ok(Self {
            client,
            base_url,
            page_timeout: Duration::from_secs(config.timeout_secs),
            current_notebook: config.default_notebook_id.clone(),
            authenticated: false,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn current_notebook(&self) -> Option<&str> {
        self.current_notebook.as_deref()
    }

    fn notebook_url(&self, notebook_id: &str) -> String {
        format!(
            "{}/notebook/{}",
            self.base_url.as_str().trim_end_matches('/'),
            notebook_id
        )
    }

    /// Navigate to the configured surface and read authentication state off
    /// the landed URL. No credentials are ever typed; a persistent profile
    /// that was signed into manually carries the session.
    pub async fn authenticate(&mut self) -> Result<bool> {
        let target = match &self.current_notebook {
            Some(id) => self.notebook_url(id),
            None => self.base_url.to_string(),
        };

        info!(target: "browser.session", url = %target, "checking authentication state");
        self.client
            .goto(&target)
            .await
            .map_err(|e| FolioError::Auth(format!("navigation failed: {e}")))?;
        self.wait_for_body()
            .await
            .map_err(|_| FolioError::Auth("page load timed out during authentication".into()))?;
        let _ = self.client.execute(stealth::WEBDRIVER_EVASION, vec![]).await;

        let landed = self
            .client
            .current_url()
            .await
            .map_err(|e| FolioError::Auth(format!("could not read current url: {e}")))?;

        if landed.as_str().contains("signin") || landed.as_str().contains("accounts.google.com") {
            warn!(
                target: "browser.session",
                "authentication required; sign in manually in the browser profile"
            );
            self.authenticated = false;
        } else {
            info!(target: "browser.session", "authenticated via persistent session");
            self.authenticated = true;
        }
        Ok(self.authenticated)
    }

    /// Open a notebook by id and record it as current. Returns the landed URL.
    pub async fn navigate_to_notebook(&mut self, notebook_id: &str) -> Result<String> {
        let url = self.notebook_url(notebook_id);
        info!(target: "browser.session", %url, "opening notebook");

        self.client.goto(&url).await.map_err(|e| {
            FolioError::Navigation(format!("failed to open notebook {notebook_id}: {e}"))
        })?;
        self.wait_for_body().await.map_err(|_| {
            FolioError::Navigation(format!("timed out opening notebook {notebook_id}"))
        })?;
        let _ = self.client.execute(stealth::WEBDRIVER_EVASION, vec![]).await;

        self.current_notebook = Some(notebook_id.to_string());
        self.client
            .current_url()
            .await
            .map(|u| u.to_string())
            .map_err(|e| FolioError::Navigation(e.to_string()))
    }

    /// Type a message into the chat input and submit it with Enter.
    pub async fn send_message(&mut self, message: &str) -> Result<()> {
        if !self.authenticated {
            return Err(FolioError::Chat(
                "not authenticated or browser not ready".into(),
            ));
        }

        // make sure a stale tab isn't pointed somewhere else
        if let Some(id) = self.current_notebook.clone() {
            let here = self
                .client
                .current_url()
                .await
                .map_err(|e| FolioError::Chat(e.to_string()))?;
            if !here.as_str().contains(&format!("notebook/{id}")) {
                self.navigate_to_notebook(&id).await?;
            }
        }

        let input = self.find_chat_input().await?;
        input
            .clear()
            .await
            .map_err(|e| FolioError::Chat(format!("could not clear chat input: {e}")))?;
        input
            .send_keys(message)
            .await
            .map_err(|e| FolioError::Chat(format!("could not type message: {e}")))?;
        input
            .send_keys(&char::from(Key::Enter).to_string())
            .await
            .map_err(|e| FolioError::Chat(format!("failed to submit message: {e}")))?;

        info!(
            target: "browser.session",
            chars = message.chars().count(),
            "message submitted"
        );
        Ok(())
    }

    /// One-shot read of the current answer text, no waiting.
    pub async fn current_response_text(&self) -> Result<String> {
        let snapshot = self.snapshot().await?;
        Ok(current_response(snapshot.as_ref(), &Cleaner::default()))
    }

    /// Run the streamed-response wait loop against this session and return
    /// the flat string surface (text or sentinel).
    pub async fn get_response(&self, waiter: &ResponseWaiter) -> Result<String> {
        let outcome = waiter.await_completion(self).await?;
        Ok(outcome.into_text())
    }

    async fn wait_for_body(&self) -> std::result::Result<Element, CmdError> {
        self.client
            .wait()
            .at_most(self.page_timeout)
            .for_element(Locator::Css("body"))
            .await
    }

    async fn find_chat_input(&self) -> Result<Element> {
        for &selector in CHAT_INPUT_SELECTORS {
            match self
                .client
                .wait()
                .at_most(INPUT_PROBE_TIMEOUT)
                .for_element(Locator::Css(selector))
                .await
            {
                Ok(element) => {
                    info!(target: "browser.session", selector, "found chat input");
                    return Ok(element);
                }
                Err(_) => continue,
            }
        }
        Err(FolioError::Chat("could not find chat input element".into()))
    }

    async fn texts_for(&self, selector: &str) -> std::result::Result<Vec<String>, CmdError> {
        let elements = self.client.find_all(Locator::Css(selector)).await?;
        let mut texts = Vec::with_capacity(elements.len());
        for element in elements {
            texts.push(element.text().await?);
        }
        Ok(texts)
    }
}

#[async_trait]
impl SnapshotSource for NotebookSession {
    async fn snapshot(&self) -> Result<Box<dyn Snapshot + Send>> {
        // a dead session must abort the wait loop, not read as an empty page
        self.client
            .current_url()
            .await
            .map_err(|e| FolioError::Chat(format!("browser session unavailable: {e}")))?;

        let mut snap = StaticSnapshot::new();
        let mut candidates = 0usize;

        for &selector in RESPONSE_SELECTORS {
            match self.texts_for(selector).await {
                Ok(texts) => {
                    candidates += texts.iter().filter(|t| !t.trim().is_empty()).count();
                    snap.insert(selector, texts);
                }
                Err(e) => debug!(
                    target: "browser.session",
                    selector,
                    error = %e,
                    "selector query failed; treating as no candidates"
                ),
            }
        }

        // the trailing-element scan is only consulted when nothing matched,
        // so skip the expensive generic query otherwise
        if candidates == 0 {
            match self.client.find_all(Locator::Css(TAIL_SELECTOR)).await {
                Ok(elements) => {
                    let skip = elements.len().saturating_sub(TAIL_SCAN_LIMIT);
                    for element in &elements[skip..] {
                        if let Ok(text) = element.text().await {
                            snap.push_tail(text);
                        }
                    }
                }
                Err(e) => debug!(
                    target: "browser.session",
                    error = %e,
                    "trailing-element query failed; snapshot stays empty"
                ),
            }
        }

        Ok(Box::new(snap))
    }

    async fn busy_indicator_visible(&self) -> Result<bool> {
        for &selector in BUSY_INDICATOR_SELECTORS {
            let elements = self
                .client
                .find_all(Locator::Css(selector))
                .await
                .map_err(|e| FolioError::Chat(e.to_string()))?;
            for element in elements {
                if element.is_displayed().await.unwrap_or(false) {
                    debug!(target: "browser.session", selector, "streaming indicator visible");
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}
