//! Configuration for the Folio workspace: file + environment overlays.
//!
//! A [`ServerConfig`] describes one automation target (notebook URL, browser
//! profile, wait tuning). Configs load through [`ConfigLoader`], which merges
//! an optional JSON/TOML file with `FOLIO_`-prefixed environment variables
//! and expands `${VAR}` / `~` placeholders, and save back as pretty JSON so
//! `folio init` can bootstrap a working file.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

const MAX_PLACEHOLDER_EXPANSION_DEPTH: usize = 8;

/// Errors surfaced by config load/save.
#[derive(thiserror::Error, Debug)]
pub enum ConfigFileError {
    #[error("config load error: {0}")]
    Load(#[from] ConfigError),

    #[error("config encode error: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("config write error: {0}")]
    Write(#[from] std::io::Error),
}

/// Browser authentication/profile settings.
///
/// Persistent profiles let a previously signed-in Chrome profile carry the
/// session, so no credentials ever pass through this system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Chrome user-data directory backing the persistent session.
    #[serde(default = "default_profile_dir")]
    pub profile_dir: String,
    /// Reuse the profile directory across runs.
    #[serde(default = "default_true")]
    pub use_persistent_session: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            profile_dir: default_profile_dir(),
            use_persistent_session: true,
        }
    }
}

/// Top-level configuration for one automation target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Root URL of the notebook application.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Notebook opened when none is named explicitly.
    #[serde(default)]
    pub default_notebook_id: Option<String>,
    /// Run the browser without a visible window.
    #[serde(default)]
    pub headless: bool,
    /// Page-load / navigation timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Upper bound for one streamed-response wait, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub streaming_timeout_secs: u64,
    /// Consecutive identical polls required before a response counts as done.
    #[serde(default = "default_stability_checks")]
    pub response_stability_checks: u32,
    /// WebDriver endpoint the browser session connects through.
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,
    #[serde(default)]
    pub auth: AuthConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            default_notebook_id: None,
            headless: false,
            timeout_secs: default_timeout_secs(),
            streaming_timeout_secs: default_timeout_secs(),
            response_stability_checks: default_stability_checks(),
            webdriver_url: default_webdriver_url(),
            auth: AuthConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Profile directory with `~` and `${VAR}` placeholders resolved.
    pub fn expanded_profile_dir(&self) -> String {
        expand_placeholders(&self.auth.profile_dir)
    }

    /// Write the config as pretty JSON, creating parent directories.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let body = serde_json::to_string_pretty(self)?;
        std::fs::write(path, body)?;
        Ok(())
    }
}

fn default_base_url() -> String {
    "https://notebooklm.google.com".into()
}
fn default_webdriver_url() -> String {
    "http://localhost:9515".into()
}
fn default_profile_dir() -> String {
    "./chrome_profile_folio".into()
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_stability_checks() -> u32 {
    3
}
fn default_true() -> bool {
    true
}

/// Expand `~` and `${VAR}` in a single string, capped against cycles.
fn expand_placeholders(raw: &str) -> String {
    let mut cur = raw.to_string();
    for _ in 0..MAX_PLACEHOLDER_EXPANSION_DEPTH {
        let expanded = shellexpand::full(&cur)
            .map(|cow| cow.into_owned())
            .unwrap_or_else(|_| cur.clone());
        if expanded == cur {
            break;
        }
        cur = expanded;
    }
    cur
}

fn expand_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') || s.starts_with('~') {
                *s = expand_placeholders(s);
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_in_value),
        _ => {}
    }
}

/// Builder hiding the `config` crate wiring (file + `FOLIO_` env overrides).
pub struct ConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Start with the environment overlay only; defaults fill the rest.
    ///
    /// ```
    /// use folio_config::ConfigLoader;
    ///
    /// let cfg = ConfigLoader::new().load().expect("defaults load");
    /// assert_eq!(cfg.response_stability_checks, 3);
    /// assert_eq!(cfg.base_url, "https://notebooklm.google.com");
    /// ```
    pub fn new() -> Self {
        let builder = Config::builder().add_source(
            Environment::with_prefix("FOLIO")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );
        Self { builder }
    }

    /// Attach a config file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self.builder.add_source(File::from(path.as_ref()));
        self
    }

    /// Same, but a missing file falls through to env + defaults.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline JSON snippet (tests, CLI overrides).
    pub fn with_json_str(mut self, json: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(json, config::FileFormat::Json));
        self
    }

    /// Merge the sources, expand placeholders, and materialise the config.
    pub fn load(self) -> Result<ServerConfig, ConfigFileError> {
        let cfg = self.builder.build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_in_value(&mut v);

        let typed: ServerConfig = serde_json::from_value(v)?;
        Ok(typed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_are_complete() {
        let cfg = ConfigLoader::new().load().unwrap();
        assert_eq!(cfg.base_url, "https://notebooklm.google.com");
        assert_eq!(cfg.timeout_secs, 60);
        assert_eq!(cfg.streaming_timeout_secs, 60);
        assert_eq!(cfg.response_stability_checks, 3);
        assert!(!cfg.headless);
        assert!(cfg.auth.use_persistent_session);
        assert_eq!(cfg.default_notebook_id, None);
    }

    #[test]
    fn inline_json_overrides_defaults() {
        let cfg = ConfigLoader::new()
            .with_json_str(r#"{ "headless": true, "default_notebook_id": "abc123" }"#)
            .load()
            .unwrap();
        assert!(cfg.headless);
        assert_eq!(cfg.default_notebook_id.as_deref(), Some("abc123"));
        // untouched fields keep their defaults
        assert_eq!(cfg.timeout_secs, 60);
    }

    #[test]
    fn env_overlay_wins() {
        temp_env::with_var("FOLIO_WEBDRIVER_URL", Some("http://localhost:4444"), || {
            let cfg = ConfigLoader::new().load().unwrap();
            assert_eq!(cfg.webdriver_url, "http://localhost:4444");
        });
    }

    #[test]
    fn nested_env_overlay_reaches_auth() {
        temp_env::with_var("FOLIO_AUTH__PROFILE_DIR", Some("/tmp/profile"), || {
            let cfg = ConfigLoader::new().load().unwrap();
            assert_eq!(cfg.auth.profile_dir, "/tmp/profile");
        });
    }

    #[test]
    fn placeholders_expand_in_loaded_values() {
        temp_env::with_var("FOLIO_TEST_PROFILE_ROOT", Some("/data/profiles"), || {
            let cfg = ConfigLoader::new()
                .with_json_str(
                    r#"{ "auth": { "profile_dir": "${FOLIO_TEST_PROFILE_ROOT}/main" } }"#,
                )
                .load()
                .unwrap();
            assert_eq!(cfg.auth.profile_dir, "/data/profiles/main");
        });
    }

    #[test]
    fn unknown_placeholders_are_left_as_is() {
        let mut v = json!("keep-${FOLIO_DOES_NOT_EXIST}");
        expand_in_value(&mut v);
        assert_eq!(v, json!("keep-${FOLIO_DOES_NOT_EXIST}"));
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("folio-config.json");

        let mut cfg = ServerConfig::default();
        cfg.default_notebook_id = Some("nb-42".into());
        cfg.headless = true;
        cfg.response_stability_checks = 5;
        cfg.save_json(&path).unwrap();

        let loaded = ConfigLoader::new().with_file(&path).load().unwrap();
        assert_eq!(loaded.default_notebook_id.as_deref(), Some("nb-42"));
        assert!(loaded.headless);
        assert_eq!(loaded.response_stability_checks, 5);
    }

    #[test]
    fn missing_optional_file_falls_back_to_defaults() {
        let cfg = ConfigLoader::new()
            .with_optional_file("/definitely/not/here/folio.json")
            .load()
            .unwrap();
        assert_eq!(cfg.timeout_secs, 60);
    }
}
