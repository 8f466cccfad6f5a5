//! Centralised tracing setup for binaries and integration tests.
//!
//! Call [`init_logging`] once near process start. Later calls are no-ops
//! that hand back the originally resolved log file path (if any), so tests
//! and subcommands can all call it without coordination.

use std::path::PathBuf;
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();
static LOG_STATE: OnceLock<Option<PathBuf>> = OnceLock::new();

/// Configuration passed to [`init_logging`].
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Logical component name, used for the log file name.
    pub app_name: &'static str,
    /// Directory for the rolling file sink. `None` disables file output.
    /// `FOLIO_LOG_DIR` overrides an unset directory.
    pub log_dir: Option<PathBuf>,
    /// Duplicate events to stderr.
    pub emit_stderr: bool,
    /// Filter applied when `RUST_LOG` is unset.
    pub default_filter: &'static str,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            app_name: "folio",
            log_dir: None,
            emit_stderr: true,
            default_filter: "info",
        }
    }
}

/// Initialise the global tracing subscriber.
///
/// Returns the log file path when a file sink is active. Subsequent calls
/// are cheap and return the path resolved by the first call.
pub fn init_logging(config: LogConfig) -> anyhow::Result<Option<PathBuf>> {
    if let Some(state) = LOG_STATE.get() {
        return Ok(state.clone());
    }

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.default_filter));

    let dir = config.log_dir.or_else(|| {
        std::env::var("FOLIO_LOG_DIR")
            .ok()
            .filter(|raw| !raw.trim().is_empty())
            .map(PathBuf::from)
    });

    let mut file_path = None;
    let file_layer = match dir {
        Some(dir) => {
            std::fs::create_dir_all(&dir)?;
            let file_name = format!("{}.log", config.app_name);
            file_path = Some(dir.join(&file_name));
            let (writer, guard) = tracing_appender::non_blocking(rolling::daily(dir, file_name));
            let _ = LOG_GUARD.set(guard);
            Some(fmt::layer().with_writer(writer).with_ansi(false))
        }
        None => None,
    };

    let stderr_layer = config
        .emit_stderr
        .then(|| fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("tracing setup failed: {e}"))?;

    let _ = LOG_STATE.set(file_path.clone());
    Ok(file_path)
}
