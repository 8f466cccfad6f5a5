use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use folio_common::observability::{init_logging, LogConfig};
use folio_config::{ConfigLoader, ServerConfig};
use folio_core::{ResponseWaiter, WaitOptions};
use folio_drivers::folio_browser::driver::FolioDriver;
use folio_drivers::folio_browser::session::NotebookSession;

#[derive(Parser)]
#[command(name = "folio", version, about = "Drive a notebook chat surface from the terminal")]
struct Cli {
    /// Config file; a missing file falls back to env overrides + defaults.
    #[arg(long, global = true, default_value = "folio-config.json")]
    config: PathBuf,

    /// Verbose logging (RUST_LOG overrides this).
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a starter config file and create the browser profile directory.
    Init {
        /// Notebook URL or bare notebook id to set as the default.
        notebook: Option<String>,
        /// Configure the browser to run without a visible window.
        #[arg(long)]
        headless: bool,
    },
    /// Send one message and print the completed response.
    Ask {
        message: String,
        /// Notebook URL or id, overriding the configured default.
        #[arg(long)]
        notebook: Option<String>,
    },
    /// Interactive chat loop ("exit" or an empty line quits).
    Chat {
        /// Notebook URL or id, overriding the configured default.
        #[arg(long)]
        notebook: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(LogConfig {
        default_filter: if cli.debug { "debug" } else { "info" },
        ..LogConfig::default()
    })?;

    match cli.command {
        Command::Init { notebook, headless } => init_config(&cli.config, notebook, headless),
        Command::Ask { message, notebook } => {
            let config = load_config(&cli.config, notebook)?;
            ask(&config, &message).await
        }
        Command::Chat { notebook } => {
            let config = load_config(&cli.config, notebook)?;
            chat(&config).await
        }
    }
}

fn load_config(path: &Path, notebook: Option<String>) -> Result<ServerConfig> {
    let mut config = ConfigLoader::new().with_optional_file(path).load()?;
    if let Some(raw) = notebook {
        config.default_notebook_id = Some(extract_notebook_id(&raw));
    }
    Ok(config)
}

/// Accepts a full notebook URL or a bare id and returns the id.
fn extract_notebook_id(raw: &str) -> String {
    let id = match raw.split_once("/notebook/") {
        Some((_, rest)) => rest,
        None => raw,
    };
    id.split(['?', '#'])
        .next()
        .unwrap_or(id)
        .trim_matches('/')
        .to_string()
}

fn init_config(path: &Path, notebook: Option<String>, headless: bool) -> Result<()> {
    let mut config = ServerConfig::default();
    config.headless = headless;
    config.default_notebook_id = notebook.as_deref().map(extract_notebook_id);

    std::fs::create_dir_all(config.expanded_profile_dir())?;
    config.save_json(path)?;

    println!("Wrote {} (profile dir: {})", path.display(), config.auth.profile_dir);
    if config.default_notebook_id.is_none() {
        println!("No default notebook set; pass --notebook to ask/chat or edit the config.");
    }
    Ok(())
}

fn waiter_for(config: &ServerConfig) -> ResponseWaiter {
    ResponseWaiter::new(WaitOptions::new(
        config.response_stability_checks,
        Duration::from_secs(config.streaming_timeout_secs),
    ))
}

async fn open_session(config: &ServerConfig) -> Result<(FolioDriver, NotebookSession)> {
    let driver = FolioDriver::launch(config).await?;
    let mut session = driver.open_notebook_session(config)?;

    if !session.authenticate().await? {
        let _ = driver.close().await;
        bail!(
            "authentication required: run once without --headless, sign in in the opened \
             browser, and the persistent profile will carry the session"
        );
    }
    if session.current_notebook().is_none() {
        let _ = driver.close().await;
        bail!("no notebook configured; pass --notebook or set default_notebook_id");
    }
    Ok((driver, session))
}

async fn ask(config: &ServerConfig, message: &str) -> Result<()> {
    let (driver, mut session) = open_session(config).await?;

    let result = async {
        session.send_message(message).await?;
        session.get_response(&waiter_for(config)).await
    }
    .await;

    let _ = driver.close().await;
    println!("{}", result?);
    Ok(())
}

async fn chat(config: &ServerConfig) -> Result<()> {
    let (driver, mut session) = open_session(config).await?;
    info!(notebook = ?session.current_notebook(), "chat session ready");
    println!("Connected. Type a message; \"exit\" or an empty line quits.");

    let waiter = waiter_for(config);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let result: Result<()> = async {
        loop {
            print!("you> ");
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            let message = line.trim();
            if message.is_empty() || message.eq_ignore_ascii_case("exit") {
                break;
            }

            session.send_message(message).await?;
            let response = session.get_response(&waiter).await?;
            println!("notebook> {response}\n");
        }
        Ok(())
    }
    .await;

    let _ = driver.close().await;
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notebook_ids_come_out_of_full_urls() {
        assert_eq!(
            extract_notebook_id("https://notebooklm.google.com/notebook/abc-123"),
            "abc-123"
        );
        assert_eq!(
            extract_notebook_id("https://notebooklm.google.com/notebook/abc-123?source=tab"),
            "abc-123"
        );
        assert_eq!(
            extract_notebook_id("https://notebooklm.google.com/notebook/abc-123/"),
            "abc-123"
        );
    }

    #[test]
    fn bare_ids_pass_through() {
        assert_eq!(extract_notebook_id("abc-123"), "abc-123");
    }
}
