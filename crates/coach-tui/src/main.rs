use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use coach_core::{Config, ConfigError, HttpTransport, PayloadMode};

mod app;
mod handler;
mod line;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

#[derive(Parser)]
#[command(name = "coach", version)]
#[command(about = "Chat with a remote coaching endpoint from the terminal")]
struct Cli {
    /// Chat endpoint URL (overrides the config file)
    #[arg(long, env = "COACH_CHAT_ENDPOINT")]
    endpoint: Option<String>,

    /// "history" sends the whole conversation, "single" only the latest message
    #[arg(long)]
    mode: Option<String>,

    /// System prompt that opens the conversation
    #[arg(long)]
    system: Option<String>,

    /// Request timeout in seconds (0 waits forever)
    #[arg(long)]
    timeout: Option<u64>,

    /// Read one message per line from stdin instead of opening the full-screen UI
    #[arg(long)]
    plain: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.plain)?;

    let config = resolve_config(&cli, Config::load())?;
    let transport = HttpTransport::from_config(&config)?;
    log::info!(
        "[coach] Using {} ({} mode)",
        transport.endpoint(),
        transport.mode().as_str()
    );

    if cli.plain {
        return line::run(&config.system_prompt, &transport).await;
    }

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let endpoint = transport.endpoint().to_string();
    let mut app = App::new(&config, &endpoint, Arc::new(transport));
    let result = run(&mut terminal, &mut app).await;

    tui::restore()?;
    result
}

async fn run(terminal: &mut Tui, app: &mut App) -> Result<()> {
    let mut events = EventHandler::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event),
            None => break,
        }
        app.poll_reply().await;
    }

    app.cancel_reply();
    Ok(())
}

/// Applies CLI overrides on top of the config file. A file that exists but
/// can't be read or parsed is an error; only a missing config dir falls back.
fn resolve_config(cli: &Cli, loaded: Result<Config, ConfigError>) -> Result<Config> {
    let mut config = match loaded {
        Ok(config) => config,
        Err(ConfigError::NoConfigDir) => {
            log::warn!("[config] No config directory, using defaults");
            Config::new()
        }
        Err(e) => {
            let path = Config::get_config_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|_| "config.json".to_string());
            return Err(anyhow::Error::new(e).context(format!("invalid config file {}", path)));
        }
    };

    if let Some(endpoint) = &cli.endpoint {
        config.endpoint = endpoint.clone();
    }
    if let Some(mode) = &cli.mode {
        config.mode =
            PayloadMode::from_str(mode).ok_or_else(|| ConfigError::UnknownMode(mode.clone()))?;
    }
    if let Some(system) = &cli.system {
        config.system_prompt = system.clone();
    }
    if let Some(timeout) = cli.timeout {
        config.timeout_secs = timeout;
    }

    Ok(config)
}

fn log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("coach-chat")
        .join("coach.log")
}

/// Full-screen mode logs to a file so output doesn't tear the UI; line mode
/// keeps stderr and only shows warnings unless RUST_LOG says otherwise.
fn init_logging(plain: bool) -> Result<()> {
    let default_filter = if plain { "warn" } else { "info" };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter));

    if !plain {
        let path = log_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder.init();
    Ok(())
}
