//! Homelink binary: Telegram bot plus OAuth callback server.
//!
//! Start with:
//! ```bash
//! TELEGRAM_BOT_TOKEN=xxx HOMELINK_CLIENT_ID=xxx HOMELINK_CLIENT_SECRET=xxx \
//!     cargo run -p homelink-telegram
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use homelink_api::{ApiConfig, AppState};
use homelink_core::{
    config, DeviceClient, MemorySessionStore, OAuthClient, SessionStore, Settings, StateMode,
    StateRegistry,
};
use homelink_core::CoreError;
use homelink_telegram::{CommandHandler, Result, TelegramBot};
use tracing_subscriber::EnvFilter;

/// Homelink - list your smart-home devices from Telegram
#[derive(Parser, Debug)]
#[command(name = "homelink")]
#[command(about = "Telegram bot that links chats to a smart-home account")]
struct Args {
    /// Callback server port (overrides HOMELINK_LISTEN_PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Extra .env file to load before reading settings
    #[arg(long, env = "HOMELINK_ENV_FILE")]
    env_file: Option<PathBuf>,

    /// Verbose logging (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(path) = &args.env_file {
        dotenvy::from_path(path).map_err(|e| {
            CoreError::Config(format!("{}: {e}", path.display()))
        })?;
    }
    let env_files = config::load_env_files();

    let filter = match args.verbose {
        0 => "homelink=info,homelink_telegram=info,homelink_api=info,homelink_core=info,teloxide=warn",
        1 => "homelink=debug,homelink_telegram=debug,homelink_api=debug,homelink_core=debug,tower_http=debug,teloxide=info",
        2 => "homelink=trace,homelink_telegram=trace,homelink_api=trace,homelink_core=trace,tower_http=trace,teloxide=debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(filter))
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    for path in &env_files.loaded {
        tracing::debug!(path = %path.display(), "Loaded env file");
    }
    for (path, error) in &env_files.failed {
        tracing::warn!(path = %path.display(), error = %error, "Failed to load env file");
    }

    let mut settings = Settings::from_env()?;
    if let Some(port) = args.port {
        settings.listen_port = port;
    }
    tracing::debug!(?settings, "Settings loaded");

    // Shared between the callback server and the bot
    let sessions: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
    let states = Arc::new(StateRegistry::new(settings.state_mode, settings.state_ttl));
    if states.mode() == StateMode::Plain {
        tracing::warn!("HOMELINK_VERIFY_STATE is off: OAuth state is the bare chat id and can be forged");
    }
    let oauth = Arc::new(OAuthClient::new(settings.oauth.clone(), settings.http_timeout)?);
    let devices = Arc::new(DeviceClient::new(&settings.api_url, settings.http_timeout)?);

    let api_config = ApiConfig::from_settings(&settings);
    let listener = homelink_api::bind(&api_config).await?;
    let app_state = AppState::new(
        api_config,
        Arc::clone(&sessions),
        Arc::clone(&states),
        oauth.clone(),
    );

    let handler = CommandHandler::new(oauth, states, sessions, devices);
    let bot = TelegramBot::new(settings.bot_token.clone(), handler);

    match bot.get_me().await {
        Ok(username) => {
            tracing::info!(username = %username, "Bot initialized successfully");
            println!("\n[home] Homelink bot");
            println!("   Bot: @{}", username);
            println!("   Callback: {}", settings.oauth.redirect_url);
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to get bot info");
            return Err(e);
        }
    }

    println!("\n[phone] Open Telegram and send /start to begin");
    println!("   Press Ctrl+C to stop\n");

    tokio::select! {
        result = homelink_api::serve_listener(listener, app_state) => {
            tracing::error!("Callback server exited");
            result?;
        }
        result = bot.start_polling() => {
            result?;
        }
    }

    Ok(())
}
