//! Writers Room - turn-based collaborative storytelling bot for Discord.
//!
//! Loads a TOML configuration, connects to the Discord gateway and runs
//! writing sessions until interrupted.

use clap::Parser;
use serenity::all::GatewayIntents;
use serenity::Client;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use writers_room::{
    ConfigError, ConfigErrorKind, Coordinator, Platform, PlatformError, PlatformErrorKind,
    WritersRoomConfig, WritersRoomResult,
};
use writers_room_discord::{DiscordPlatform, WritersRoomHandler};

/// Command-line arguments for the bot.
#[derive(Parser, Debug)]
#[command(name = "writers-room")]
#[command(about = "Writers Room - collaborative storytelling sessions on Discord")]
#[command(version)]
struct Args {
    /// Path to bot configuration file
    #[arg(short, long, default_value = "writers_room.toml")]
    config: PathBuf,

    /// Discord bot token
    #[arg(long, env = "DISCORD_TOKEN")]
    discord_token: Option<String>,

    /// Validate the configuration and exit without connecting
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> WritersRoomResult<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    info!("Starting Writers Room");
    info!(config_file = ?args.config, "Loading configuration");

    let config = WritersRoomConfig::from_file(&args.config)?;
    info!(
        prompts = config.prompts.len(),
        publication_channel = config.publication_channel_id,
        join_timeout = config.join_timeout_seconds,
        cleanup_delay = config.cleanup_delay_seconds,
        "Configuration loaded"
    );

    if args.dry_run {
        info!("DRY RUN MODE - configuration is valid, not connecting");
        return Ok(());
    }

    let token = args.discord_token.ok_or_else(|| {
        ConfigError::new(ConfigErrorKind::MissingToken("DISCORD_TOKEN".to_string()))
    })?;
    let platform = DiscordPlatform::connect(&token).await?;
    info!(bot = %platform.bot_user(), "Bot user resolved");

    let coordinator = Coordinator::new(Arc::new(platform), config);
    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::GUILD_MESSAGE_REACTIONS
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(&token, intents)
        .event_handler(WritersRoomHandler::new(coordinator))
        .await
        .map_err(|e| gateway_error("Failed to build gateway client", e))?;

    info!("Connecting to Discord gateway");
    if let Err(e) = client.start().await {
        warn!(error = %e, "Gateway client stopped");
        return Err(gateway_error("Gateway connection failed", e).into());
    }
    Ok(())
}

#[track_caller]
fn gateway_error(context: &str, err: serenity::Error) -> PlatformError {
    PlatformError::new(PlatformErrorKind::Api(format!("{}: {}", context, err)))
}
