use ::serenity::all::ClientBuilder;
use dotenv::dotenv;
use poise::serenity_prelude as serenity;
use songbird::SerenityInit;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use echo::commands::{
    aliases::{delete::*, list::*, rename::*, save::*},
    music::{
        audio_sources::YtDlp,
        loop_audio::*,
        play::*,
        stop::*,
        utils::{media_resolver::MediaResolver, playback_manager::PlaybackManager},
    },
};
use echo::config::Config;
use echo::utils::alias_store::AliasStore;
use echo::{CommandResult, Context, Data, Error};

#[poise::command(prefix_command, slash_command, category = "General")]
async fn help(
    ctx: Context<'_>,
    #[description = "Specific command to show help about"]
    #[autocomplete = "poise::builtins::autocomplete_command"]
    command: Option<String>,
) -> CommandResult {
    poise::builtins::help(
        ctx,
        command.as_deref(),
        poise::builtins::HelpConfiguration {
            show_context_menu_commands: true,
            ..Default::default()
        },
    )
    .await
    .map_err(|e| e.into())
}

#[poise::command(prefix_command, hide_in_help)]
async fn register(ctx: Context<'_>) -> Result<(), Error> {
    poise::builtins::register_application_commands_buttons(ctx)
        .await
        .map_err(|e| e.into())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize logging with debug level for our crate
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("echo=debug,warn")),
        )
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .with_target(true)
        .with_ansi(true)
        .pretty()
        .init();

    dotenv().ok();

    let config = Arc::new(Config::from_env()?);

    let aliases = Arc::new(AliasStore::open(&config.audio_map_path)?);
    info!("Loaded audio aliases from {:?}", aliases.path());

    if let Err(e) = tokio::fs::create_dir_all(&config.temp_dir).await {
        warn!(
            "Could not create temporary audio directory {:?}: {}",
            config.temp_dir, e
        );
    }

    let resolver = MediaResolver::new(
        Arc::new(YtDlp::new(config.ytdlp_path.clone())),
        config.download_threshold,
        config.temp_dir.clone(),
    );
    let playback = Arc::new(PlaybackManager::new(resolver));

    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::MESSAGE_CONTENT
        | serenity::GatewayIntents::GUILD_VOICE_STATES;

    let commands = vec![
        // Default commands
        register(),
        help(),
        // Alias commands
        save(),
        rename(),
        delete(),
        list(),
        // Playback commands
        play(),
        loop_audio(),
        stop(),
    ];

    let data = Data {
        config: config.clone(),
        aliases,
        playback: playback.clone(),
    };

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands,
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(config.command_prefix.clone()),
                ..Default::default()
            },
            on_error: |error| {
                Box::pin(async move {
                    if let Err(e) = poise::builtins::on_error(error).await {
                        error!("Error while handling error: {}", e);
                    }
                })
            },
            ..Default::default()
        })
        .setup(|ctx, ready, framework| {
            Box::pin(async move {
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                if let Some(message) = &data.config.bot_message {
                    ctx.set_activity(Some(serenity::ActivityData::playing(message.clone())));
                }
                info!("Logged in as {}", ready.user.name);
                Ok(data)
            })
        });

    let mut client = ClientBuilder::new(&config.token, intents)
        .framework(framework.build())
        .register_songbird()
        .await?;

    // Stop every session (deleting its temp file) before the shards go down
    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
            return;
        }
        info!("Shutting down");
        playback.stop_all().await;
        shard_manager.shutdown_all().await;
    });

    client.start().await.map_err(Into::into)
}
