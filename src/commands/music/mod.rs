pub mod loop_audio;
pub mod play;
pub mod stop;

pub mod audio_sources;
pub mod utils;

use audio_sources::AudioSource;
use poise::serenity_prelude as serenity;
use tracing::{error, info};
use utils::{
    channel_notifier::ChannelNotifier,
    music_manager::{MusicError, MusicManager},
    playback_manager::PlaybackOutcome,
};

use crate::utils::embedded_messages;
use crate::{CommandResult, Context};

/// Looks `target` up as an alias, falling back to using it as a direct URL.
fn lookup_url(
    ctx: &Context<'_>,
    guild_id: serenity::GuildId,
    target: &str,
) -> Result<String, crate::Error> {
    if let Some(url) = ctx.data().aliases.get(guild_id, target)? {
        return Ok(url);
    }

    if AudioSource::is_url(target) {
        return Ok(target.to_string());
    }

    Err(Box::new(MusicError::AliasNotFound(target.to_string())))
}

/// Shared body of `play` and `loop`.
async fn start_playback(ctx: Context<'_>, target: String, looped: bool) -> CommandResult {
    let guild_id = ctx
        .guild_id()
        .ok_or_else(|| Box::new(MusicError::NotInGuild) as crate::Error)?;
    info!(
        "Received {} command for {} in guild {}",
        if looped { "loop" } else { "play" },
        target,
        guild_id
    );

    let url = match lookup_url(&ctx, guild_id, &target) {
        Ok(url) => url,
        Err(err) => {
            ctx.send(embedded_messages::error(err)).await?;
            return Ok(());
        }
    };

    let voice =
        match MusicManager::ensure_voice(ctx.serenity_context(), guild_id, ctx.author().id).await {
            Ok(voice) => voice,
            Err(err) => {
                ctx.send(embedded_messages::user_not_in_voice_channel(err))
                    .await?;
                return Ok(());
            }
        };

    // Probing and downloading can take a while
    ctx.defer().await?;

    let notifier = ChannelNotifier::new(ctx.serenity_context().http.clone(), ctx.channel_id());
    let playback = &ctx.data().playback;
    let result = if looped {
        playback.start_loop(guild_id, &url, voice, &notifier).await
    } else {
        playback.start(guild_id, &url, voice, &notifier).await
    };

    let reply = match result {
        Ok(PlaybackOutcome::Playing(source)) => {
            embedded_messages::now_playing(&target, &source, looped)
        }
        Ok(PlaybackOutcome::Cancelled) => embedded_messages::cancelled(&target),
        Err(err) => {
            error!("Failed to play {} in guild {}: {}", url, guild_id, err);
            embedded_messages::error(err)
        }
    };

    ctx.send(reply).await?;
    Ok(())
}
