use super::*;
use tracing::debug;

/// Stop playback and leave the voice channel
#[poise::command(prefix_command, slash_command, guild_only, category = "Music")]
pub async fn stop(ctx: Context<'_>) -> CommandResult {
    let guild_id = ctx
        .guild_id()
        .ok_or_else(|| Box::new(MusicError::NotInGuild) as crate::Error)?;

    let had_session = ctx.data().playback.stop(guild_id).await;

    if !had_session {
        // Still leave a channel the bot was left idling in
        if let Err(e) = MusicManager::leave_channel(ctx.serenity_context(), guild_id).await {
            debug!("Nothing to leave in guild {}: {}", guild_id, e);
        }
    }

    ctx.send(embedded_messages::stopped(had_session)).await?;
    Ok(())
}
