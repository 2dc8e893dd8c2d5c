use super::*;
use crate::commands::music::audio_sources::AudioSource;
use tracing::info;

/// Save a URL under a short alias for this server
#[poise::command(prefix_command, slash_command, guild_only, category = "Aliases")]
pub async fn save(
    ctx: Context<'_>,
    #[description = "Name to save the audio under"] alias: String,
    #[description = "URL of the audio"] url: String,
) -> CommandResult {
    let guild_id = require_guild(&ctx)?;

    if !AudioSource::is_url(&url) {
        ctx.send(embedded_messages::invalid_url(&url)).await?;
        return Ok(());
    }

    ctx.data().aliases.put(guild_id, &alias, &url)?;
    info!("Saved alias {} -> {} in guild {}", alias, url, guild_id);

    ctx.send(embedded_messages::saved(&alias)).await?;
    Ok(())
}
