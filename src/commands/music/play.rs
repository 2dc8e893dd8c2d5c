use super::*;

/// Play a saved alias (or a URL) once in your voice channel
#[poise::command(prefix_command, slash_command, guild_only, category = "Music")]
pub async fn play(
    ctx: Context<'_>,
    #[description = "Saved alias or URL"] target: String,
) -> CommandResult {
    start_playback(ctx, target, false).await
}
