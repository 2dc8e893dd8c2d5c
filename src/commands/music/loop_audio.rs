use super::*;

/// Play a saved alias (or a URL) on repeat until stopped
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    rename = "loop",
    category = "Music"
)]
pub async fn loop_audio(
    ctx: Context<'_>,
    #[description = "Saved alias or URL"] target: String,
) -> CommandResult {
    start_playback(ctx, target, true).await
}
