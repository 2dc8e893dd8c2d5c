use super::*;

/// Delete a saved alias
#[poise::command(prefix_command, slash_command, guild_only, category = "Aliases")]
pub async fn delete(
    ctx: Context<'_>,
    #[description = "Alias to delete"] alias: String,
) -> CommandResult {
    let guild_id = require_guild(&ctx)?;

    let reply = if ctx.data().aliases.delete(guild_id, &alias)? {
        embedded_messages::deleted(&alias)
    } else {
        embedded_messages::delete_not_found()
    };

    ctx.send(reply).await?;
    Ok(())
}
