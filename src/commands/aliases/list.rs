use super::*;

/// List the aliases saved for this server
#[poise::command(prefix_command, slash_command, guild_only, category = "Aliases")]
pub async fn list(
    ctx: Context<'_>,
    #[description = "Only show aliases containing this text"] filter: Option<String>,
) -> CommandResult {
    let guild_id = require_guild(&ctx)?;

    let aliases = ctx.data().aliases.list(guild_id, filter.as_deref())?;
    ctx.send(embedded_messages::alias_list(&aliases)).await?;

    Ok(())
}
