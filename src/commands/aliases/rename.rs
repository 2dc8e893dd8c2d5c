use super::*;
use crate::utils::alias_store::RenameOutcome;

/// Rename a saved alias
#[poise::command(prefix_command, slash_command, guild_only, category = "Aliases")]
pub async fn rename(
    ctx: Context<'_>,
    #[description = "Current alias"] old: String,
    #[description = "New alias"] new: String,
) -> CommandResult {
    let guild_id = require_guild(&ctx)?;

    let reply = match ctx.data().aliases.rename(guild_id, &old, &new)? {
        RenameOutcome::Renamed => embedded_messages::renamed(&old, &new),
        RenameOutcome::NotFound => embedded_messages::alias_not_found(&old),
        RenameOutcome::AlreadyExists => embedded_messages::alias_already_exists(&new),
    };

    ctx.send(reply).await?;
    Ok(())
}
