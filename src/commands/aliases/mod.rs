pub mod delete;
pub mod list;
pub mod rename;
pub mod save;

use crate::commands::music::utils::music_manager::MusicError;
use crate::utils::embedded_messages;
use crate::{CommandResult, Context, Error};
use poise::serenity_prelude::GuildId;

fn require_guild(ctx: &Context<'_>) -> Result<GuildId, Error> {
    ctx.guild_id()
        .ok_or_else(|| Box::new(MusicError::NotInGuild) as Error)
}
