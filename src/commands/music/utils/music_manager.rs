use poise::serenity_prelude as serenity;
use serenity::client::Context;
use serenity::model::id::{ChannelId, GuildId, UserId};
use songbird::Songbird;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

use super::voice_transport::{SongbirdHandle, VoiceHandle};

/// Errors that can occur during music operations
#[derive(Error, Debug)]
pub enum MusicError {
    #[error("Not in a guild")]
    NotInGuild,

    #[error("Audio `{0}` not found")]
    AliasNotFound(String),

    #[error("Voice channel unavailable: {0}")]
    VoiceChannelUnavailable(String),

    #[error("Not connected to a voice channel")]
    NotConnected,

    #[error("Could not resolve audio: {0}")]
    ResolutionError(String),

    #[error("Voice transport error: {0}")]
    TransportError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for music operations
pub type MusicResult<T> = Result<T, MusicError>;

/// Songbird lookups and voice connection management
pub struct MusicManager;

impl MusicManager {
    /// Get the Songbird voice client from the context
    pub async fn get_songbird(ctx: &Context) -> MusicResult<Arc<Songbird>> {
        songbird::get(ctx).await.ok_or_else(|| {
            MusicError::VoiceChannelUnavailable("voice client is not registered".to_string())
        })
    }

    /// Get the voice channel ID that the user is currently in
    pub fn get_user_voice_channel(
        ctx: &Context,
        guild_id: GuildId,
        user_id: UserId,
    ) -> MusicResult<ChannelId> {
        let guild = ctx.cache.guild(guild_id).ok_or(MusicError::NotInGuild)?;

        guild
            .voice_states
            .get(&user_id)
            .and_then(|voice_state| voice_state.channel_id)
            .ok_or_else(|| {
                MusicError::VoiceChannelUnavailable("you're not in a voice channel".to_string())
            })
    }

    /// Connects to the author's voice channel, reusing the guild's existing
    /// call when the bot is already connected.
    pub async fn ensure_voice(
        ctx: &Context,
        guild_id: GuildId,
        user_id: UserId,
    ) -> MusicResult<Arc<dyn VoiceHandle>> {
        let channel_id = Self::get_user_voice_channel(ctx, guild_id, user_id)?;
        let songbird = Self::get_songbird(ctx).await?;

        if let Some(call) = songbird.get(guild_id) {
            debug!("Reusing existing voice call for guild {}", guild_id);
            return Ok(Arc::new(SongbirdHandle::new(songbird, guild_id, call)));
        }

        let call = match songbird.join(guild_id, channel_id).await {
            Ok(call) => call,
            Err(err) => {
                error!(
                    "Failed to join voice channel {} for guild {}: {}",
                    channel_id, guild_id, err
                );
                return Err(MusicError::VoiceChannelUnavailable(err.to_string()));
            }
        };

        info!("Joined voice channel {} in guild {}", channel_id, guild_id);
        Ok(Arc::new(SongbirdHandle::new(songbird, guild_id, call)))
    }

    /// Leave a voice channel
    pub async fn leave_channel(ctx: &Context, guild_id: GuildId) -> MusicResult<()> {
        let songbird = Self::get_songbird(ctx).await?;

        if songbird.get(guild_id).is_none() {
            return Err(MusicError::NotConnected);
        }

        songbird
            .remove(guild_id)
            .await
            .map_err(|e| MusicError::TransportError(e.to_string()))?;

        info!("Left voice channel in guild {}", guild_id);
        Ok(())
    }
}
