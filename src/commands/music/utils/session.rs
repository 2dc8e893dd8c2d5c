//! Per-guild playback sessions and the registry that holds them.

use dashmap::DashMap;
use poise::serenity_prelude as serenity;
use serenity::model::id::GuildId;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::media_resolver::PlaybackSource;
use super::voice_transport::VoiceHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// Play once, then disconnect.
    Once,
    /// Replay the same source until stopped or disconnected.
    Loop,
}

/// How a session is being torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Teardown {
    /// A newer session takes over the same connection: stop playback, keep the connection.
    Supersede,
    /// Explicit stop: stop playback and leave the channel.
    Stop,
    /// Playback ended on its own (or could not start): leave the channel.
    Finish,
}

/// The playback state of one guild.
pub struct GuildSession {
    /// Unique per session; finish notifications carrying another id are stale.
    pub(crate) id: u64,
    pub(crate) guild_id: GuildId,
    pub(crate) mode: SessionMode,
    /// Loop playbacks that ended in an error since the last clean one.
    pub(crate) failed_plays: u32,
    /// Set once resolution completes. Owns the temp file cleanup, if any.
    pub(crate) current_source: Option<PlaybackSource>,
    pub(crate) voice: Arc<dyn VoiceHandle>,
}

impl GuildSession {
    pub(crate) fn new(
        id: u64,
        guild_id: GuildId,
        mode: SessionMode,
        voice: Arc<dyn VoiceHandle>,
    ) -> Self {
        Self {
            id,
            guild_id,
            mode,
            failed_plays: 0,
            current_source: None,
            voice,
        }
    }

    /// Ends the session: releases the temp file and, depending on `kind`,
    /// stops playback and/or disconnects. Transport failures are logged only.
    pub(crate) async fn teardown(mut self, kind: Teardown) {
        info!(
            "Session {} ({:?}) in guild {} ended: {:?}",
            self.id, self.mode, self.guild_id, kind
        );

        if matches!(kind, Teardown::Supersede | Teardown::Stop) {
            if let Err(e) = self.voice.stop().await {
                warn!(
                    "Failed to stop playback for guild {}: {}",
                    self.guild_id, e
                );
            }
        }

        if let Some(source) = self.current_source.take() {
            source.cleanup().await;
        }

        if matches!(kind, Teardown::Stop | Teardown::Finish) {
            if let Err(e) = self.voice.disconnect().await {
                warn!(
                    "Failed to disconnect voice for guild {}: {}",
                    self.guild_id, e
                );
            }
        }
    }
}

pub(crate) type SessionSlot = Arc<Mutex<Option<GuildSession>>>;

/// guild -> session, with one lock per guild.
///
/// A guild's slot is created on first use and dropped by
/// [`SessionRegistry::prune`] once it is empty and unused; an empty slot means
/// the guild has no session. Every read or write of a session goes through
/// its slot lock, so operations on one guild are serialized while other
/// guilds proceed independently.
#[derive(Default)]
pub struct SessionRegistry {
    slots: DashMap<GuildId, SessionSlot>,
}

impl SessionRegistry {
    pub(crate) fn slot(&self, guild_id: GuildId) -> SessionSlot {
        self.slots.entry(guild_id).or_default().value().clone()
    }

    pub(crate) fn existing_slot(&self, guild_id: GuildId) -> Option<SessionSlot> {
        self.slots.get(&guild_id).map(|slot| slot.value().clone())
    }

    pub(crate) fn guilds(&self) -> Vec<GuildId> {
        self.slots.iter().map(|entry| *entry.key()).collect()
    }

    /// Removes the guild's slot if it holds no session and nobody else holds
    /// the slot. Callers must drop their own clone of the slot first.
    pub(crate) fn prune(&self, guild_id: GuildId) {
        self.slots.remove_if(&guild_id, |_, slot| {
            Arc::strong_count(slot) == 1
                && slot.try_lock().is_ok_and(|session| session.is_none())
        });
    }
}
