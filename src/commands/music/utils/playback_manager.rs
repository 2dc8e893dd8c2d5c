//! Per-guild playback state machine.
//!
//! ```text
//! Idle -> Once -> Idle                 (finish or stop)
//! Idle -> Loop -> Loop -> ... -> Idle  (re-arms on finish while connected)
//! ```
//!
//! Every session carries a unique id. Finish notifications and pending
//! resolutions act only if the guild's current session still has their id,
//! so anything belonging to a stopped or superseded session is a no-op.
//! Errored playbacks re-arm a loop too, until [`MAX_FAILED_LOOP_PLAYS`] of
//! them happen in a row.

use futures::future::join_all;
use poise::serenity_prelude as serenity;
use serenity::async_trait;
use serenity::model::id::GuildId;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, error, info, warn};

use super::media_resolver::{MediaResolver, Notifier, PlaybackSource};
use super::music_manager::{MusicError, MusicResult};
use super::session::{GuildSession, SessionMode, SessionRegistry, SessionSlot, Teardown};
use super::voice_transport::{FinishHandler, VoiceHandle};

/// Consecutive errored playbacks after which a loop gives up.
pub const MAX_FAILED_LOOP_PLAYS: u32 = 3;

/// What `start`/`start_loop` ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackOutcome {
    Playing(PlaybackSource),
    /// Stopped or replaced while the source was being resolved.
    Cancelled,
}

pub struct PlaybackManager {
    resolver: MediaResolver,
    sessions: SessionRegistry,
    next_session_id: AtomicU64,
}

impl PlaybackManager {
    pub fn new(resolver: MediaResolver) -> Self {
        Self {
            resolver,
            sessions: SessionRegistry::default(),
            next_session_id: AtomicU64::new(1),
        }
    }

    /// Plays `url` once on `voice`, then disconnects.
    pub async fn start(
        self: &Arc<Self>,
        guild_id: GuildId,
        url: &str,
        voice: Arc<dyn VoiceHandle>,
        notifier: &dyn Notifier,
    ) -> MusicResult<PlaybackOutcome> {
        self.begin(guild_id, url, voice, notifier, SessionMode::Once)
            .await
    }

    /// Plays `url` on `voice` repeatedly until stopped or disconnected.
    /// The source is resolved once and reused for every repetition.
    pub async fn start_loop(
        self: &Arc<Self>,
        guild_id: GuildId,
        url: &str,
        voice: Arc<dyn VoiceHandle>,
        notifier: &dyn Notifier,
    ) -> MusicResult<PlaybackOutcome> {
        self.begin(guild_id, url, voice, notifier, SessionMode::Loop)
            .await
    }

    async fn begin(
        self: &Arc<Self>,
        guild_id: GuildId,
        url: &str,
        voice: Arc<dyn VoiceHandle>,
        notifier: &dyn Notifier,
        mode: SessionMode,
    ) -> MusicResult<PlaybackOutcome> {
        let session_id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
        let slot = self.sessions.slot(guild_id);

        {
            let mut current = slot.lock().await;
            if let Some(previous) = current.take() {
                info!(
                    "Session {} replaces session {} in guild {}",
                    session_id, previous.id, guild_id
                );
                previous.teardown(Teardown::Supersede).await;
            }
            *current = Some(GuildSession::new(session_id, guild_id, mode, voice));
        }
        info!(
            "Session {} ({:?}) created for guild {}: {}",
            session_id, mode, guild_id, url
        );

        // Resolution runs unlocked; a stop issued meanwhile removes the session.
        let resolved = self
            .resolver
            .resolve(url, guild_id, session_id, notifier)
            .await;

        let outcome = self
            .play_resolved(&slot, guild_id, session_id, resolved)
            .await;
        drop(slot);
        self.sessions.prune(guild_id);
        outcome
    }

    async fn play_resolved(
        self: &Arc<Self>,
        slot: &SessionSlot,
        guild_id: GuildId,
        session_id: u64,
        resolved: MusicResult<PlaybackSource>,
    ) -> MusicResult<PlaybackOutcome> {
        let mut current = slot.lock().await;
        let is_current = current.as_ref().is_some_and(|s| s.id == session_id);

        let source = match resolved {
            Err(e) => {
                warn!(
                    "Resolution failed for session {} in guild {}: {}",
                    session_id, guild_id, e
                );
                if is_current {
                    // The connection stays up and idle.
                    *current = None;
                }
                return Err(e);
            }
            Ok(source) if !is_current => {
                info!(
                    "Session {} in guild {} was stopped during resolution",
                    session_id, guild_id
                );
                source.cleanup().await;
                return Ok(PlaybackOutcome::Cancelled);
            }
            Ok(source) => source,
        };

        let Some(session) = current.as_mut() else {
            source.cleanup().await;
            return Ok(PlaybackOutcome::Cancelled);
        };
        session.current_source = Some(source.clone());

        let started = if session.voice.is_connected().await {
            session
                .voice
                .play(&source, self.finish_handler(guild_id, session_id))
                .await
        } else {
            Err(MusicError::TransportError(
                "voice connection was lost".to_string(),
            ))
        };

        if let Err(e) = started {
            error!(
                "Failed to start session {} in guild {}: {}",
                session_id, guild_id, e
            );
            if let Some(session) = current.take() {
                session.teardown(Teardown::Finish).await;
            }
            return Err(e);
        }

        info!("Session {} playing in guild {}", session_id, guild_id);
        Ok(PlaybackOutcome::Playing(source))
    }

    /// Ends the guild's session: stops playback, deletes its temp file and
    /// disconnects. Returns `false` (and does nothing) when there is none.
    pub async fn stop(&self, guild_id: GuildId) -> bool {
        let Some(slot) = self.sessions.existing_slot(guild_id) else {
            return false;
        };

        let session = slot.lock().await.take();
        drop(slot);
        self.sessions.prune(guild_id);

        match session {
            Some(session) => {
                info!("Stopping session {} in guild {}", session.id, guild_id);
                session.teardown(Teardown::Stop).await;
                true
            }
            None => {
                debug!("Stop requested for idle guild {}", guild_id);
                false
            }
        }
    }

    /// Stops every live session. Used at shutdown.
    pub async fn stop_all(&self) {
        let guilds = self.sessions.guilds();
        let stopped = join_all(guilds.into_iter().map(|guild_id| self.stop(guild_id))).await;
        info!(
            "Stopped {} session(s)",
            stopped.into_iter().filter(|s| *s).count()
        );
    }

    pub async fn has_session(&self, guild_id: GuildId) -> bool {
        self.session_mode(guild_id).await.is_some()
    }

    pub async fn session_mode(&self, guild_id: GuildId) -> Option<SessionMode> {
        let slot = self.sessions.existing_slot(guild_id)?;
        let current = slot.lock().await;
        current.as_ref().map(|session| session.mode)
    }

    fn finish_handler(
        self: &Arc<Self>,
        guild_id: GuildId,
        session_id: u64,
    ) -> Arc<dyn FinishHandler> {
        Arc::new(SessionEndNotifier {
            manager: Arc::downgrade(self),
            guild_id,
            session_id,
        })
    }

    /// Handles the end of one playback of session `session_id`.
    async fn on_finished(
        self: &Arc<Self>,
        guild_id: GuildId,
        session_id: u64,
        error: Option<String>,
    ) {
        let Some(slot) = self.sessions.existing_slot(guild_id) else {
            return;
        };
        self.handle_finish(&slot, guild_id, session_id, error).await;
        drop(slot);
        self.sessions.prune(guild_id);
    }

    async fn handle_finish(
        self: &Arc<Self>,
        slot: &SessionSlot,
        guild_id: GuildId,
        session_id: u64,
        error: Option<String>,
    ) {
        let mut current = slot.lock().await;

        let Some(session) = current.as_mut().filter(|s| s.id == session_id) else {
            debug!(
                "Ignoring stale finish of session {} in guild {}",
                session_id, guild_id
            );
            return;
        };

        match &error {
            Some(err) => {
                session.failed_plays += 1;
                warn!(
                    "Playback of session {} in guild {} failed ({} in a row): {}",
                    session_id, guild_id, session.failed_plays, err
                );
            }
            None => session.failed_plays = 0,
        }

        let rearm = session.mode == SessionMode::Loop
            && session.failed_plays < MAX_FAILED_LOOP_PLAYS;
        if session.mode == SessionMode::Loop && !rearm {
            warn!(
                "Giving up on loop {} in guild {} after {} failed playbacks",
                session_id, guild_id, session.failed_plays
            );
        }

        if rearm {
            if !session.voice.is_connected().await {
                info!(
                    "Voice connection lost in guild {}, ending loop {}",
                    guild_id, session_id
                );
            } else if let Some(source) = session.current_source.clone() {
                match session
                    .voice
                    .play(&source, self.finish_handler(guild_id, session_id))
                    .await
                {
                    Ok(()) => {
                        debug!("Loop {} re-armed in guild {}", session_id, guild_id);
                        return;
                    }
                    Err(e) => error!(
                        "Failed to replay loop {} in guild {}: {}",
                        session_id, guild_id, e
                    ),
                }
            }
        }

        if let Some(session) = current.take() {
            session.teardown(Teardown::Finish).await;
        }
    }
}

/// [`FinishHandler`] bound to one session.
struct SessionEndNotifier {
    manager: Weak<PlaybackManager>,
    guild_id: GuildId,
    session_id: u64,
}

#[async_trait]
impl FinishHandler for SessionEndNotifier {
    async fn finished(&self, error: Option<String>) {
        if let Some(manager) = self.manager.upgrade() {
            manager
                .on_finished(self.guild_id, self.session_id, error)
                .await;
        }
    }
}
