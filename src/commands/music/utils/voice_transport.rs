//! The voice transport seam used by the playback manager.
//!
//! [`VoiceHandle`] is the only view of a voice connection the session logic
//! sees; [`SongbirdHandle`] backs it with a live songbird call.

use poise::serenity_prelude as serenity;
use serenity::async_trait;
use serenity::model::id::GuildId;
use serenity::prelude::Mutex as SerenityMutex;
use songbird::input::{File, HttpRequest, Input};
use songbird::{Call, Event, Songbird, TrackEvent};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tracing::{debug, info};

use crate::HTTP_CLIENT;

use super::event_handlers::TrackEndNotifier;
use super::media_resolver::PlaybackSource;
use super::music_manager::{MusicError, MusicResult};

/// Receives the end of a playback started through [`VoiceHandle::play`].
///
/// Called at most once per `play`, whether the track ran out, was stopped,
/// or failed (`error` is set in the last case).
#[async_trait]
pub trait FinishHandler: Send + Sync {
    async fn finished(&self, error: Option<String>);
}

/// A connected voice channel for one guild.
#[async_trait]
pub trait VoiceHandle: Send + Sync {
    async fn is_connected(&self) -> bool;

    /// Starts `source`, replacing whatever this connection was playing.
    async fn play(
        &self,
        source: &PlaybackSource,
        on_finished: Arc<dyn FinishHandler>,
    ) -> MusicResult<()>;

    async fn stop(&self) -> MusicResult<()>;

    /// Leaves the channel. Succeeds if already disconnected.
    async fn disconnect(&self) -> MusicResult<()>;
}

/// [`VoiceHandle`] over a songbird call.
pub struct SongbirdHandle {
    songbird: Arc<Songbird>,
    guild_id: GuildId,
    call: Arc<SerenityMutex<Call>>,
}

impl SongbirdHandle {
    pub fn new(
        songbird: Arc<Songbird>,
        guild_id: GuildId,
        call: Arc<SerenityMutex<Call>>,
    ) -> Self {
        Self {
            songbird,
            guild_id,
            call,
        }
    }

    fn input_for(source: &PlaybackSource) -> Input {
        match source {
            PlaybackSource::RemoteStream { url } => {
                HttpRequest::new(HTTP_CLIENT.clone(), url.clone()).into()
            }
            PlaybackSource::LocalFile { path } => File::new(path.clone()).into(),
        }
    }
}

#[async_trait]
impl VoiceHandle for SongbirdHandle {
    async fn is_connected(&self) -> bool {
        self.call.lock().await.current_connection().is_some()
    }

    async fn play(
        &self,
        source: &PlaybackSource,
        on_finished: Arc<dyn FinishHandler>,
    ) -> MusicResult<()> {
        let input = Self::input_for(source);

        let track = {
            let mut call = self.call.lock().await;
            call.play_only_input(input)
        };
        debug!("Started {:?} in guild {}", source, self.guild_id);

        // End and Error may both fire for one track; the shared flag lets only the first through.
        let fired = Arc::new(AtomicBool::new(false));
        for event in [TrackEvent::End, TrackEvent::Error] {
            track
                .add_event(
                    Event::Track(event),
                    TrackEndNotifier::new(on_finished.clone(), fired.clone()),
                )
                .map_err(|e| MusicError::TransportError(e.to_string()))?;
        }

        Ok(())
    }

    async fn stop(&self) -> MusicResult<()> {
        self.call.lock().await.stop();
        Ok(())
    }

    async fn disconnect(&self) -> MusicResult<()> {
        if self.songbird.get(self.guild_id).is_none() {
            debug!("Voice call for guild {} already gone", self.guild_id);
            return Ok(());
        }

        self.songbird
            .remove(self.guild_id)
            .await
            .map_err(|e| MusicError::TransportError(e.to_string()))?;

        info!("Disconnected from voice in guild {}", self.guild_id);
        Ok(())
    }
}
