//! Turns a source URL into something the voice transport can play.
//!
//! Short clips are downloaded to a per-session temporary file so they survive
//! network hiccups and can be replayed without another extraction; anything
//! at or above the threshold (or of unknown length) is streamed directly.

use poise::serenity_prelude as serenity;
use serenity::async_trait;
use serenity::model::id::GuildId;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::format_duration;
use super::music_manager::{MusicError, MusicResult};
use crate::commands::music::audio_sources::MediaProbe;

/// A playable source produced by [`MediaResolver::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackSource {
    /// Streamed live from the remote host. Nothing to clean up.
    RemoteStream { url: String },
    /// Downloaded to disk. The file must be deleted when the session ends.
    LocalFile { path: PathBuf },
}

impl PlaybackSource {
    /// The temporary file this source owns, if any.
    pub fn cleanup_path(&self) -> Option<&Path> {
        match self {
            Self::RemoteStream { .. } => None,
            Self::LocalFile { path } => Some(path),
        }
    }

    /// Deletes the temporary file, if any. Failures are logged, never returned.
    pub async fn cleanup(&self) {
        let Some(path) = self.cleanup_path() else {
            return;
        };

        match tokio::fs::remove_file(path).await {
            Ok(()) => debug!("Removed temporary audio file {:?}", path),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("Temporary audio file {:?} was already gone", path)
            }
            Err(e) => warn!("Failed to remove temporary audio file {:?}: {}", path, e),
        }
    }
}

/// User-facing progress notices emitted while resolving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The source reports DRM protection; playback is still attempted.
    ProtectedContent,
    Downloading { duration: Duration },
    Streaming { duration: Option<Duration> },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProtectedContent => write!(
                f,
                "⚠️ This source reports DRM protection, playback may fail."
            ),
            Self::Downloading { duration } => {
                write!(f, "⬇️ Downloading clip (`{}`)...", format_duration(*duration))
            }
            Self::Streaming { duration: Some(duration) } => {
                write!(f, "📡 Streaming (`{}`)...", format_duration(*duration))
            }
            Self::Streaming { duration: None } => write!(f, "📡 Streaming..."),
        }
    }
}

/// Receives [`Notice`]s. Notices are informational; nothing depends on delivery.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notice: Notice);
}

/// Drops every notice.
pub struct SilentNotifier;

#[async_trait]
impl Notifier for SilentNotifier {
    async fn notify(&self, _notice: Notice) {}
}

pub struct MediaResolver {
    probe: Arc<dyn MediaProbe>,
    download_threshold: Duration,
    temp_dir: PathBuf,
}

impl MediaResolver {
    pub fn new(
        probe: Arc<dyn MediaProbe>,
        download_threshold: Duration,
        temp_dir: PathBuf,
    ) -> Self {
        Self {
            probe,
            download_threshold,
            temp_dir,
        }
    }

    /// Temporary file for a session. Unique per process, guild and session.
    pub fn temp_path(&self, guild_id: GuildId, session_id: u64) -> PathBuf {
        self.temp_dir.join(format!(
            "echo-{}-{}-{}.audio",
            std::process::id(),
            guild_id,
            session_id
        ))
    }

    /// Probes `url` and either downloads it (short clips) or returns its
    /// direct stream URL. On error no temporary file is left behind.
    pub async fn resolve(
        &self,
        url: &str,
        guild_id: GuildId,
        session_id: u64,
        notifier: &dyn Notifier,
    ) -> MusicResult<PlaybackSource> {
        let info = self.probe.probe(url).await?;

        if info.protected {
            warn!("Source {} for guild {} reports DRM protection", url, guild_id);
            notifier.notify(Notice::ProtectedContent).await;
        }

        match info.duration {
            Some(duration) if duration < self.download_threshold => {
                let path = self.temp_path(guild_id, session_id);
                info!(
                    "Downloading {} ({}) for guild {} to {:?}",
                    url,
                    format_duration(duration),
                    guild_id,
                    path
                );
                notifier.notify(Notice::Downloading { duration }).await;

                if let Err(e) = self.probe.download(url, &path).await {
                    if let Err(rm) = tokio::fs::remove_file(&path).await {
                        if rm.kind() != ErrorKind::NotFound {
                            warn!("Failed to remove partial download {:?}: {}", path, rm);
                        }
                    }
                    return Err(e);
                }

                Ok(PlaybackSource::LocalFile { path })
            }
            duration => {
                let stream_url = info.playable_url.ok_or_else(|| {
                    MusicError::ResolutionError("no playable stream URL was found".to_string())
                })?;
                info!("Streaming {} for guild {}", url, guild_id);
                notifier.notify(Notice::Streaming { duration }).await;

                Ok(PlaybackSource::RemoteStream { url: stream_url })
            }
        }
    }
}
