//! Runtime configuration read from the environment (after `.env` is loaded).

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use humantime_serde::re::humantime;
use tracing::debug;

use crate::commands::music::utils::music_manager::MusicError;

/// Clips shorter than this are downloaded instead of streamed.
pub const DEFAULT_DOWNLOAD_THRESHOLD: Duration = Duration::from_secs(300);
pub const DEFAULT_AUDIO_MAP_PATH: &str = "audio_map.json";
pub const DEFAULT_COMMAND_PREFIX: &str = "!";
pub const DEFAULT_YTDLP_PATH: &str = "yt-dlp";

#[derive(Debug, Clone)]
pub struct Config {
    /// Discord bot token (`DISCORD_BOT_TOKEN`).
    pub token: String,
    /// JSON file holding the per-guild alias map (`AUDIO_MAP_PATH`).
    pub audio_map_path: PathBuf,
    /// Presence text shown as "Playing ..." (`BOT_MESSAGE`).
    pub bot_message: Option<String>,
    /// Prefix for text commands (`COMMAND_PREFIX`).
    pub command_prefix: String,
    /// Duration below which media is downloaded (`DOWNLOAD_THRESHOLD`, e.g. `5m`).
    pub download_threshold: Duration,
    /// Directory for per-session temporary downloads (`TEMP_AUDIO_DIR`).
    pub temp_dir: PathBuf,
    /// yt-dlp executable (`YTDLP_PATH`).
    pub ytdlp_path: String,
}

impl Config {
    pub fn from_env() -> Result<Self, MusicError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, MusicError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let token = get("DISCORD_BOT_TOKEN")
            .ok_or_else(|| MusicError::ConfigError("DISCORD_BOT_TOKEN is not set".to_string()))?;

        let download_threshold = match get("DOWNLOAD_THRESHOLD") {
            Some(raw) => humantime::parse_duration(raw.trim()).map_err(|e| {
                MusicError::ConfigError(format!("Invalid DOWNLOAD_THRESHOLD '{}': {}", raw, e))
            })?,
            None => DEFAULT_DOWNLOAD_THRESHOLD,
        };

        let config = Self {
            token,
            audio_map_path: get("AUDIO_MAP_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_AUDIO_MAP_PATH)),
            bot_message: get("BOT_MESSAGE"),
            command_prefix: get("COMMAND_PREFIX")
                .unwrap_or_else(|| DEFAULT_COMMAND_PREFIX.to_string()),
            download_threshold,
            temp_dir: get("TEMP_AUDIO_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(env::temp_dir),
            ytdlp_path: get("YTDLP_PATH").unwrap_or_else(|| DEFAULT_YTDLP_PATH.to_string()),
        };

        debug!(
            "Loaded configuration: alias map {:?}, threshold {:?}, temp dir {:?}",
            config.audio_map_path, config.download_threshold, config.temp_dir
        );

        Ok(config)
    }
}
