//! Defines `ProbeInfo`, the metadata the resolver needs from a remote source,
//! and its conversion from `yt-dlp --dump-json` output.

use crate::commands::music::utils::music_manager::MusicError;
use serde_json::Value;
use std::process::Output;
use std::time::Duration;

/// Metadata for a single remote media item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProbeInfo {
    /// The title of the media, if reported.
    pub title: Option<String>,
    /// The duration, absent for live streams or when the extractor can't tell.
    pub duration: Option<Duration>,
    /// Direct URL of the selected audio stream.
    pub playable_url: Option<String>,
    /// Whether any format is DRM protected.
    pub protected: bool,
}

impl ProbeInfo {
    /// Extracts the fields we use from a yt-dlp info dict.
    pub fn from_ytdlp_json(json: &Value) -> Self {
        let title = json["title"].as_str().map(|s| s.to_string());

        let duration = json["duration"]
            .as_f64()
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok());

        // With a single selected format yt-dlp puts its URL at the top level;
        // merged selections only list them under `requested_formats`.
        let playable_url = json["url"]
            .as_str()
            .or_else(|| {
                json["requested_formats"]
                    .as_array()
                    .and_then(|formats| {
                        formats
                            .iter()
                            .find(|f| f["vcodec"].as_str() == Some("none"))
                            .or_else(|| formats.first())
                    })
                    .and_then(|f| f["url"].as_str())
            })
            .map(|s| s.to_string());

        let protected = json["_has_drm"].as_bool().unwrap_or(false)
            || json["formats"].as_array().is_some_and(|formats| {
                formats
                    .iter()
                    .any(|f| f["has_drm"].as_bool().unwrap_or(false))
            });

        Self {
            title,
            duration,
            playable_url,
            protected,
        }
    }
}

/// Converts the output of `yt-dlp --dump-json` into `ProbeInfo`.
impl TryFrom<Output> for ProbeInfo {
    type Error = MusicError;

    fn try_from(value: Output) -> Result<Self, Self::Error> {
        if !value.status.success() {
            let stderr = String::from_utf8_lossy(&value.stderr);
            return Err(MusicError::ResolutionError(
                stderr
                    .lines()
                    .rev()
                    .find(|line| !line.trim().is_empty())
                    .unwrap_or("metadata extraction failed")
                    .trim()
                    .to_string(),
            ));
        }

        let metadata_str = String::from_utf8_lossy(&value.stdout);
        let metadata_json: Value = serde_json::from_str(&metadata_str).map_err(|e| {
            MusicError::ResolutionError(format!("Failed to parse media metadata: {}", e))
        })?;

        Ok(Self::from_ytdlp_json(&metadata_json))
    }
}
