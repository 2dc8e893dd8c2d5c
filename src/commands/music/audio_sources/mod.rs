//! Remote media metadata and downloads.
//!
//! [`MediaProbe`] is the seam the resolver talks to; [`ytdlp::YtDlp`] is the
//! production implementation backed by the `yt-dlp` executable.

/// Submodule defining `ProbeInfo`, the metadata extracted from a source URL.
pub(crate) mod track_metadata;
/// Submodule implementing `MediaProbe` with `yt-dlp`.
pub(crate) mod ytdlp;

use crate::commands::music::utils::music_manager::MusicResult;
use serenity::async_trait;
use std::path::Path;
use url::Url;

pub use track_metadata::ProbeInfo;
pub use ytdlp::YtDlp;

/// Queries a remote source for metadata and downloads its audio.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaProbe: Send + Sync {
    /// Fetches duration, direct media URL and protection flag without downloading the payload.
    async fn probe(&self, url: &str) -> MusicResult<ProbeInfo>;

    /// Downloads the best audio stream of `url` to `dest`.
    async fn download(&self, url: &str, dest: &Path) -> MusicResult<()>;
}

/// A utility struct providing general helper functions related to audio sources.
pub struct AudioSource;

impl AudioSource {
    /// Performs a basic check if the input string can be parsed as a URL.
    /// Does not validate if the URL is actually reachable or supported.
    pub fn is_url(input: &str) -> bool {
        Url::parse(input).is_ok_and(|url| url.has_host())
    }
}
