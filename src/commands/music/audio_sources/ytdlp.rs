//! Implements `MediaProbe` with the `yt-dlp` command-line tool.

use std::path::Path;
use std::process::Stdio;

use serenity::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use super::{MediaProbe, ProbeInfo};
use crate::commands::music::utils::music_manager::{MusicError, MusicResult};

/// Best audio-only format, falling back to the best combined one.
const FORMAT: &str = "bestaudio/best";

/// `yt-dlp` backed metadata source.
pub struct YtDlp {
    program: String,
}

impl YtDlp {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.stdin(Stdio::null()).kill_on_drop(true);
        command
    }
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_YTDLP_PATH)
    }
}

#[async_trait]
impl MediaProbe for YtDlp {
    async fn probe(&self, url: &str) -> MusicResult<ProbeInfo> {
        info!("Probing media metadata for {}", url);

        let output = self
            .command()
            .args(["-j", "--no-playlist", "-f", FORMAT, "--", url])
            .output()
            .await
            .map_err(|e| MusicError::ResolutionError(format!("Failed to execute yt-dlp: {}", e)))?;

        let info = ProbeInfo::try_from(output)?;
        debug!(
            "Probed {}: duration {:?}, protected {}",
            url, info.duration, info.protected
        );
        Ok(info)
    }

    async fn download(&self, url: &str, dest: &Path) -> MusicResult<()> {
        info!("Downloading {} to {:?}", url, dest);

        let output = self
            .command()
            .args([
                "--no-playlist",
                "--no-part",
                "--force-overwrites",
                "--quiet",
                "-f",
                FORMAT,
                "-o",
            ])
            .arg(dest)
            .args(["--", url])
            .output()
            .await
            .map_err(|e| MusicError::ResolutionError(format!("Failed to execute yt-dlp: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MusicError::ResolutionError(format!(
                "Download failed: {}",
                stderr.trim()
            )));
        }

        Ok(())
    }
}
