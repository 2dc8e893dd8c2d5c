use poise::{serenity_prelude as serenity, CreateReply};
use serenity::all::CreateEmbed;
use std::fmt::Display;

use crate::commands::music::utils::media_resolver::PlaybackSource;

/// Embed descriptions are capped at 4096 characters; leave room for the footer line.
const MAX_LIST_CHARS: usize = 3900;

fn success(title: &str, description: impl Into<String>) -> CreateReply {
    CreateReply::default().embed(
        CreateEmbed::new()
            .title(title)
            .description(description)
            .color(0x00ff00),
    )
}

fn failure(description: impl Into<String>) -> CreateReply {
    CreateReply::default().embed(
        CreateEmbed::new()
            .title("❌ Error")
            .description(description)
            .color(0xff0000),
    )
}

/// Create an embed for any error surfaced to the user
pub fn error(err: impl Display) -> CreateReply {
    failure(err.to_string())
}

/// Create an embed for when a user is not connected to a voice channel
pub fn user_not_in_voice_channel(err: impl Display) -> CreateReply {
    failure(format!("You need to be in a voice channel: {}", err)).ephemeral(true)
}

/// Create an embed for when playback has started
pub fn now_playing(target: &str, source: &PlaybackSource, looped: bool) -> CreateReply {
    let how = match source {
        PlaybackSource::RemoteStream { .. } => "Streaming",
        PlaybackSource::LocalFile { .. } => "Downloaded",
    };

    CreateReply::default().embed(
        CreateEmbed::new()
            .title(if looped { "🔁 Looping" } else { "🎵 Now Playing" })
            .description(format!("`{}`", target))
            .field("Source", how, true)
            .color(0x00ff00),
    )
}

/// Create an embed for when a start was stopped or replaced before playing
pub fn cancelled(target: &str) -> CreateReply {
    CreateReply::default().embed(
        CreateEmbed::new()
            .title("⏹️ Cancelled")
            .description(format!("`{}` was stopped before it started", target)),
    )
}

/// Create an embed for when the bot stops playing
pub fn stopped(had_session: bool) -> CreateReply {
    success(
        "⏹️ Stopped",
        if had_session {
            "Playback stopped and left the voice channel"
        } else {
            "Nothing was playing"
        },
    )
}

pub fn saved(alias: &str) -> CreateReply {
    success("💾 Saved", format!("Saved `{}`.", alias))
}

pub fn invalid_url(url: &str) -> CreateReply {
    failure(format!("`{}` is not a valid URL.", url))
}

pub fn renamed(old: &str, new: &str) -> CreateReply {
    success("✏️ Renamed", format!("Renamed `{}` to `{}`.", old, new))
}

pub fn alias_not_found(alias: &str) -> CreateReply {
    failure(format!("Audio `{}` not found.", alias))
}

pub fn alias_already_exists(alias: &str) -> CreateReply {
    failure(format!("Audio `{}` already exists.", alias))
}

pub fn deleted(alias: &str) -> CreateReply {
    success("🗑️ Deleted", format!("Deleted `{}`.", alias))
}

pub fn delete_not_found() -> CreateReply {
    failure("Audio alias not found.")
}

/// Create an embed listing saved aliases
pub fn alias_list(aliases: &[String]) -> CreateReply {
    if aliases.is_empty() {
        return success("📂 Saved audio", "No audio saved for this server.");
    }

    success("📂 Saved audio", format_alias_list(aliases))
}

/// "Saved audio:" followed by one alias per line, truncated to fit an embed.
pub fn format_alias_list(aliases: &[String]) -> String {
    let mut description = String::from("Saved audio:");

    for (index, alias) in aliases.iter().enumerate() {
        let line = format!("\n{}", alias);
        if description.chars().count() + line.chars().count() > MAX_LIST_CHARS {
            description.push_str(&format!("\n… and {} more", aliases.len() - index));
            break;
        }
        description.push_str(&line);
    }

    description
}
