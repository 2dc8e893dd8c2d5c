//! This module aggregates all the command modules for the bot.

/// Commands managing the per-guild audio aliases (save, rename, delete, list).
pub mod aliases;
/// Commands related to audio playback (play, loop, stop).
pub mod music;
