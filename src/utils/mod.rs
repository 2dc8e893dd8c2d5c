//! This module aggregates various utility submodules used throughout the application.

/// Persistent per-guild alias -> URL store backed by a JSON file.
pub mod alias_store;
/// Reply embeds shared by every command.
pub mod embedded_messages;
