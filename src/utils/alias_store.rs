//! Persistent per-guild alias map.
//!
//! The on-disk format is a JSON object keyed by guild id, each value mapping
//! alias to source URL:
//!
//! ```json
//! { "123456789": { "airhorn": "https://www.youtube.com/watch?v=..." } }
//! ```
//!
//! The whole file is rewritten on every mutation.

use serenity::model::id::GuildId;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use tracing::{debug, info};

/// guild id -> (alias -> url)
pub type AliasMap = BTreeMap<String, BTreeMap<String, String>>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Alias store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Alias store is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Alias store lock poisoned")]
    Poisoned,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Result of [`AliasStore::rename`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameOutcome {
    Renamed,
    NotFound,
    AlreadyExists,
}

pub struct AliasStore {
    path: PathBuf,
    aliases: Mutex<AliasMap>,
}

impl AliasStore {
    /// Opens the store at `path`, creating an empty `{}` file if none exists.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();

        if !path.exists() {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, "{}")?;
            info!("Created new alias store at {:?}", path);
        }

        let content = fs::read_to_string(&path)?;
        let aliases: AliasMap = if content.trim().is_empty() {
            AliasMap::new()
        } else {
            serde_json::from_str(&content)?
        };

        info!(
            "Loaded aliases for {} guild(s) from {:?}",
            aliases.len(),
            path
        );

        Ok(Self {
            path,
            aliases: Mutex::new(aliases),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, AliasMap>> {
        self.aliases.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Writes the full map to a sibling temp file, then swaps it into place.
    fn persist(&self, aliases: &AliasMap) -> StoreResult<()> {
        let serialized = serde_json::to_string_pretty(aliases)?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, serialized)?;
        fs::rename(&tmp_path, &self.path)?;
        debug!("Saved alias store to {:?}", self.path);
        Ok(())
    }

    /// Applies `change` to a copy of the map and commits it only once it is on disk.
    fn mutate<T>(&self, change: impl FnOnce(&mut AliasMap) -> T) -> StoreResult<T> {
        let mut aliases = self.lock()?;
        let mut updated = aliases.clone();
        let result = change(&mut updated);
        if updated != *aliases {
            self.persist(&updated)?;
            *aliases = updated;
        }
        Ok(result)
    }

    pub fn get(&self, guild_id: GuildId, alias: &str) -> StoreResult<Option<String>> {
        let aliases = self.lock()?;
        Ok(aliases
            .get(&guild_id.to_string())
            .and_then(|guild| guild.get(alias))
            .cloned())
    }

    /// Inserts or overwrites `alias`.
    pub fn put(&self, guild_id: GuildId, alias: &str, url: &str) -> StoreResult<()> {
        self.mutate(|aliases| {
            aliases
                .entry(guild_id.to_string())
                .or_default()
                .insert(alias.to_string(), url.to_string());
        })
    }

    /// Returns `false` when the alias did not exist.
    pub fn delete(&self, guild_id: GuildId, alias: &str) -> StoreResult<bool> {
        self.mutate(|aliases| {
            aliases
                .get_mut(&guild_id.to_string())
                .and_then(|guild| guild.remove(alias))
                .is_some()
        })
    }

    pub fn rename(&self, guild_id: GuildId, old: &str, new: &str) -> StoreResult<RenameOutcome> {
        self.mutate(|aliases| {
            let Some(guild) = aliases.get_mut(&guild_id.to_string()) else {
                return RenameOutcome::NotFound;
            };
            if !guild.contains_key(old) {
                return RenameOutcome::NotFound;
            }
            if guild.contains_key(new) {
                return RenameOutcome::AlreadyExists;
            }
            match guild.remove(old) {
                Some(url) => {
                    guild.insert(new.to_string(), url);
                    RenameOutcome::Renamed
                }
                None => RenameOutcome::NotFound,
            }
        })
    }

    /// Aliases for the guild, optionally filtered by a case-insensitive
    /// fragment, sorted case-insensitively.
    pub fn list(&self, guild_id: GuildId, fragment: Option<&str>) -> StoreResult<Vec<String>> {
        let aliases = self.lock()?;
        let Some(guild) = aliases.get(&guild_id.to_string()) else {
            return Ok(Vec::new());
        };

        let fragment = fragment.map(str::to_lowercase);
        let mut matches: Vec<String> = guild
            .keys()
            .filter(|alias| {
                fragment
                    .as_deref()
                    .is_none_or(|f| alias.to_lowercase().contains(f))
            })
            .cloned()
            .collect();

        matches.sort_by_key(|alias| alias.to_lowercase());
        Ok(matches)
    }
}
