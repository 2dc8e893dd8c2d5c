//! Echo: a voice-channel audio bot. Guild members save short aliases for
//! remote media and play or loop them in the voice channel they are in.

use std::sync::{Arc, LazyLock};

pub mod commands;
pub mod config;
pub mod utils;

use commands::music::utils::playback_manager::PlaybackManager;
use config::Config;
use utils::alias_store::AliasStore;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;
pub type CommandResult = Result<(), Error>;

/// Shared HTTP client used for streaming remote audio.
pub static HTTP_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(reqwest::Client::new);

/// User data available in every command invocation.
pub struct Data {
    pub config: Arc<Config>,
    pub aliases: Arc<AliasStore>,
    pub playback: Arc<PlaybackManager>,
}
