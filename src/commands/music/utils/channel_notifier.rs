use poise::serenity_prelude as serenity;
use serenity::async_trait;
use serenity::http::Http;
use serenity::model::id::ChannelId;
use std::sync::Arc;
use tracing::warn;

use super::media_resolver::{Notice, Notifier};

/// Posts resolver notices as plain messages in a text channel.
pub struct ChannelNotifier {
    http: Arc<Http>,
    channel_id: ChannelId,
}

impl ChannelNotifier {
    pub fn new(http: Arc<Http>, channel_id: ChannelId) -> Self {
        Self { http, channel_id }
    }
}

#[async_trait]
impl Notifier for ChannelNotifier {
    async fn notify(&self, notice: Notice) {
        if let Err(e) = self.channel_id.say(self.http.as_ref(), notice.to_string()).await {
            warn!(
                "Failed to post notice to channel {}: {}",
                self.channel_id, e
            );
        }
    }
}
