use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use poise::serenity_prelude as serenity;
use serenity::async_trait;
use songbird::tracks::PlayMode;
use songbird::{Event, EventContext};
use tracing::{debug, warn};

use super::voice_transport::FinishHandler;

/// Songbird track-event handler that forwards the first End/Error event of a
/// track to a [`FinishHandler`].
pub struct TrackEndNotifier {
    handler: Arc<dyn FinishHandler>,
    fired: Arc<AtomicBool>,
}

impl TrackEndNotifier {
    pub fn new(handler: Arc<dyn FinishHandler>, fired: Arc<AtomicBool>) -> Self {
        Self { handler, fired }
    }
}

#[async_trait]
impl songbird::EventHandler for TrackEndNotifier {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        if let EventContext::Track(tracks) = ctx {
            if self.fired.swap(true, Ordering::AcqRel) {
                debug!("Track end already reported, ignoring duplicate event");
                return Some(Event::Cancel);
            }

            let error = tracks.iter().find_map(|(state, _)| match &state.playing {
                PlayMode::Errored(err) => Some(format!("{:?}", err)),
                _ => None,
            });

            if let Some(err) = &error {
                warn!("Track ended with an error: {}", err);
            }

            self.handler.finished(error).await;
        }

        Some(Event::Cancel)
    }
}
