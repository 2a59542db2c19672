//! Download hand-off
//!
//! Crawlers end their work on a media URL by passing a [`MediaItem`] to a
//! [`MediaSink`]. What happens to it afterwards (transfer, dedup, checksums)
//! belongs to the download stage.

use crate::item::MediaItem;
use crate::HarvestError;
use async_trait::async_trait;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// Receiver of resolved media
#[async_trait]
pub trait MediaSink: Send + Sync {
    async fn handle_file(&self, media: MediaItem) -> Result<(), HarvestError>;
}

/// Sink forwarding every item to an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: UnboundedSender<MediaItem>,
}

impl ChannelSink {
    /// Creates a sink and the receiver that drains it
    pub fn new() -> (Self, UnboundedReceiver<MediaItem>) {
        let (tx, rx) = unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl MediaSink for ChannelSink {
    async fn handle_file(&self, media: MediaItem) -> Result<(), HarvestError> {
        self.tx.send(media).map_err(|e| HarvestError::SinkClosed {
            url: e.0.url.to_string(),
        })
    }
}
