use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use log::warn;

use super::service::ChannelService;

pub const TYPING_IDLE: Duration = Duration::from_secs(1);

// client-local; the server never drives this state
#[derive(Clone)]
pub struct TypingTracker {
    channel: ChannelService,
    typing: Arc<AtomicBool>,
    epoch: Arc<AtomicU64>,
}

impl TypingTracker {
    pub fn new(channel: ChannelService) -> Self {
        Self {
            channel,
            typing: Arc::new(AtomicBool::new(false)),
            epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn keystroke(&self) -> super::Result<()> {
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;

        if !self.typing.swap(true, Ordering::SeqCst) {
            self.channel.set_typing(true)?;
        }

        let typing = Arc::clone(&self.typing);
        let epochs = Arc::clone(&self.epoch);
        let channel = self.channel.clone();

        // only the watcher of the newest keystroke may clear the flag
        tokio::spawn(async move {
            tokio::time::sleep(TYPING_IDLE).await;

            if epochs.load(Ordering::SeqCst) == epoch && typing.swap(false, Ordering::SeqCst) {
                if let Err(e) = channel.set_typing(false) {
                    warn!("failed to emit typing stop: {e}");
                }
            }
        });

        Ok(())
    }

    pub fn is_typing(&self) -> bool {
        self.typing.load(Ordering::SeqCst)
    }
}
