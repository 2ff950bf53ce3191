use std::sync::{Arc, Mutex, PoisonError};

use log::error;
use tokio::sync::{broadcast, watch};
use tokio_stream::wrappers::BroadcastStream;

use crate::message;

use super::context;
use super::model::{Inbound, Outbound, SendState};

const EVENT_BUFFER: usize = 64;

// sending is fire-and-forget; acknowledgement arrives as message_sent or
// message_error on the event stream
#[derive(Clone)]
pub struct ChannelService {
    ctx: context::Channel,
    events: broadcast::Sender<Inbound>,
    send_state: Arc<Mutex<SendState>>,
}

impl ChannelService {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            ctx: context::Channel::new(),
            events,
            send_state: Arc::new(Mutex::new(SendState::Composing)),
        }
    }
}

impl Default for ChannelService {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelService {
    pub fn send_message(&self, receiver_id: &message::Sub, content: &str) -> super::Result<()> {
        if content.trim().is_empty() {
            return Err(message::Error::EmptyContent.into());
        }

        self.ctx.enqueue(Outbound::SendMessage {
            content: content.to_string(),
            receiver_id: receiver_id.clone(),
        })?;
        self.set_send_state(SendState::Sending);

        Ok(())
    }

    pub fn mark_as_read(&self, message_ids: Vec<message::Id>) -> super::Result<()> {
        if message_ids.is_empty() {
            return Ok(());
        }
        self.ctx.enqueue(Outbound::MarkAsRead { message_ids })
    }

    pub fn set_typing(&self, is_typing: bool) -> super::Result<()> {
        self.ctx.enqueue(Outbound::Typing { is_typing })
    }

    pub fn subscribe(&self) -> BroadcastStream<Inbound> {
        BroadcastStream::new(self.events.subscribe())
    }

    pub fn is_connected(&self) -> bool {
        self.ctx.is_connected()
    }

    pub fn watch_connected(&self) -> watch::Receiver<bool> {
        self.ctx.watch_connected()
    }

    pub fn send_state(&self) -> SendState {
        *self
            .send_state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn close(&self) {
        self.ctx.shutdown();
    }

    pub fn context(&self) -> &context::Channel {
        &self.ctx
    }
}

impl ChannelService {
    // called by the socket pump for every decoded inbound frame
    pub fn handle_inbound(&self, event: Inbound) {
        match &event {
            Inbound::MessageSent { .. } => self.set_send_state(SendState::Sent),
            Inbound::MessageError { message } => {
                error!("message rejected by server: {message}");
                self.set_send_state(SendState::Failed);
            }
            _ => {}
        }

        // no subscribers is fine
        let _ = self.events.send(event);
    }

    fn set_send_state(&self, state: SendState) {
        *self
            .send_state
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = state;
    }
}
