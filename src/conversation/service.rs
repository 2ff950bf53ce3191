use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use log::warn;
use tokio::sync::RwLock;
use tokio::time::MissedTickBehavior;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

use crate::event::model::Inbound;
use crate::event::service::ChannelService;
use crate::message::{self, model::Message};

use super::model::Conversation;
use super::repository::ConversationRepository;

// summaries kept approximately live by a fixed-interval poll plus push events
#[derive(Clone)]
pub struct ConversationService {
    repository: Arc<ConversationRepository>,
    channel: ChannelService,
    conversations: Arc<RwLock<HashMap<message::Sub, Conversation>>>,
    history: Arc<RwLock<HashMap<message::Sub, Vec<Message>>>>,
    active: Arc<RwLock<Option<message::Sub>>>,
}

impl ConversationService {
    pub fn new(repository: ConversationRepository, channel: ChannelService) -> Self {
        Self {
            repository: Arc::new(repository),
            channel,
            conversations: Arc::new(RwLock::new(HashMap::new())),
            history: Arc::new(RwLock::new(HashMap::new())),
            active: Arc::new(RwLock::new(None)),
        }
    }
}

impl ConversationService {
    pub async fn find_all(&self) -> Vec<Conversation> {
        let mut all: Vec<_> = self.conversations.read().await.values().cloned().collect();
        all.sort_by_key(|c| {
            Reverse(
                c.last_message
                    .as_ref()
                    .map(|m| m.created_at)
                    .unwrap_or_default(),
            )
        });
        all
    }

    pub async fn unread_total(&self) -> usize {
        self.conversations
            .read()
            .await
            .values()
            .map(|c| c.unread_count)
            .sum()
    }

    // the server list replaces the local summaries wholesale
    pub async fn refresh(&self) -> super::Result<()> {
        let fresh = self.repository.find_all().await?;

        let mut conversations = self.conversations.write().await;
        conversations.clear();
        for conversation in fresh {
            conversations.insert(conversation.participant.clone(), conversation);
        }

        Ok(())
    }

    // fetch then acknowledge, not atomic; the retry after a crash in between
    // acknowledges the same ids again
    pub async fn open(&self, participant: &message::Sub) -> super::Result<Vec<Message>> {
        let mut messages = self.repository.find_history(participant).await?;

        let unread: Vec<message::Id> = messages
            .iter()
            .filter(|m| m.is_from_user && !m.is_read())
            .map(|m| m.id.clone())
            .collect();
        if !unread.is_empty() {
            self.repository.mark_read(unread).await?;
        }

        for message in &mut messages {
            if message.is_from_user {
                message.mark_read();
            }
        }

        self.set_active(Some(participant.clone())).await;
        self.history
            .write()
            .await
            .insert(participant.clone(), messages.clone());
        self.conversations.write().await.insert(
            participant.clone(),
            Conversation::digest(participant.clone(), &messages),
        );

        Ok(messages)
    }

    // inbound messages for the active conversation are receipted immediately
    // instead of raising the unread badge
    pub async fn set_active(&self, participant: Option<message::Sub>) {
        *self.active.write().await = participant;
    }

    pub async fn close_active(&self) {
        self.set_active(None).await;
    }

    pub async fn active(&self) -> Option<message::Sub> {
        self.active.read().await.clone()
    }
}

impl ConversationService {
    // runs until the channel is torn down
    pub async fn run(&self, poll_interval: Duration) {
        let ctx = self.channel.context().clone();
        let mut events = self.channel.subscribe();
        let mut poll = tokio::time::interval(poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let close = ctx.close.notified();
        tokio::pin!(close);
        close.as_mut().enable();

        loop {
            if ctx.is_closed() {
                break;
            }

            tokio::select! {
                _ = &mut close => break,

                _ = poll.tick() => {
                    if let Err(e) = self.refresh().await {
                        warn!("failed to refresh conversations: {e}");
                    }
                }

                event = events.next() => match event {
                    None => break,
                    Some(Err(BroadcastStreamRecvError::Lagged(n))) => {
                        warn!("console dropped {n} channel events");
                    }
                    Some(Ok(event)) => self.apply(&event).await,
                }
            }
        }
    }

    pub async fn apply(&self, event: &Inbound) {
        match event {
            Inbound::NewMessage { message } | Inbound::MessageSent { message } => {
                self.append(message.clone()).await;
            }
            Inbound::MessagesRead { message_ids } => self.fold_read_receipts(message_ids).await,
            Inbound::AdminTyping { .. } | Inbound::MessageError { .. } => {}
        }
    }

    async fn append(&self, mut message: Message) {
        let participant = if message.is_from_user {
            message.sender_id.clone()
        } else {
            message.receiver_id.clone()
        };

        if message.is_from_user && self.active.read().await.as_ref() == Some(&participant) {
            // receipt goes straight back while the conversation is on screen
            if let Err(e) = self.channel.mark_as_read(vec![message.id.clone()]) {
                warn!("failed to emit read receipt: {e}");
            }
            message.mark_read();
        }

        // append-only, arrival order
        self.history
            .write()
            .await
            .entry(participant.clone())
            .or_default()
            .push(message.clone());

        let mut conversations = self.conversations.write().await;
        let entry = conversations
            .entry(participant.clone())
            .or_insert_with(|| Conversation::empty(participant));
        entry.message_count += 1;
        if message.is_from_user && !message.is_read() {
            entry.unread_count += 1;
        }
        entry.last_message = Some(message);
    }

    // conversations known only by summary reconcile on the next poll
    async fn fold_read_receipts(&self, message_ids: &[message::Id]) {
        let mut history = self.history.write().await;
        let mut conversations = self.conversations.write().await;

        for (participant, messages) in history.iter_mut() {
            let mut touched = false;
            for message in messages.iter_mut() {
                if !message.is_read() && message_ids.contains(&message.id) {
                    message.mark_read();
                    touched = true;
                }
            }
            if touched {
                conversations.insert(
                    participant.clone(),
                    Conversation::digest(participant.clone(), messages),
                );
            }
        }
    }
}
