use serde::{Deserialize, Serialize};

use crate::message::{self, model::Message};

// derived, never stored; recomputed from the message set
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Conversation {
    pub participant: message::Sub,
    pub last_message: Option<Message>,
    pub unread_count: usize,
    pub message_count: usize,
}

impl Conversation {
    pub fn empty(participant: message::Sub) -> Self {
        Self {
            participant,
            last_message: None,
            unread_count: 0,
            message_count: 0,
        }
    }

    // unread means authored by the end-user and not yet read by the admin party
    pub fn digest(participant: message::Sub, messages: &[Message]) -> Self {
        Self {
            participant,
            last_message: messages.last().cloned(),
            unread_count: messages
                .iter()
                .filter(|m| m.is_from_user && !m.is_read())
                .count(),
            message_count: messages.len(),
        }
    }
}
