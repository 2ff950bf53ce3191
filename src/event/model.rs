use serde::{Deserialize, Serialize};

use crate::message::{self, model::Message};

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outbound {
    SendMessage {
        content: String,
        receiver_id: message::Sub,
    },
    MarkAsRead {
        message_ids: Vec<message::Id>,
    },
    Typing {
        is_typing: bool,
    },
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Inbound {
    NewMessage { message: Message },
    MessageSent { message: Message },
    MessageError { message: String },
    AdminTyping { is_typing: bool },
    MessagesRead { message_ids: Vec<message::Id> },
}

// state of the latest outbound send on the channel
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SendState {
    #[default]
    Composing,
    Sending,
    Sent,
    Failed,
}

impl SendState {
    pub fn input_disabled(&self) -> bool {
        matches!(self, SendState::Sending)
    }
}
