use serde::{Deserialize, Serialize};

use super::{Id, Sub};

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Sent,
    Delivered,
    Read,
}

// content is immutable after creation; only status moves, and only forward
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Message {
    pub id: Id,
    pub sender_id: Sub,
    pub receiver_id: Sub,
    pub content: String,
    pub created_at: i64,
    pub status: Status,
    pub is_from_user: bool,
}

impl Message {
    pub fn mark_read(&mut self) {
        self.status = Status::Read;
    }

    pub fn is_read(&self) -> bool {
        self.status == Status::Read
    }
}
