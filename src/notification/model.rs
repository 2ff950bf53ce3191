use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    ReservationCreated,
    ReservationCancelled,
    NewMessage,
    System,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Notification {
    pub id: Uuid,
    pub kind: Kind,
    pub title: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    pub timestamp: i64,
    pub read: bool,
}

impl Notification {
    pub fn new(kind: Kind, title: &str, message: &str, data: Option<serde_json::Value>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            title: title.to_string(),
            message: message.to_string(),
            data,
            timestamp: chrono::Utc::now().timestamp(),
            read: false,
        }
    }
}
