use reqwest::header::AUTHORIZATION;
use serde::Serialize;
use url::Url;

use crate::auth;
use crate::message::{self, model::Message};

use super::model::Conversation;

pub struct ConversationRepository {
    http: reqwest::Client,
    api_url: Url,
    token: auth::Token,
}

#[derive(Serialize)]
struct MarkReadRequest {
    message_ids: Vec<message::Id>,
}

impl ConversationRepository {
    pub fn new(http: reqwest::Client, api_url: Url, token: auth::Token) -> Self {
        Self {
            http,
            api_url,
            token,
        }
    }

    fn endpoint(&self, path: &str) -> super::Result<Url> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(path.split('/'));
        Ok(url)
    }

    pub async fn find_all(&self) -> super::Result<Vec<Conversation>> {
        let conversations = self
            .http
            .get(self.endpoint("messages/conversations")?)
            .header(AUTHORIZATION, self.token.bearer())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(conversations)
    }

    pub async fn find_history(&self, participant: &message::Sub) -> super::Result<Vec<Message>> {
        let messages = self
            .http
            .get(self.endpoint(&format!("messages/{participant}"))?)
            .header(AUTHORIZATION, self.token.bearer())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(messages)
    }

    // idempotent on the server; safe to retry
    pub async fn mark_read(&self, message_ids: Vec<message::Id>) -> super::Result<()> {
        self.http
            .put(self.endpoint("messages/read")?)
            .header(AUTHORIZATION, self.token.bearer())
            .json(&MarkReadRequest { message_ids })
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}
