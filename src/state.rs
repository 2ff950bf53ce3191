use std::sync::Arc;

use crate::auth;
use crate::conversation::repository::ConversationRepository;
use crate::conversation::service::ConversationService;
use crate::event::service::ChannelService;
use crate::integration::{self, Config};
use crate::notification::repository::FileRepository;
use crate::notification::service::NotificationService;

pub type Result<T> = std::result::Result<T, Error>;

// every service is constructed exactly once here; no module-level singletons
#[derive(Clone)]
pub struct AppState {
    pub token: auth::Token,
    pub channel: ChannelService,
    pub conversations: ConversationService,
    pub notifications: Arc<NotificationService>,
}

impl AppState {
    pub fn init(config: &Config) -> Result<Self> {
        // the channel may only exist for a signed-in user
        let token = config.token.clone().ok_or(auth::Error::MissingToken)?;

        let http = integration::init_http_client()?;
        let channel = ChannelService::new();

        let conversations = ConversationService::new(
            ConversationRepository::new(http, config.api_url.clone(), token.clone()),
            channel.clone(),
        );

        let notifications = Arc::new(NotificationService::new(FileRepository::new(
            config.notifications_file.clone(),
        )));

        Ok(Self {
            token,
            channel,
            conversations,
            notifications,
        })
    }
}

#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub enum Error {
    _Auth(#[from] auth::Error),
    _Integration(#[from] integration::Error),
}
