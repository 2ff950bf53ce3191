use std::sync::Arc;

use futures::StreamExt;
use log::{error, info, warn};
use serde_json::json;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

use agency_chat::event;
use agency_chat::event::model::Inbound;
use agency_chat::event::service::ChannelService;
use agency_chat::integration::Config;
use agency_chat::notification::model::Kind;
use agency_chat::notification::service::NotificationService;
use agency_chat::state::AppState;

#[tokio::main]
async fn main() {
    let config = Config::default();

    let state = match AppState::init(&config) {
        Ok(state) => state,
        Err(e) => {
            error!("failed to initialize: {e}");
            return;
        }
    };

    let pump = tokio::spawn({
        let ws_url = config.ws_url.clone();
        let token = state.token.clone();
        let channel = state.channel.clone();
        async move {
            if let Err(e) = event::client::run(&ws_url, &token, channel).await {
                error!("channel pump failed: {e}");
            }
        }
    });

    let console = tokio::spawn({
        let conversations = state.conversations.clone();
        let poll_interval = config.poll_interval;
        async move { conversations.run(poll_interval).await }
    });

    let forwarder = tokio::spawn(forward_notifications(
        state.channel.clone(),
        Arc::clone(&state.notifications),
    ));

    info!("agency chat client started");

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {e}");
    }

    info!("shutting down");
    state.channel.close();
    let _ = tokio::join!(pump, console, forwarder);
}

// turns inbound user messages into entries in the notification store
async fn forward_notifications(channel: ChannelService, notifications: Arc<NotificationService>) {
    let ctx = channel.context().clone();
    let mut events = channel.subscribe();

    let close = ctx.close.notified();
    tokio::pin!(close);
    close.as_mut().enable();

    loop {
        if ctx.is_closed() {
            break;
        }

        tokio::select! {
            _ = &mut close => break,

            event = events.next() => match event {
                None => break,
                Some(Err(BroadcastStreamRecvError::Lagged(n))) => {
                    warn!("notification forwarder dropped {n} channel events");
                }
                Some(Ok(Inbound::NewMessage { message })) if message.is_from_user => {
                    notifications.add(
                        Kind::NewMessage,
                        "New message",
                        &message.content,
                        Some(json!({ "sender_id": message.sender_id })),
                    );
                }
                Some(Ok(_)) => {}
            }
        }
    }
}
