use std::time::Duration;

use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use log::{debug, error, warn};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message as Frame;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use url::Url;

use crate::auth;

use super::model::Inbound;
use super::service::ChannelService;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

// reconnection with backoff lives here; callers never retry themselves
pub async fn run(ws_url: &Url, token: &auth::Token, service: ChannelService) -> super::Result<()> {
    let bearer =
        HeaderValue::from_str(&token.bearer()).map_err(|_| auth::Error::InvalidToken)?;

    let ctx = service.context().clone();
    let mut backoff = INITIAL_BACKOFF;

    loop {
        if ctx.is_closed() {
            return Ok(());
        }

        let mut request = ws_url.as_str().into_client_request()?;
        request.headers_mut().insert(AUTHORIZATION, bearer.clone());

        let socket = match tokio_tungstenite::connect_async(request).await {
            Ok((socket, _)) => socket,
            Err(e) => {
                warn!("channel connect failed: {e} (retrying in {backoff:?})");
                tokio::select! {
                    _ = ctx.close.notified() => return Ok(()),
                    _ = tokio::time::sleep(backoff) => {}
                }
                backoff = (backoff * 2).min(MAX_BACKOFF);
                continue;
            }
        };

        debug!("channel connected to {ws_url}");
        ctx.set_connected(true);
        backoff = INITIAL_BACKOFF;

        let torn_down = pump(socket, &service).await;

        ctx.set_connected(false);
        if torn_down {
            debug!("channel closed");
            return Ok(());
        }
        warn!("channel disconnected, reconnecting");
    }
}

// returns true on explicit teardown, false on connection loss
async fn pump(socket: Socket, service: &ChannelService) -> bool {
    let ctx = service.context().clone();
    let (mut sender, mut receiver) = socket.split();

    if ctx.is_closed() {
        let _ = sender.send(Frame::Close(None)).await;
        return true;
    }

    // register the teardown waiter before the first flush can block,
    // otherwise a close() during that await is lost
    let close = ctx.close.notified();
    tokio::pin!(close);
    close.as_mut().enable();

    // frames queued while disconnected go out first, oldest first
    if !flush(&mut sender, service).await {
        return false;
    }

    loop {
        tokio::select! {
            _ = &mut close => {
                let _ = sender.send(Frame::Close(None)).await;
                return true;
            }

            _ = ctx.wake.notified() => {
                if !flush(&mut sender, service).await {
                    return false;
                }
            }

            frame = receiver.next() => {
                match frame {
                    None => return false,
                    Some(Err(e)) => {
                        error!("failed to read channel frame: {e}");
                        return false;
                    }
                    Some(Ok(Frame::Text(content))) => dispatch(content.as_str(), service),
                    Some(Ok(Frame::Close(frame))) => {
                        debug!("channel closed by server: {frame:?}");
                        return ctx.is_closed();
                    }
                    Some(Ok(Frame::Ping(_) | Frame::Pong(_))) => {}
                    Some(Ok(other)) => warn!("received non-text channel frame: {other:?}"),
                }
            }
        }
    }
}

async fn flush(sender: &mut SplitSink<Socket, Frame>, service: &ChannelService) -> bool {
    let ctx = service.context();

    while let Some(out) = ctx.pop_outbound() {
        match serde_json::to_string(&out) {
            Ok(payload) => {
                if let Err(e) = sender.send(Frame::text(payload)).await {
                    error!("failed to send channel frame: {e}");
                    ctx.requeue_front(out);
                    return false;
                }
            }
            Err(e) => error!("failed to serialize outbound event: {e}"),
        }
    }

    true
}

fn dispatch(content: &str, service: &ChannelService) {
    match serde_json::from_str::<Inbound>(content) {
        Ok(event) => service.handle_inbound(event),
        Err(_) => warn!("skipping channel frame, content is malformed: {content}"),
    }
}
