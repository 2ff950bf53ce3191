use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message as Frame;
use url::Url;

use agency_chat::auth::Token;
use agency_chat::event;
use agency_chat::event::context::OUTBOX_CAPACITY;
use agency_chat::event::model::{Inbound, Outbound, SendState};
use agency_chat::event::service::ChannelService;
use agency_chat::message::Sub;

#[test]
fn send_while_disconnected_queues_and_emits_nothing() {
    let service = ChannelService::new();

    service
        .send_message(&Sub("user-1".into()), "hello")
        .unwrap();

    assert!(!service.is_connected());
    assert_eq!(service.send_state(), SendState::Sending);
    assert_eq!(
        service.context().pending(),
        vec![Outbound::SendMessage {
            content: "hello".into(),
            receiver_id: Sub("user-1".into()),
        }]
    );
}

#[test]
fn outbox_is_bounded() {
    let service = ChannelService::new();

    for i in 0..OUTBOX_CAPACITY {
        service.set_typing(i % 2 == 0).unwrap();
    }

    let err = service
        .send_message(&Sub("user-1".into()), "overflow")
        .unwrap_err();
    assert!(matches!(err, event::Error::OutboxFull));

    // the rejected send never left Composing
    assert_eq!(service.send_state(), SendState::Composing);
    assert_eq!(service.context().pending().len(), OUTBOX_CAPACITY);
}

#[test]
fn empty_content_is_rejected() {
    let service = ChannelService::new();
    assert!(service.send_message(&Sub("user-1".into()), "   ").is_err());
    assert!(service.context().pending().is_empty());
}

#[test]
fn rejected_send_moves_state_to_failed_and_reenables_input() {
    let service = ChannelService::new();

    service
        .send_message(&Sub("user-1".into()), "hello")
        .unwrap();
    assert!(service.send_state().input_disabled());

    service.handle_inbound(Inbound::MessageError {
        message: "receiver not found".into(),
    });

    assert_eq!(service.send_state(), SendState::Failed);
    assert!(!service.send_state().input_disabled());

    // the channel accepts the next send after a failure
    service
        .send_message(&Sub("user-1".into()), "hello again")
        .unwrap();
    assert_eq!(service.send_state(), SendState::Sending);
}

#[test]
fn teardown_drops_queued_frames() {
    let service = ChannelService::new();

    service.send_message(&Sub("user-1".into()), "hi").unwrap();
    service.close();

    assert!(service.context().pending().is_empty());
    assert!(matches!(
        service.set_typing(true).unwrap_err(),
        event::Error::Closed
    ));
}

#[tokio::test]
async fn queued_send_flushes_on_connect_and_ack_moves_state() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let url = Url::parse(&format!("ws://{addr}")).unwrap();

    let service = ChannelService::new();
    let mut events = service.subscribe();

    // typed before the connection exists: queued, nothing on the wire yet
    service
        .send_message(&Sub("user-1".into()), "hello")
        .unwrap();
    assert_eq!(service.send_state(), SendState::Sending);

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

        let frame = ws.next().await.unwrap().unwrap();
        let out: Outbound = serde_json::from_str(frame.to_text().unwrap()).unwrap();
        assert_eq!(
            out,
            Outbound::SendMessage {
                content: "hello".into(),
                receiver_id: Sub("user-1".into()),
            }
        );

        let ack = json!({
            "type": "message_sent",
            "message": {
                "id": "m-1",
                "sender_id": "admin",
                "receiver_id": "user-1",
                "content": "hello",
                "created_at": 1700000000,
                "status": "delivered",
                "is_from_user": false
            }
        });
        ws.send(Frame::text(ack.to_string())).await.unwrap();

        // hold the socket open until the client closes it
        while let Some(Ok(frame)) = ws.next().await {
            if frame.is_close() {
                break;
            }
        }
    });

    let pump = tokio::spawn({
        let service = service.clone();
        let token = Token::new("secret");
        async move { event::client::run(&url, &token, service).await }
    });

    let event = events.next().await.unwrap().unwrap();
    assert!(matches!(event, Inbound::MessageSent { .. }));
    assert_eq!(service.send_state(), SendState::Sent);
    assert!(service.is_connected());
    assert!(service.context().pending().is_empty());

    service.close();
    pump.await.unwrap().unwrap();
    server.await.unwrap();
    assert!(!service.is_connected());
}

#[tokio::test]
async fn close_during_a_live_connection_ends_the_pump() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let url = Url::parse(&format!("ws://{addr}")).unwrap();

    let service = ChannelService::new();
    // queued beforehand so the pump flushes before its first teardown poll
    service
        .send_message(&Sub("user-1".into()), "hello")
        .unwrap();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

        // read but never answer; the pump sits on an idle socket
        while let Some(Ok(frame)) = ws.next().await {
            if frame.is_close() {
                break;
            }
        }
    });

    let pump = tokio::spawn({
        let service = service.clone();
        let token = Token::new("secret");
        async move { event::client::run(&url, &token, service).await }
    });

    let mut connected = service.watch_connected();
    connected.wait_for(|up| *up).await.unwrap();

    service.close();

    // close alone must end the pump; the server sends nothing to wake it
    tokio::time::timeout(Duration::from_secs(5), pump)
        .await
        .expect("pump kept running after close")
        .unwrap()
        .unwrap();
    server.await.unwrap();
    assert!(!service.is_connected());
}

#[tokio::test]
async fn frames_queued_while_connected_go_out_in_order() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let url = Url::parse(&format!("ws://{addr}")).unwrap();

    let service = ChannelService::new();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

        let mut received = Vec::new();
        while let Some(Ok(frame)) = ws.next().await {
            if frame.is_close() {
                break;
            }
            received.push(serde_json::from_str::<Outbound>(frame.to_text().unwrap()).unwrap());
            if received.len() == 2 {
                break;
            }
        }
        received
    });

    let pump = tokio::spawn({
        let service = service.clone();
        let token = Token::new("secret");
        async move { event::client::run(&url, &token, service).await }
    });

    let mut connected = service.watch_connected();
    connected.wait_for(|up| *up).await.unwrap();

    service.set_typing(true).unwrap();
    service.set_typing(false).unwrap();

    let received = server.await.unwrap();
    assert_eq!(
        received,
        vec![
            Outbound::Typing { is_typing: true },
            Outbound::Typing { is_typing: false },
        ]
    );

    service.close();
    pump.await.unwrap().unwrap();
}
