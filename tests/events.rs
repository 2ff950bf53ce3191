use agency_chat::event::model::{Inbound, Outbound, SendState};
use agency_chat::message::{Id, Sub};
use serde_json::json;

#[test]
fn outbound_events_match_the_wire_vocabulary() {
    let send = Outbound::SendMessage {
        content: "two tickets please".into(),
        receiver_id: Sub("user-7".into()),
    };
    assert_eq!(
        serde_json::to_value(&send).unwrap(),
        json!({
            "type": "send_message",
            "content": "two tickets please",
            "receiver_id": "user-7"
        })
    );

    let read = Outbound::MarkAsRead {
        message_ids: vec![Id("m-1".into()), Id("m-2".into())],
    };
    assert_eq!(
        serde_json::to_value(&read).unwrap(),
        json!({ "type": "mark_as_read", "message_ids": ["m-1", "m-2"] })
    );

    let typing = Outbound::Typing { is_typing: true };
    assert_eq!(
        serde_json::to_value(&typing).unwrap(),
        json!({ "type": "typing", "is_typing": true })
    );
}

#[test]
fn inbound_events_parse_from_the_wire_vocabulary() {
    let raw = json!({
        "type": "new_message",
        "message": {
            "id": "m-9",
            "sender_id": "user-7",
            "receiver_id": "admin",
            "content": "is the tour still on?",
            "created_at": 1700000000,
            "status": "sent",
            "is_from_user": true
        }
    });
    let event: Inbound = serde_json::from_value(raw).unwrap();
    match event {
        Inbound::NewMessage { message } => {
            assert_eq!(message.id, Id("m-9".into()));
            assert!(message.is_from_user);
            assert!(!message.is_read());
        }
        other => panic!("expected new_message, got {other:?}"),
    }

    let event: Inbound =
        serde_json::from_value(json!({ "type": "admin_typing", "is_typing": false })).unwrap();
    assert!(matches!(event, Inbound::AdminTyping { is_typing: false }));

    let event: Inbound =
        serde_json::from_value(json!({ "type": "messages_read", "message_ids": ["m-1"] })).unwrap();
    assert!(matches!(event, Inbound::MessagesRead { message_ids } if message_ids == vec![Id("m-1".into())]));

    let event: Inbound =
        serde_json::from_value(json!({ "type": "message_error", "message": "too long" })).unwrap();
    assert!(matches!(event, Inbound::MessageError { message } if message == "too long"));
}

#[test]
fn malformed_frames_do_not_parse() {
    assert!(serde_json::from_str::<Inbound>("{\"type\":\"unknown_event\"}").is_err());
    assert!(serde_json::from_str::<Inbound>("not json").is_err());
}

#[test]
fn input_is_disabled_exactly_while_sending() {
    assert!(!SendState::Composing.input_disabled());
    assert!(SendState::Sending.input_disabled());
    assert!(!SendState::Sent.input_disabled());
    assert!(!SendState::Failed.input_disabled());
}
