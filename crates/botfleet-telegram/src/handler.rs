// SPDX-FileCopyrightText: 2026 Botfleet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversion of incoming Telegram updates into channel-agnostic messages.

use botfleet_core::types::InboundMessage;
use teloxide::types::Message;

/// Nickname used when the sender has no first name.
const DEFAULT_NICKNAME: &str = "User";

/// Converts a Telegram text message into an [`InboundMessage`].
///
/// Returns `None` for anything without text (stickers, photos, service
/// messages). The chat id doubles as the user id.
pub fn to_inbound_message(msg: &Message) -> Option<InboundMessage> {
    let text = msg.text()?;

    let (sender_name, sender_handle) = match msg.from.as_ref() {
        Some(user) if !user.first_name.is_empty() => {
            (user.first_name.clone(), user.username.clone())
        }
        Some(user) => (DEFAULT_NICKNAME.to_string(), user.username.clone()),
        None => (DEFAULT_NICKNAME.to_string(), None),
    };

    Some(InboundMessage {
        chat_id: msg.chat.id.0.to_string(),
        sender_name,
        sender_handle,
        text: text.to_string(),
        timestamp: chrono::DateTime::to_rfc3339(&msg.date),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_message(from: serde_json::Value, extra: serde_json::Value) -> Message {
        let mut json = serde_json::json!({
            "message_id": 1,
            "date": 1700000000i64,
            "chat": {
                "id": 12345i64,
                "type": "private",
                "first_name": "Test",
            },
        });
        if !from.is_null() {
            json["from"] = from;
        }
        if let (Some(obj), Some(extra)) = (json.as_object_mut(), extra.as_object()) {
            for (k, v) in extra {
                obj.insert(k.clone(), v.clone());
            }
        }
        serde_json::from_value(json).expect("failed to deserialize mock message")
    }

    #[test]
    fn text_message_maps_fields() {
        let msg = make_message(
            serde_json::json!({
                "id": 12345,
                "is_bot": false,
                "first_name": "Ann",
                "username": "ann_k",
            }),
            serde_json::json!({ "text": "hello" }),
        );
        let inbound = to_inbound_message(&msg).unwrap();

        assert_eq!(inbound.chat_id, "12345");
        assert_eq!(inbound.sender_name, "Ann");
        assert_eq!(inbound.sender_handle.as_deref(), Some("ann_k"));
        assert_eq!(inbound.text, "hello");
        assert!(inbound.timestamp.starts_with("2023-11-14"));
    }

    #[test]
    fn missing_sender_uses_default_nickname() {
        let msg = make_message(serde_json::Value::Null, serde_json::json!({ "text": "hi" }));
        let inbound = to_inbound_message(&msg).unwrap();
        assert_eq!(inbound.sender_name, DEFAULT_NICKNAME);
        assert!(inbound.sender_handle.is_none());
    }

    #[test]
    fn non_text_message_is_ignored() {
        let msg = make_message(
            serde_json::json!({
                "id": 12345,
                "is_bot": false,
                "first_name": "Ann",
            }),
            serde_json::json!({
                "location": {
                    "longitude": 30.5,
                    "latitude": 50.4,
                }
            }),
        );
        assert!(to_inbound_message(&msg).is_none());
    }
}
