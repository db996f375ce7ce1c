//! Raw records as delivered by the transport / server.
//!
//! Parsing is lenient where other clients disagree on shape (`id` vs `_id`,
//! sender as an id or an embedded user object, RFC 3339 vs epoch-millis
//! timestamps) and strict only on what rendering cannot do without: an id and
//! a creation time.

use chrono::{DateTime, TimeZone, Utc};
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use vl_proto::Envelope;

use crate::error::ViewError;

/// Attachment metadata. Opaque pass-through; only classified, never opened.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, alias = "mimetype", alias = "contentType")]
    pub mime_type: Option<String>,
    #[serde(default, alias = "filename", alias = "name")]
    pub file_name: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    #[serde(default, alias = "user")]
    pub user_id: String,
    #[serde(default)]
    pub emoji: String,
}

/// Sender as sent by the server: a bare id or a populated user object.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SenderRef {
    Id(String),
    User {
        #[serde(alias = "_id")]
        id: String,
    },
}

impl SenderRef {
    pub fn id(&self) -> &str {
        match self {
            SenderRef::Id(id) | SenderRef::User { id } => id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMessage {
    #[serde(alias = "_id")]
    pub id: String,

    #[serde(default)]
    pub chat_id: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub sender_id: Option<SenderRef>,
    /// Older servers send `sender`, often as a populated user object.
    #[serde(default, deserialize_with = "lenient")]
    pub sender: Option<SenderRef>,

    #[serde(deserialize_with = "timestamp")]
    pub created_at: DateTime<Utc>,

    /// Explicit content type tag (`text`, `image`, ...).
    #[serde(default, rename = "type")]
    pub type_tag: Option<String>,

    /// Plaintext body. For encrypted records this is only a fallback.
    #[serde(default)]
    pub content: Option<String>,

    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default, alias = "fileUrl")]
    pub document_url: Option<String>,

    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub reactions: Vec<Reaction>,
    #[serde(default)]
    pub delivered_to: Vec<String>,
    #[serde(default)]
    pub read_by: Vec<String>,

    /// Deleted for everyone. Either spelling may appear, or both.
    #[serde(default, deserialize_with = "lenient")]
    pub deleted: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub is_deleted: Option<bool>,
    /// Users who deleted the message for themselves only.
    #[serde(default)]
    pub deleted_for: Vec<String>,

    /// Encrypted fields (`ciphertext`, `ciphertextNonce`, `encryptedKeys`,
    /// `reply`). All empty for plaintext records.
    #[serde(flatten)]
    pub envelope: Envelope,
}

impl RawMessage {
    pub fn from_value(value: &Value) -> Result<Self, ViewError> {
        let raw: RawMessage = serde_json::from_value(value.clone())
            .map_err(|e| ViewError::MalformedRecord(e.to_string()))?;
        if raw.id.trim().is_empty() {
            return Err(ViewError::MalformedRecord("empty message id".into()));
        }
        Ok(raw)
    }

    pub fn sender_id(&self) -> &str {
        self.sender_id
            .as_ref()
            .or(self.sender.as_ref())
            .map_or("", SenderRef::id)
    }

    pub fn deleted_for_everyone(&self) -> bool {
        self.deleted.unwrap_or(false) || self.is_deleted.unwrap_or(false)
    }

    pub fn is_encrypted(&self) -> bool {
        !self.envelope.ciphertext.is_empty() || !self.envelope.encrypted_keys.is_empty()
    }

    /// Media URL fields in classification order.
    pub fn media_urls(&self) -> [(crate::display::DisplayKind, Option<&str>); 4] {
        use crate::display::DisplayKind;
        [
            (DisplayKind::Image, self.image_url.as_deref()),
            (DisplayKind::Video, self.video_url.as_deref()),
            (DisplayKind::Audio, self.audio_url.as_deref()),
            (DisplayKind::Document, self.document_url.as_deref()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawParticipant {
    #[serde(default, alias = "_id", alias = "userId")]
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, alias = "avatarUrl")]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawChat {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default, alias = "isGroupChat")]
    pub is_group: bool,
    #[serde(default)]
    pub name: Option<String>,
    /// Authoritative participant records.
    #[serde(default)]
    pub participants: Vec<RawParticipant>,
    /// Bare member ids, used when `participants` is empty.
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default)]
    pub last_message: Option<Value>,
    #[serde(default)]
    pub unread_count: u32,
}

impl RawChat {
    pub fn from_value(value: &Value) -> Result<Self, ViewError> {
        let raw: RawChat = serde_json::from_value(value.clone())
            .map_err(|e| ViewError::MalformedRecord(e.to_string()))?;
        if raw.id.trim().is_empty() {
            return Err(ViewError::MalformedRecord("empty chat id".into()));
        }
        Ok(raw)
    }
}

/// Optional field that degrades to `None` when its shape is unexpected, so a
/// single odd key does not reject the whole record.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

fn timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Text(DateTime<Utc>),
        Millis(i64),
    }

    match Repr::deserialize(deserializer)? {
        Repr::Text(t) => Ok(t),
        Repr::Millis(ms) => Utc
            .timestamp_millis_opt(ms)
            .single()
            .ok_or_else(|| serde::de::Error::custom(format!("timestamp out of range: {ms}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_server_shapes() {
        let raw = RawMessage::from_value(&json!({
            "_id": "m1",
            "sender": { "_id": "u2", "username": "bob" },
            "createdAt": 1_700_000_000_000i64,
            "content": "hi",
            "reactions": [{ "user": "u1", "emoji": "👍" }],
            "attachments": [{ "url": "https://x/y.pdf", "mimetype": "application/pdf", "pages": 3 }]
        }))
        .unwrap();

        assert_eq!(raw.id, "m1");
        assert_eq!(raw.sender_id(), "u2");
        assert_eq!(raw.created_at.timestamp(), 1_700_000_000);
        assert_eq!(raw.reactions[0].user_id, "u1");
        assert_eq!(raw.attachments[0].mime_type.as_deref(), Some("application/pdf"));
        assert_eq!(raw.attachments[0].extra.get("pages"), Some(&json!(3)));
        assert!(!raw.is_encrypted());
    }

    #[test]
    fn encrypted_fields_land_in_envelope() {
        let raw = RawMessage::from_value(&json!({
            "id": "m2",
            "senderId": "u1",
            "createdAt": "2024-05-01T10:00:00Z",
            "ciphertext": "AAAA",
            "ciphertextNonce": "BBBB",
            "encryptedKeys": [{
                "recipientUserId": "u2",
                "encryptedKey": "",
                "nonce": "",
                "senderEphemeralPublicKey": ""
            }]
        }))
        .unwrap();

        assert!(raw.is_encrypted());
        assert_eq!(raw.envelope.encrypted_keys.len(), 1);
        assert_eq!(raw.envelope.encrypted_keys[0].recipient_user_id, "u2");
    }

    #[test]
    fn missing_id_or_timestamp_is_malformed() {
        assert!(RawMessage::from_value(&json!({ "createdAt": "2024-05-01T10:00:00Z" })).is_err());
        assert!(RawMessage::from_value(&json!({ "id": "m1" })).is_err());
        assert!(RawMessage::from_value(&json!({ "id": " ", "createdAt": 0 })).is_err());
        assert!(RawMessage::from_value(&json!("just a string")).is_err());
    }

    #[test]
    fn redundant_keys_do_not_reject_the_record() {
        let raw = RawMessage::from_value(&json!({
            "_id": "m3",
            "senderId": "u1",
            "sender": { "_id": "u1", "username": "alice" },
            "createdAt": "2024-05-01T10:00:00Z",
            "deleted": false,
            "isDeleted": true,
            "reply": "m1"
        }))
        .unwrap();

        assert_eq!(raw.sender_id(), "u1");
        assert!(raw.deleted_for_everyone());
        assert!(raw.envelope.reply.is_none());
    }

    #[test]
    fn odd_sender_shape_degrades_to_no_sender() {
        let raw = RawMessage::from_value(&json!({
            "id": "m4",
            "sender": { "username": "ghost" },
            "createdAt": 0,
            "deleted": null
        }))
        .unwrap();

        assert_eq!(raw.sender_id(), "");
        assert!(!raw.deleted_for_everyone());
    }
}
