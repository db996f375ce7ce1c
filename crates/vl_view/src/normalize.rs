//! Message normalization pipeline.
//!
//! Order of precedence:
//!   1. absent / malformed record           → `none`
//!   2. created at or before clear watermark → `none` (nothing decrypted)
//!   3. deleted for everyone / for me        → `deleted`, attachments dropped
//!   4. decrypt: not-for-this-device degrades to the plaintext fallback,
//!      an authentication failure to the `undecryptable` label
//!   5. classify: type tag → media URL fields → attachments → text
//!
//! Suppressed messages are filtered before decryption so their plaintext
//! never exists in the display path.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, warn};
use vl_proto::{open_envelope_with, LocalIdentity};

use crate::{
    config::ViewSettings,
    display::{AttachmentKind, Decryption, DisplayKind, DisplayMessage, ReplyPreview},
    record::RawMessage,
};

/// Local state the pipeline reads but never mutates.
#[derive(Debug, Clone, Copy)]
pub struct LocalView<'a> {
    pub user_id: &'a str,
    /// Local device identity from key custody; `None` disables decryption.
    pub identity: Option<&'a LocalIdentity>,
    /// Per-chat clear watermark.
    pub clear_watermark: Option<DateTime<Utc>>,
}

impl<'a> LocalView<'a> {
    pub fn new(user_id: &'a str) -> Self {
        Self {
            user_id,
            identity: None,
            clear_watermark: None,
        }
    }

    pub fn with_identity(mut self, identity: &'a LocalIdentity) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn with_clear_watermark(mut self, watermark: Option<DateTime<Utc>>) -> Self {
        self.clear_watermark = watermark;
        self
    }

    fn is_cleared(&self, created_at: DateTime<Utc>) -> bool {
        self.clear_watermark.map_or(false, |w| created_at <= w)
    }
}

/// Normalize a raw JSON record. Never fails: anything unusable is `none`.
pub fn normalize_message(
    raw: Option<&Value>,
    view: &LocalView<'_>,
    settings: &ViewSettings,
) -> DisplayMessage {
    let Some(value) = raw.filter(|v| !v.is_null()) else {
        return DisplayMessage::none();
    };
    match RawMessage::from_value(value) {
        Ok(record) => normalize_record(&record, view, settings),
        Err(e) => {
            debug!(error = %e, "dropping malformed message record");
            DisplayMessage::none()
        }
    }
}

/// Normalize a batch, preserving order.
pub fn normalize_messages(
    raw: &[Value],
    view: &LocalView<'_>,
    settings: &ViewSettings,
) -> Vec<DisplayMessage> {
    raw.iter()
        .map(|v| normalize_message(Some(v), view, settings))
        .collect()
}

pub fn normalize_record(
    raw: &RawMessage,
    view: &LocalView<'_>,
    settings: &ViewSettings,
) -> DisplayMessage {
    if view.is_cleared(raw.created_at) {
        return DisplayMessage {
            id: raw.id.clone(),
            created_at: Some(raw.created_at),
            sender_id: raw.sender_id().to_string(),
            ..DisplayMessage::none()
        };
    }

    let base = DisplayMessage {
        id: raw.id.clone(),
        created_at: Some(raw.created_at),
        sender_id: raw.sender_id().to_string(),
        reactions: raw.reactions.clone(),
        delivered_to: raw.delivered_to.clone(),
        read_by: raw.read_by.clone(),
        ..DisplayMessage::none()
    };

    let deleted_for_me = raw.deleted_for.iter().any(|u| u == view.user_id);
    if raw.deleted_for_everyone() || deleted_for_me {
        let labels = &settings.labels;
        return DisplayMessage {
            kind: DisplayKind::Deleted,
            content: if deleted_for_me {
                labels.deleted_by_me.clone()
            } else {
                labels.deleted.clone()
            },
            is_deleted: true,
            deleted_for_me: Some(deleted_for_me),
            ..base
        };
    }

    let (content, reply, decryption) = decrypt_content(raw, view, settings);
    let kind = classify(raw);
    let content = if decryption == Decryption::Failed {
        settings.labels.undecryptable.clone()
    } else if content.trim().is_empty() {
        settings.placeholder(kind).to_string()
    } else {
        content
    };

    DisplayMessage {
        kind,
        content,
        decryption,
        attachments: raw.attachments.clone(),
        reply,
        ..base
    }
}

/// Decrypted body and reply preview. Server plaintext is used only when the
/// record is unencrypted or not addressed to this device; an authentication
/// failure yields an empty body marked `Failed`.
fn decrypt_content(
    raw: &RawMessage,
    view: &LocalView<'_>,
    settings: &ViewSettings,
) -> (String, Option<ReplyPreview>, Decryption) {
    let fallback = || raw.content.clone().unwrap_or_default();

    if !raw.is_encrypted() {
        return (fallback(), None, Decryption::Plaintext);
    }
    let Some(identity) = view.identity else {
        debug!(message_id = %raw.id, "no local device identity; showing plaintext fallback");
        return (fallback(), None, Decryption::Unavailable);
    };

    match open_envelope_with(&raw.envelope, identity, &settings.reply_options()) {
        Ok(opened) => {
            let reply = opened.reply.map(|r| ReplyPreview {
                text: r.text,
                decrypted: r.decrypted,
            });
            (opened.body.as_str().to_owned(), reply, Decryption::Decrypted)
        }
        Err(e) if e.is_expected() => {
            debug!(message_id = %raw.id, "message not addressed to this device");
            (fallback(), None, Decryption::Unavailable)
        }
        Err(e) => {
            warn!(message_id = %raw.id, error = %e, "message failed to decrypt");
            (String::new(), None, Decryption::Failed)
        }
    }
}

/// Ordered decision table for the content type.
fn classify(raw: &RawMessage) -> DisplayKind {
    if let Some(kind) = raw.type_tag.as_deref().and_then(DisplayKind::from_tag) {
        return kind;
    }
    if let Some((kind, _)) = raw
        .media_urls()
        .into_iter()
        .find(|(_, url)| url.map_or(false, |u| !u.trim().is_empty()))
    {
        return kind;
    }
    raw.attachments
        .first()
        .map(|a| DisplayKind::from(AttachmentKind::classify(a)))
        .unwrap_or(DisplayKind::Text)
}
