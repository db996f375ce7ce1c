//! Display records handed to the rendering layer.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::record::{Attachment, Reaction};

/// Closed set of display variants. Every consumer matches exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayKind {
    Text,
    Image,
    Video,
    Audio,
    Document,
    Deleted,
    /// Nothing to render (absent, malformed, or locally cleared).
    None,
}

impl DisplayKind {
    /// Parse an explicit type tag. Unknown tags are `None` (the Rust
    /// `Option`), so classification falls through to field sniffing.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "text" => Some(DisplayKind::Text),
            "image" | "photo" => Some(DisplayKind::Image),
            "video" => Some(DisplayKind::Video),
            "audio" | "voice" => Some(DisplayKind::Audio),
            "document" | "file" => Some(DisplayKind::Document),
            _ => None,
        }
    }
}

/// Coarse attachment class derived from MIME type, else file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Image,
    Video,
    Audio,
    Document,
}

const IMAGE_EXT: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "heic", "bmp", "svg"];
const VIDEO_EXT: &[&str] = &["mp4", "mov", "webm", "mkv", "avi", "m4v"];
const AUDIO_EXT: &[&str] = &["mp3", "m4a", "aac", "ogg", "oga", "opus", "wav", "flac"];

impl AttachmentKind {
    pub fn classify(attachment: &Attachment) -> Self {
        if let Some(kind) = attachment.mime_type.as_deref().and_then(Self::from_mime) {
            return kind;
        }
        attachment
            .file_name
            .as_deref()
            .or(attachment.url.as_deref())
            .and_then(Self::from_extension)
            .unwrap_or(AttachmentKind::Document)
    }

    fn from_mime(mime: &str) -> Option<Self> {
        let top = mime.split('/').next()?.trim().to_ascii_lowercase();
        match top.as_str() {
            "image" => Some(AttachmentKind::Image),
            "video" => Some(AttachmentKind::Video),
            "audio" => Some(AttachmentKind::Audio),
            "application" | "text" => Some(AttachmentKind::Document),
            _ => None,
        }
    }

    fn from_extension(name: &str) -> Option<Self> {
        let path = name.split(['?', '#']).next().unwrap_or(name);
        let (_, ext) = path.rsplit_once('.')?;
        let ext = ext.to_ascii_lowercase();
        if IMAGE_EXT.contains(&ext.as_str()) {
            Some(AttachmentKind::Image)
        } else if VIDEO_EXT.contains(&ext.as_str()) {
            Some(AttachmentKind::Video)
        } else if AUDIO_EXT.contains(&ext.as_str()) {
            Some(AttachmentKind::Audio)
        } else {
            None
        }
    }
}

impl From<AttachmentKind> for DisplayKind {
    fn from(kind: AttachmentKind) -> Self {
        match kind {
            AttachmentKind::Image => DisplayKind::Image,
            AttachmentKind::Video => DisplayKind::Video,
            AttachmentKind::Audio => DisplayKind::Audio,
            AttachmentKind::Document => DisplayKind::Document,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyPreview {
    pub text: String,
    pub decrypted: bool,
}

/// How the body of a message was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Decryption {
    /// Plaintext record; nothing to decrypt.
    #[default]
    Plaintext,
    Decrypted,
    /// Encrypted, but not for this device (or no local identity). Any
    /// server-side plaintext is shown instead.
    Unavailable,
    /// Wrap or body failed authentication. The body is replaced by a label
    /// and must not be trusted.
    Failed,
}

/// Render-ready message. Rebuilt from scratch on every normalization.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayMessage {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: DisplayKind,
    pub content: String,
    pub decryption: Decryption,
    pub created_at: Option<DateTime<Utc>>,
    pub sender_id: String,
    pub is_deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_for_me: Option<bool>,
    pub reactions: Vec<Reaction>,
    pub delivered_to: Vec<String>,
    pub read_by: Vec<String>,
    pub attachments: Vec<Attachment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<ReplyPreview>,
}

impl DisplayMessage {
    /// The empty `none` variant.
    pub fn none() -> Self {
        Self {
            id: String::new(),
            kind: DisplayKind::None,
            content: String::new(),
            decryption: Decryption::Plaintext,
            created_at: None,
            sender_id: String::new(),
            is_deleted: false,
            deleted_for_me: None,
            reactions: Vec::new(),
            delivered_to: Vec::new(),
            read_by: Vec::new(),
            attachments: Vec::new(),
            reply: None,
        }
    }

    pub fn is_renderable(&self) -> bool {
        !matches!(self.kind, DisplayKind::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attachment(mime: Option<&str>, name: Option<&str>) -> Attachment {
        Attachment {
            mime_type: mime.map(str::to_string),
            file_name: name.map(str::to_string),
            ..Attachment::default()
        }
    }

    #[test]
    fn mime_wins_over_extension() {
        let a = attachment(Some("video/mp4"), Some("clip.png"));
        assert_eq!(AttachmentKind::classify(&a), AttachmentKind::Video);
    }

    #[test]
    fn extension_fallback() {
        assert_eq!(
            AttachmentKind::classify(&attachment(None, Some("Voice.OGG"))),
            AttachmentKind::Audio
        );
        assert_eq!(
            AttachmentKind::classify(&attachment(Some("weird"), Some("pic.jpeg"))),
            AttachmentKind::Image
        );
        assert_eq!(
            AttachmentKind::classify(&attachment(None, Some("report.pdf"))),
            AttachmentKind::Document
        );
        assert_eq!(AttachmentKind::classify(&attachment(None, None)), AttachmentKind::Document);
    }

    #[test]
    fn extension_from_url_ignores_query() {
        let a = Attachment {
            url: Some("https://cdn.example/a/b/movie.webm?sig=abc.png".into()),
            ..Attachment::default()
        };
        assert_eq!(AttachmentKind::classify(&a), AttachmentKind::Video);
    }

    #[test]
    fn tags_are_case_insensitive() {
        assert_eq!(DisplayKind::from_tag(" Image "), Some(DisplayKind::Image));
        assert_eq!(DisplayKind::from_tag("file"), Some(DisplayKind::Document));
        assert_eq!(DisplayKind::from_tag("sticker"), None);
    }

    #[test]
    fn kind_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&DisplayKind::None).unwrap(), "\"none\"");
        assert_eq!(serde_json::to_string(&DisplayKind::Deleted).unwrap(), "\"deleted\"");
    }
}
