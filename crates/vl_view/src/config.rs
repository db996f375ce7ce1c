//! View settings: labels shown in place of content, reply-preview depth.

use serde::{Deserialize, Serialize};
use vl_proto::{ReplyOptions, MAX_REPLY_DEPTH};

use crate::{display::DisplayKind, error::ViewError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlaceholderLabels {
    pub photo: String,
    pub video: String,
    pub audio: String,
    pub document: String,
    pub deleted: String,
    pub deleted_by_me: String,
    /// Shown when an encrypted message fails authentication.
    pub undecryptable: String,
}

impl Default for PlaceholderLabels {
    fn default() -> Self {
        Self {
            photo: "Photo".into(),
            video: "Video".into(),
            audio: "Audio".into(),
            document: "Document".into(),
            deleted: "Message deleted".into(),
            deleted_by_me: "You deleted this message".into(),
            undecryptable: "This message could not be decrypted".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewSettings {
    pub labels: PlaceholderLabels,
    /// Levels of quoting to resolve for previews (clamped to `MAX_REPLY_DEPTH`).
    pub reply_depth: usize,
    /// Preview shown for a quote that cannot be decrypted.
    pub reply_fallback: String,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            labels: PlaceholderLabels::default(),
            reply_depth: 1,
            reply_fallback: "Message".into(),
        }
    }
}

impl ViewSettings {
    /// Parse settings JSON; absent keys keep their defaults.
    pub fn from_json(s: &str) -> Result<Self, ViewError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Label substituted for empty content of the given kind.
    pub fn placeholder(&self, kind: DisplayKind) -> &str {
        match kind {
            DisplayKind::Image => &self.labels.photo,
            DisplayKind::Video => &self.labels.video,
            DisplayKind::Audio => &self.labels.audio,
            DisplayKind::Document => &self.labels.document,
            DisplayKind::Deleted => &self.labels.deleted,
            DisplayKind::Text | DisplayKind::None => "",
        }
    }

    pub fn reply_options(&self) -> ReplyOptions {
        ReplyOptions {
            max_depth: self.reply_depth.min(MAX_REPLY_DEPTH),
            fallback: self.reply_fallback.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let settings =
            ViewSettings::from_json(r#"{"labels":{"photo":"Image"},"replyDepth":9}"#).unwrap();
        assert_eq!(settings.labels.photo, "Image");
        assert_eq!(settings.labels.video, "Video");
        assert_eq!(settings.reply_fallback, "Message");
        assert_eq!(settings.reply_options().max_depth, MAX_REPLY_DEPTH);
    }

    #[test]
    fn bad_json_is_a_settings_error() {
        assert!(matches!(ViewSettings::from_json("{"), Err(ViewError::Settings(_))));
    }

    #[test]
    fn text_has_no_placeholder() {
        let settings = ViewSettings::default();
        assert_eq!(settings.placeholder(DisplayKind::Text), "");
        assert_eq!(settings.placeholder(DisplayKind::Image), "Photo");
    }
}
