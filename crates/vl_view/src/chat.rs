//! Chat-level normalization: participants, the "other party", last message.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    config::ViewSettings,
    display::DisplayMessage,
    error::ViewError,
    normalize::{normalize_message, LocalView},
    record::{RawChat, RawParticipant},
};

/// Profile data from a (possibly stale) lookup cache.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Profile {
    pub username: Option<String>,
    pub avatar: Option<String>,
}

/// Lookup of user profiles by id.
pub trait ProfileDirectory {
    fn profile(&self, user_id: &str) -> Option<Profile>;
}

impl ProfileDirectory for HashMap<String, Profile> {
    fn profile(&self, user_id: &str) -> Option<Profile> {
        self.get(user_id).cloned()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayParticipant {
    pub id: String,
    pub username: Option<String>,
    pub avatar: Option<String>,
    pub is_self: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayChat {
    pub id: String,
    pub is_group: bool,
    /// Group name, or the other party's username for two-person chats.
    pub name: Option<String>,
    pub participants: Vec<DisplayParticipant>,
    pub other_party: Option<DisplayParticipant>,
    pub last_message: Option<DisplayMessage>,
    pub unread_count: u32,
}

pub fn normalize_chat(
    raw: &Value,
    view: &LocalView<'_>,
    profiles: Option<&dyn ProfileDirectory>,
    settings: &ViewSettings,
) -> Result<DisplayChat, ViewError> {
    let chat = RawChat::from_value(raw)?;

    let participants = compose_participants(&chat, view.user_id, profiles);
    let other_party = if chat.is_group {
        None
    } else {
        other_party(&participants, view.user_id)
    };

    let name = non_empty(chat.name.clone())
        .or_else(|| other_party.as_ref().and_then(|p| p.username.clone()));

    let last_message = chat
        .last_message
        .as_ref()
        .map(|m| normalize_message(Some(m), view, settings))
        .filter(DisplayMessage::is_renderable);

    Ok(DisplayChat {
        id: chat.id,
        is_group: chat.is_group,
        name,
        participants,
        other_party,
        last_message,
        unread_count: chat.unread_count,
    })
}

/// Authoritative `participants` first; bare `members` ids only when it is
/// empty. Profile lookups fill gaps but never replace present values.
fn compose_participants(
    chat: &RawChat,
    local_user_id: &str,
    profiles: Option<&dyn ProfileDirectory>,
) -> Vec<DisplayParticipant> {
    let source: Vec<RawParticipant> = if chat.participants.is_empty() {
        chat.members
            .iter()
            .map(|id| RawParticipant {
                id: id.clone(),
                ..RawParticipant::default()
            })
            .collect()
    } else {
        chat.participants.clone()
    };

    let mut seen = HashSet::new();
    source
        .into_iter()
        .filter(|p| !p.id.is_empty() && seen.insert(p.id.clone()))
        .map(|p| {
            let looked_up = profiles.and_then(|dir| dir.profile(&p.id)).unwrap_or_default();
            DisplayParticipant {
                is_self: p.id == local_user_id,
                username: non_empty(p.username).or_else(|| non_empty(looked_up.username)),
                avatar: non_empty(p.avatar).or_else(|| non_empty(looked_up.avatar)),
                id: p.id,
            }
        })
        .collect()
}

/// In a two-person chat, the participant who is not us.
fn other_party(
    participants: &[DisplayParticipant],
    local_user_id: &str,
) -> Option<DisplayParticipant> {
    if participants.len() != 2 {
        return None;
    }
    participants.iter().find(|p| p.id != local_user_id).cloned()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::DisplayKind;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn directory() -> HashMap<String, Profile> {
        HashMap::from([
            (
                "u2".to_string(),
                Profile {
                    username: Some("stale-bob".into()),
                    avatar: Some("https://cdn/bob.png".into()),
                },
            ),
            (
                "u3".to_string(),
                Profile {
                    username: Some("carol".into()),
                    avatar: None,
                },
            ),
        ])
    }

    #[test]
    fn other_party_is_the_non_local_participant() {
        let view = LocalView::new("u1");
        let raw = json!({
            "_id": "c1",
            "participants": [
                { "_id": "u1", "username": "me" },
                { "_id": "u2", "username": "bob" }
            ]
        });
        let chat = normalize_chat(&raw, &view, None, &ViewSettings::default()).unwrap();
        let other = chat.other_party.unwrap();
        assert_eq!(other.id, "u2");
        assert!(!other.is_self);
        assert_eq!(chat.name.as_deref(), Some("bob"));
        assert!(chat.participants[0].is_self);
    }

    #[test]
    fn lookup_enriches_without_overwriting() {
        let view = LocalView::new("u1");
        let dir = directory();
        let raw = json!({
            "id": "c1",
            "participants": [
                { "id": "u1" },
                { "id": "u2", "username": "bob", "avatar": "" }
            ]
        });
        let chat = normalize_chat(&raw, &view, Some(&dir), &ViewSettings::default()).unwrap();
        let bob = &chat.participants[1];
        assert_eq!(bob.username.as_deref(), Some("bob"));
        assert_eq!(bob.avatar.as_deref(), Some("https://cdn/bob.png"));
    }

    #[test]
    fn members_fallback_and_group_has_no_other_party() {
        let view = LocalView::new("u1");
        let dir = directory();
        let raw = json!({
            "id": "g1", "isGroupChat": true, "name": "crew",
            "members": ["u1", "u2", "u3", "u3"]
        });
        let chat = normalize_chat(&raw, &view, Some(&dir), &ViewSettings::default()).unwrap();
        assert_eq!(chat.participants.len(), 3);
        assert_eq!(chat.participants[2].username.as_deref(), Some("carol"));
        assert!(chat.other_party.is_none());
        assert_eq!(chat.name.as_deref(), Some("crew"));
    }

    #[test]
    fn last_message_respects_clear_watermark() {
        let watermark = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let view = LocalView::new("u1").with_clear_watermark(Some(watermark));
        let raw = json!({
            "id": "c1",
            "members": ["u1", "u2"],
            "lastMessage": { "id": "m1", "createdAt": "2024-05-31T23:59:59Z", "content": "gone" }
        });
        let chat = normalize_chat(&raw, &view, None, &ViewSettings::default()).unwrap();
        assert!(chat.last_message.is_none());

        let fresh = json!({
            "id": "c1",
            "members": ["u1", "u2"],
            "lastMessage": { "id": "m2", "createdAt": "2024-06-01T00:00:01Z", "type": "image" }
        });
        let chat = normalize_chat(&fresh, &view, None, &ViewSettings::default()).unwrap();
        let last = chat.last_message.unwrap();
        assert_eq!(last.kind, DisplayKind::Image);
        assert_eq!(last.content, "Photo");
    }

    #[test]
    fn malformed_chat_is_an_error() {
        let view = LocalView::new("u1");
        assert!(matches!(
            normalize_chat(&json!({ "name": "no id" }), &view, None, &ViewSettings::default()),
            Err(ViewError::MalformedRecord(_))
        ));
    }
}
