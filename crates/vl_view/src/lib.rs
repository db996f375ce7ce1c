//! vl_view — turns raw message / chat records into display-ready values
//!
//! Everything here is a pure function of its inputs: the raw record, the
//! local user id, the local device identity (if key custody supplied one),
//! the per-chat clear watermark, and `ViewSettings`. Nothing is cached and
//! nothing global is read, so the same inputs always give the same output.
//!
//! # Modules
//! - `record`    — raw transport records (lenient serde)
//! - `display`   — `DisplayMessage` / `DisplayKind` and attachment classes
//! - `normalize` — the message pipeline (watermark → deletion → decrypt → classify)
//! - `chat`      — participant composition and the "other party"
//! - `config`    — placeholder labels and reply-preview settings
//! - `logging`   — tracing-subscriber initialisation for host applications
//! - `error`     — `ViewError`

pub mod chat;
pub mod config;
pub mod display;
pub mod error;
pub mod logging;
pub mod normalize;
pub mod record;

pub use chat::{normalize_chat, DisplayChat, DisplayParticipant, Profile, ProfileDirectory};
pub use config::ViewSettings;
pub use display::{AttachmentKind, Decryption, DisplayKind, DisplayMessage, ReplyPreview};
pub use error::ViewError;
pub use normalize::{normalize_message, normalize_messages, normalize_record, LocalView};
pub use record::{Attachment, RawChat, RawMessage, Reaction};
