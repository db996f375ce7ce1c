//! vl_proto — Wire envelope and multi-recipient fan-out for Vellum
//!
//! An outgoing message is sealed ONCE under a fresh symmetric key; that key is
//! then wrapped separately for every recipient device. The transport only
//! ever sees base64 text fields.
//!
//! # Modules
//! - `device`   — recipient device records + the local device identity
//! - `envelope` — on-wire `Envelope` / `KeyWrap` (camelCase JSON)
//! - `encrypt`  — all-or-nothing fan-out encryption
//! - `decrypt`  — wrap selection + body decryption for the local device
//! - `reply`    — recursive, failure-isolated reply-chain resolution
//! - `error`    — encryption / decryption error taxonomy

pub mod decrypt;
pub mod device;
pub mod encrypt;
pub mod envelope;
pub mod error;
pub mod reply;

pub use decrypt::decrypt_incoming;
pub use device::{Device, LocalIdentity};
pub use encrypt::{encrypt_outgoing, encrypt_outgoing_with_reply};
pub use envelope::{Envelope, KeyWrap};
pub use error::{DecryptError, EncryptError};
pub use reply::{
    open_envelope, open_envelope_with, OpenedEnvelope, ReplyOptions, ResolvedReply, MAX_REPLY_DEPTH,
};
