//! Reply-chain resolution.
//!
//! An envelope may quote another envelope (`reply`), which may quote another,
//! and so on. Resolution rules:
//!   - the outer body must decrypt, otherwise the whole call fails;
//!   - a reply that fails to decrypt becomes a fallback preview, it never
//!     fails the outer message;
//!   - nesting below `max_depth` is truncated (never recursed into).

use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::{
    decrypt::decrypt_incoming, device::LocalIdentity, envelope::Envelope, error::DecryptError,
};

/// Hard ceiling on reply nesting, regardless of caller options.
pub const MAX_REPLY_DEPTH: usize = 5;

/// Preview text used when a quoted message cannot be decrypted.
pub const DEFAULT_REPLY_FALLBACK: &str = "Message";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyOptions {
    /// Levels of quoting to resolve (clamped to `MAX_REPLY_DEPTH`).
    pub max_depth: usize,
    pub fallback: String,
}

impl Default for ReplyOptions {
    fn default() -> Self {
        Self {
            max_depth: MAX_REPLY_DEPTH,
            fallback: DEFAULT_REPLY_FALLBACK.to_string(),
        }
    }
}

/// A quoted message as it should be previewed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedReply {
    /// Decrypted quote, or the fallback label.
    pub text: String,
    pub decrypted: bool,
    /// The message this quote itself quoted, if within depth.
    pub quoted: Option<Box<ResolvedReply>>,
}

/// Outer body plus resolved reply chain.
#[derive(Debug)]
pub struct OpenedEnvelope {
    pub body: Zeroizing<String>,
    pub reply: Option<ResolvedReply>,
}

pub fn open_envelope(
    envelope: &Envelope,
    local: &LocalIdentity,
) -> Result<OpenedEnvelope, DecryptError> {
    open_envelope_with(envelope, local, &ReplyOptions::default())
}

pub fn open_envelope_with(
    envelope: &Envelope,
    local: &LocalIdentity,
    options: &ReplyOptions,
) -> Result<OpenedEnvelope, DecryptError> {
    let body = decrypt_incoming(envelope, local)?;
    let max_depth = options.max_depth.min(MAX_REPLY_DEPTH);
    let reply = envelope
        .reply
        .as_deref()
        .and_then(|r| resolve_reply(r, local, 1, max_depth, &options.fallback));
    Ok(OpenedEnvelope { body, reply })
}

fn resolve_reply(
    envelope: &Envelope,
    local: &LocalIdentity,
    depth: usize,
    max_depth: usize,
    fallback: &str,
) -> Option<ResolvedReply> {
    if depth > max_depth {
        debug!(depth, max_depth, "reply chain truncated");
        return None;
    }

    let (text, decrypted) = match decrypt_incoming(envelope, local) {
        Ok(text) => (text.as_str().to_owned(), true),
        Err(e) if e.is_expected() => {
            debug!(depth, "quoted message not addressed to this device");
            (fallback.to_string(), false)
        }
        Err(e) => {
            warn!(depth, error = %e, "quoted message failed to decrypt");
            (fallback.to_string(), false)
        }
    };

    let quoted = envelope
        .reply
        .as_deref()
        .and_then(|r| resolve_reply(r, local, depth + 1, max_depth, fallback))
        .map(Box::new);

    Some(ResolvedReply { text, decrypted, quoted })
}
