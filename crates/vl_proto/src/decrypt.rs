//! Incoming envelope decryption for the local device.
//!
//! Wrap selection:
//!   1. wraps naming this exact device (user + device id),
//!   2. then wraps naming only this user (legacy, user-addressed records).
//! Wraps naming a different device of the same user are never tried.
//!
//! Failure classes stay distinct (see `DecryptError`).

use tracing::{debug, warn};
use vl_crypto::{aead, wrap, SymmetricKey};
use zeroize::Zeroizing;

use crate::{
    device::LocalIdentity,
    envelope::{Envelope, KeyWrap},
    error::DecryptError,
};

/// Recover the plaintext of `envelope` as seen by `local`.
///
/// Only the envelope's own body is decrypted; nested replies are handled by
/// `reply::open_envelope`.
pub fn decrypt_incoming(
    envelope: &Envelope,
    local: &LocalIdentity,
) -> Result<Zeroizing<String>, DecryptError> {
    let message_key = unwrap_for_local(&envelope.encrypted_keys, local)?;

    let sealed = envelope.cipher_box().ok_or_else(|| {
        warn!("envelope body fields are not valid base64");
        DecryptError::BodyDecryptFailed
    })?;

    aead::open(&sealed, &message_key).map_err(|_| {
        warn!(device_id = %local.device_id, "envelope body failed authentication");
        DecryptError::BodyDecryptFailed
    })
}

fn unwrap_for_local(
    wraps: &[KeyWrap],
    local: &LocalIdentity,
) -> Result<SymmetricKey, DecryptError> {
    let exact = wraps
        .iter()
        .filter(|w| w.recipient_device_id.as_deref() == Some(local.device_id.as_str()));
    let user_only = wraps.iter().filter(|w| w.recipient_device_id.is_none());
    let candidates: Vec<&KeyWrap> = exact
        .chain(user_only)
        .filter(|w| w.addressed_to(&local.user_id, &local.device_id))
        .collect();

    if candidates.is_empty() {
        debug!(
            wraps = wraps.len(),
            device_id = %local.device_id,
            "no key wrap addressed to this device"
        );
        return Err(DecryptError::NoMatchingKey);
    }

    for candidate in &candidates {
        let Some(wrapped) = candidate.decode() else {
            continue;
        };
        if let Ok(key) = wrap::unwrap_key(&wrapped, local.secret()) {
            return Ok(key);
        }
    }

    warn!(
        candidates = candidates.len(),
        device_id = %local.device_id,
        "every candidate key wrap failed to open"
    );
    Err(DecryptError::KeyUnwrapFailed)
}
