//! Key derivation functions
//!
//! `wrap_key_from_shared`: HKDF-SHA256 over an X25519 shared secret, used to
//!   derive the one-shot key that encrypts a message key for one device.

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::CryptoError;

const WRAP_SALT: &[u8] = b"vl-key-wrap-v1";

/// Expand `ikm` + `info` into `output.len()` bytes of key material.
///
/// `salt` may be `None` (HKDF will use a zeroed salt).
pub fn hkdf_expand(
    ikm: &[u8],
    salt: Option<&[u8]>,
    info: &[u8],
    output: &mut [u8],
) -> Result<(), CryptoError> {
    let hk = Hkdf::<Sha256>::new(salt, ikm);
    hk.expand(info, output)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))
}

/// Derive the 32-byte wrapping key for one (ephemeral, recipient) pair.
///
/// info = ephemeral_pub || recipient_pub, so a wrap cannot be replayed
/// against a different ephemeral key or recipient.
pub fn wrap_key_from_shared(
    shared: &[u8; 32],
    ephemeral_pub: &[u8; 32],
    recipient_pub: &[u8; 32],
) -> Result<Zeroizing<[u8; 32]>, CryptoError> {
    let mut info = [0u8; 64];
    info[..32].copy_from_slice(ephemeral_pub);
    info[32..].copy_from_slice(recipient_pub);

    let mut key = Zeroizing::new([0u8; 32]);
    hkdf_expand(shared, Some(WRAP_SALT), &info, key.as_mut())?;
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_key_depends_on_both_public_keys() {
        let shared = [1u8; 32];
        let a = wrap_key_from_shared(&shared, &[2u8; 32], &[3u8; 32]).unwrap();
        let b = wrap_key_from_shared(&shared, &[2u8; 32], &[4u8; 32]).unwrap();
        let c = wrap_key_from_shared(&shared, &[5u8; 32], &[3u8; 32]).unwrap();
        assert_ne!(*a, *b);
        assert_ne!(*a, *c);
        assert_eq!(*a, *wrap_key_from_shared(&shared, &[2u8; 32], &[3u8; 32]).unwrap());
    }

    #[test]
    fn hkdf_rejects_oversized_output() {
        let mut out = vec![0u8; 255 * 32 + 1];
        assert!(matches!(
            hkdf_expand(b"ikm", None, b"info", &mut out),
            Err(CryptoError::KeyDerivation(_))
        ));
    }
}
