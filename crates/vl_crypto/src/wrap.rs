//! Per-device key wrapping.
//!
//! For every recipient device the sender:
//!   1. generates a FRESH ephemeral X25519 keypair (never reused across
//!      devices or messages),
//!   2. computes DH(ephemeral_secret, device_public),
//!   3. derives a wrapping key via HKDF (see `kdf::wrap_key_from_shared`),
//!   4. seals the 32-byte message key under a fresh 24-byte nonce.
//!
//! The ephemeral secret is consumed by the DH call and dropped (zeroized)
//! before this function returns; only its public half travels with the wrap.
//!
//! The recipient recomputes DH(device_secret, ephemeral_public) and opens the
//! wrap. Any tampering or key mismatch fails closed.

use rand_core::{CryptoRng, RngCore};
use x25519_dalek::{EphemeralSecret, PublicKey as X25519Public};

use crate::{
    aead::{self, SymmetricKey, KEY_LEN, NONCE_LEN},
    error::CryptoError,
    kdf,
    keys::{DevicePublicKey, DeviceSecret},
};

const WRAP_AAD: &[u8] = b"vl-key-wrap-v1";

/// One message key sealed for one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedKey {
    /// Message key ciphertext + 16-byte tag.
    pub encrypted_key: Vec<u8>,
    pub nonce: [u8; NONCE_LEN],
    pub ephemeral_public: DevicePublicKey,
}

/// Wrap `key` for the device owning `recipient`.
pub fn wrap_key<R: RngCore + CryptoRng>(
    key: &SymmetricKey,
    recipient: &DevicePublicKey,
    rng: &mut R,
) -> Result<WrappedKey, CryptoError> {
    let ephemeral = EphemeralSecret::random_from_rng(&mut *rng);
    let ephemeral_public = DevicePublicKey::from(X25519Public::from(&ephemeral));

    let shared = ephemeral.diffie_hellman(&recipient.to_dalek());
    if !shared.was_contributory() {
        return Err(CryptoError::LowOrderPoint);
    }

    let kek = kdf::wrap_key_from_shared(
        shared.as_bytes(),
        ephemeral_public.as_bytes(),
        recipient.as_bytes(),
    )?;
    let nonce = aead::random_nonce(rng);
    let encrypted_key = aead::encrypt_raw(&kek, &nonce, key.as_bytes(), WRAP_AAD)?;

    Ok(WrappedKey {
        encrypted_key,
        nonce,
        ephemeral_public,
    })
}

/// Recover the message key from a wrap addressed to `secret`'s device.
pub fn unwrap_key(
    wrapped: &WrappedKey,
    secret: &DeviceSecret,
) -> Result<SymmetricKey, CryptoError> {
    let shared = secret
        .inner()
        .diffie_hellman(&wrapped.ephemeral_public.to_dalek());
    if !shared.was_contributory() {
        return Err(CryptoError::LowOrderPoint);
    }

    let recipient_pub = secret.public_key();
    let kek = kdf::wrap_key_from_shared(
        shared.as_bytes(),
        wrapped.ephemeral_public.as_bytes(),
        recipient_pub.as_bytes(),
    )?;
    let plaintext = aead::decrypt_raw(&kek, &wrapped.nonce, &wrapped.encrypted_key, WRAP_AAD)?;

    let bytes: [u8; KEY_LEN] = plaintext
        .as_slice()
        .try_into()
        .map_err(|_| CryptoError::InvalidKey("unwrapped key has wrong length".into()))?;
    Ok(SymmetricKey::from_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn roundtrip_wrap_unwrap() {
        let device = DeviceSecret::generate(&mut OsRng);
        let key = SymmetricKey::generate(&mut OsRng);

        let wrapped = wrap_key(&key, &device.public_key(), &mut OsRng).unwrap();
        let recovered = unwrap_key(&wrapped, &device).unwrap();

        assert_eq!(key.as_bytes(), recovered.as_bytes());
    }

    #[test]
    fn wrong_device_fails() {
        let device = DeviceSecret::generate(&mut OsRng);
        let stranger = DeviceSecret::generate(&mut OsRng);
        let key = SymmetricKey::generate(&mut OsRng);

        let wrapped = wrap_key(&key, &device.public_key(), &mut OsRng).unwrap();
        assert_eq!(unwrap_key(&wrapped, &stranger).unwrap_err(), CryptoError::AeadDecrypt);
    }

    #[test]
    fn ephemeral_keys_are_never_reused() {
        let device = DeviceSecret::generate(&mut OsRng);
        let key = SymmetricKey::generate(&mut OsRng);

        let a = wrap_key(&key, &device.public_key(), &mut OsRng).unwrap();
        let b = wrap_key(&key, &device.public_key(), &mut OsRng).unwrap();
        assert_ne!(a.ephemeral_public, b.ephemeral_public);
        assert_ne!(a.nonce, b.nonce);
    }

    #[test]
    fn tampered_wrap_fails_closed() {
        let device = DeviceSecret::generate(&mut OsRng);
        let key = SymmetricKey::generate(&mut OsRng);
        let wrapped = wrap_key(&key, &device.public_key(), &mut OsRng).unwrap();

        let mut bad_key = wrapped.clone();
        bad_key.encrypted_key[0] ^= 0x01;
        assert!(unwrap_key(&bad_key, &device).is_err());

        let mut bad_nonce = wrapped.clone();
        bad_nonce.nonce[5] ^= 0x01;
        assert!(unwrap_key(&bad_nonce, &device).is_err());

        let mut bad_ephemeral = wrapped;
        bad_ephemeral.ephemeral_public.0[3] ^= 0x01;
        assert!(unwrap_key(&bad_ephemeral, &device).is_err());
    }

    #[test]
    fn low_order_recipient_key_is_rejected() {
        let key = SymmetricKey::generate(&mut OsRng);
        let identity_point = DevicePublicKey([0u8; 32]);
        assert_eq!(
            wrap_key(&key, &identity_point, &mut OsRng).unwrap_err(),
            CryptoError::LowOrderPoint
        );
    }
}
