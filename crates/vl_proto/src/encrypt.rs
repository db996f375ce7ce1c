//! Outgoing fan-out encryption.
//!
//! One symmetric key per message, one seal of the body, one wrap per device.
//! All device keys are parsed before any secret is generated, and the first
//! failing wrap aborts the call: either every intended device can decrypt or
//! the send fails visibly.

use rand_core::{CryptoRng, RngCore};
use tracing::debug;
use vl_crypto::{aead, wrap, CryptoError, DevicePublicKey, SymmetricKey};

use crate::{
    device::Device,
    envelope::{Envelope, KeyWrap},
    error::EncryptError,
};

/// Encrypt `plaintext` for every device in `devices`.
///
/// Device order is irrelevant and duplicates are not collapsed; each entry
/// gets its own wrap with its own ephemeral keypair.
pub fn encrypt_outgoing<R: RngCore + CryptoRng>(
    plaintext: &str,
    devices: &[Device],
    rng: &mut R,
) -> Result<Envelope, EncryptError> {
    if devices.is_empty() {
        return Err(EncryptError::NoRecipients);
    }

    let recipients: Vec<(&Device, DevicePublicKey)> = devices
        .iter()
        .map(|d| d.parsed_public_key().map(|pk| (d, pk)))
        .collect::<Result<_, _>>()?;

    // Dropped (and zeroized) at the end of this scope, after every wrap exists.
    let message_key = SymmetricKey::generate(rng);
    let sealed = aead::seal(plaintext, &message_key, rng)?;

    let encrypted_keys = recipients
        .iter()
        .map(|(device, public_key)| {
            let wrapped = wrap::wrap_key(&message_key, public_key, rng).map_err(|e| match e {
                CryptoError::LowOrderPoint => EncryptError::InvalidPublicKey {
                    device_id: device.device_id.clone(),
                    reason: e.to_string(),
                },
                other => EncryptError::Crypto(other),
            })?;
            Ok(KeyWrap::new(&device.user_id, &device.device_id, &wrapped))
        })
        .collect::<Result<Vec<_>, EncryptError>>()?;

    debug!(recipients = encrypted_keys.len(), "sealed outgoing envelope");

    Ok(Envelope::from_parts(&sealed, encrypted_keys))
}

/// Encrypt a message together with the text it quotes. The quote is sealed
/// under its own key for the same device list.
pub fn encrypt_outgoing_with_reply<R: RngCore + CryptoRng>(
    plaintext: &str,
    quoted: Option<&str>,
    devices: &[Device],
    rng: &mut R,
) -> Result<Envelope, EncryptError> {
    let envelope = encrypt_outgoing(plaintext, devices, rng)?;
    match quoted {
        Some(text) => Ok(envelope.with_reply(encrypt_outgoing(text, devices, rng)?)),
        None => Ok(envelope),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;
    use rand_chacha::{rand_core::SeedableRng, ChaCha20Rng};
    use std::collections::HashSet;
    use vl_crypto::{codec, DeviceSecret};

    fn device(user: &str, id: &str) -> Device {
        Device::new(user, id, &DeviceSecret::generate(&mut OsRng).public_key())
    }

    #[test]
    fn one_wrap_per_device_with_distinct_ephemerals() {
        let devices = vec![device("u1", "a"), device("u2", "b"), device("u2", "c")];
        let env = encrypt_outgoing("hello", &devices, &mut OsRng).unwrap();

        assert_eq!(env.encrypted_keys.len(), 3);
        let ephemerals: HashSet<_> = env
            .encrypted_keys
            .iter()
            .map(|w| w.sender_ephemeral_public_key.clone())
            .collect();
        assert_eq!(ephemerals.len(), 3);
        assert_eq!(codec::decode(&env.ciphertext_nonce).unwrap().len(), 24);
    }

    #[test]
    fn duplicate_devices_are_not_collapsed() {
        let d = device("u1", "a");
        let env = encrypt_outgoing("dup", &[d.clone(), d], &mut OsRng).unwrap();
        assert_eq!(env.encrypted_keys.len(), 2);
    }

    #[test]
    fn any_bad_device_aborts_the_whole_envelope() {
        let mut broken = device("u2", "b");
        broken.public_key = None;
        let err = encrypt_outgoing("hi", &[device("u1", "a"), broken], &mut OsRng).unwrap_err();
        assert_eq!(
            err,
            EncryptError::MissingPublicKey {
                user_id: "u2".into(),
                device_id: "b".into()
            }
        );

        let mut garbled = device("u3", "c");
        garbled.public_key = Some("not-a-key".into());
        assert!(matches!(
            encrypt_outgoing("hi", &[garbled], &mut OsRng),
            Err(EncryptError::InvalidPublicKey { .. })
        ));
    }

    #[test]
    fn low_order_device_key_is_invalid() {
        let low = Device {
            user_id: "u1".into(),
            device_id: "zero".into(),
            public_key: Some(codec::encode(&[0u8; 32])),
        };
        match encrypt_outgoing("hi", &[low], &mut OsRng) {
            Err(EncryptError::InvalidPublicKey { device_id, .. }) => assert_eq!(device_id, "zero"),
            other => panic!("expected InvalidPublicKey, got {other:?}"),
        }
    }

    #[test]
    fn empty_device_list_is_rejected() {
        assert_eq!(
            encrypt_outgoing("nobody", &[], &mut OsRng).unwrap_err(),
            EncryptError::NoRecipients
        );
    }

    #[test]
    fn seeded_rng_gives_golden_envelope() {
        let recipient = DeviceSecret::from_bytes([11u8; 32]);
        let devices = vec![Device::new("u1", "d1", &recipient.public_key())];

        let seeded = || ChaCha20Rng::from_seed([1u8; 32]);
        let a = encrypt_outgoing("golden", &devices, &mut seeded()).unwrap();
        let b = encrypt_outgoing("golden", &devices, &mut seeded()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn quoted_text_rides_along_as_reply() {
        let devices = vec![device("u1", "a")];
        let env =
            encrypt_outgoing_with_reply("answer", Some("question"), &devices, &mut OsRng).unwrap();
        assert_eq!(env.reply_depth(), 1);
        let reply = env.reply.as_deref().unwrap();
        assert_eq!(reply.encrypted_keys.len(), 1);
        assert_ne!(reply.ciphertext, env.ciphertext);
    }
}
