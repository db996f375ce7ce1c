//! Device key management
//!
//! Each *device* owns one X25519 key-agreement keypair. The secret half lives
//! only in process memory (key custody hands it to us); the public half is
//! published as base64 text and consumed by senders when fanning out wraps.

use rand_core::{CryptoRng, RngCore};
use x25519_dalek::{PublicKey as X25519Public, StaticSecret};

use crate::{codec, error::CryptoError};

// ── Public key ───────────────────────────────────────────────────────────────

/// 32-byte X25519 public key, base64-encoded on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DevicePublicKey(pub [u8; 32]);

impl DevicePublicKey {
    pub fn to_transport(&self) -> String {
        codec::encode(&self.0)
    }

    /// Parse a transport-encoded key. Decode failures and wrong lengths are
    /// both `InvalidKey`.
    pub fn from_transport(s: &str) -> Result<Self, CryptoError> {
        let bytes = codec::decode(s)
            .ok_or_else(|| CryptoError::InvalidKey("public key is not valid base64".into()))?;
        let arr: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            CryptoError::InvalidKey(format!("public key must be 32 bytes, got {}", bytes.len()))
        })?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Short BLAKE3 fingerprint, safe to put in logs.
    pub fn fingerprint(&self) -> String {
        let hash = blake3::hash(&self.0);
        hex::encode(&hash.as_bytes()[..8])
    }

    pub(crate) fn to_dalek(self) -> X25519Public {
        X25519Public::from(self.0)
    }
}

impl From<X25519Public> for DevicePublicKey {
    fn from(pk: X25519Public) -> Self {
        Self(pk.to_bytes())
    }
}

// ── Secret key ───────────────────────────────────────────────────────────────

/// Long-lived device secret. `StaticSecret` zeroizes itself on drop.
pub struct DeviceSecret(StaticSecret);

impl DeviceSecret {
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self(StaticSecret::random_from_rng(rng))
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(StaticSecret::from(bytes))
    }

    pub fn public_key(&self) -> DevicePublicKey {
        X25519Public::from(&self.0).into()
    }

    pub(crate) fn inner(&self) -> &StaticSecret {
        &self.0
    }
}

impl std::fmt::Debug for DeviceSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DeviceSecret(pub={})", self.public_key().fingerprint())
    }
}
