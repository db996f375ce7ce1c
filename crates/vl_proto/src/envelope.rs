//! Encrypted message envelope as the transport sees it.
//!
//! Every binary field is base64 text (see `vl_crypto::codec`). Decoding on the
//! way in is tolerant of URL-safe / unpadded input; any field that still fails
//! to decode makes the corresponding decryption step fail closed.
//!
//! Missing fields deserialize to empty values rather than rejecting the whole
//! record: a broken reply or a broken foreign wrap must not make the outer
//! message unreadable.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use vl_crypto::{codec, CipherBox, DevicePublicKey, WrappedKey};

/// The message key wrapped for one recipient device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyWrap {
    #[serde(default)]
    pub recipient_user_id: String,

    /// Absent on records from clients that only address wraps by user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_device_id: Option<String>,

    /// Message key ciphertext + tag.
    #[serde(default)]
    pub encrypted_key: String,

    /// 24-byte nonce.
    #[serde(default)]
    pub nonce: String,

    /// 32-byte ephemeral X25519 public key, unique to this wrap.
    #[serde(default)]
    pub sender_ephemeral_public_key: String,
}

impl KeyWrap {
    pub fn new(user_id: &str, device_id: &str, wrapped: &WrappedKey) -> Self {
        Self {
            recipient_user_id: user_id.to_string(),
            recipient_device_id: Some(device_id.to_string()),
            encrypted_key: codec::encode(&wrapped.encrypted_key),
            nonce: codec::encode(&wrapped.nonce),
            sender_ephemeral_public_key: wrapped.ephemeral_public.to_transport(),
        }
    }

    /// Decode the transport fields. `None` if any field is malformed.
    pub fn decode(&self) -> Option<WrappedKey> {
        Some(WrappedKey {
            encrypted_key: codec::decode(&self.encrypted_key)?,
            nonce: codec::decode_array(&self.nonce)?,
            ephemeral_public: DevicePublicKey(codec::decode_array(
                &self.sender_ephemeral_public_key,
            )?),
        })
    }

    /// Whether this wrap may be tried by `device_id` of `user_id`.
    ///
    /// A wrap naming a device belongs to that device only; a wrap naming just
    /// a user may be tried by any of that user's devices.
    pub fn addressed_to(&self, user_id: &str, device_id: &str) -> bool {
        self.recipient_user_id == user_id
            && self
                .recipient_device_id
                .as_deref()
                .map_or(true, |d| d == device_id)
    }
}

/// On-wire envelope: one body ciphertext + one key wrap per recipient device.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// XChaCha20-Poly1305 ciphertext + tag, base64.
    #[serde(default)]
    pub ciphertext: String,

    /// 24-byte body nonce, base64.
    #[serde(default)]
    pub ciphertext_nonce: String,

    /// Exactly one entry per target device. Unordered; keyed by recipient.
    #[serde(default)]
    pub encrypted_keys: Vec<KeyWrap>,

    /// Quoted message, itself a complete envelope. Anything that is not an
    /// envelope object (e.g. a bare message id) reads as no reply.
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "reply_envelope")]
    pub reply: Option<Box<Envelope>>,
}

impl Envelope {
    pub fn from_parts(sealed: &CipherBox, encrypted_keys: Vec<KeyWrap>) -> Self {
        Self {
            ciphertext: codec::encode(&sealed.ciphertext),
            ciphertext_nonce: codec::encode(&sealed.nonce),
            encrypted_keys,
            reply: None,
        }
    }

    pub fn with_reply(mut self, reply: Envelope) -> Self {
        self.reply = Some(Box::new(reply));
        self
    }

    /// Decode the body fields. `None` if either is malformed.
    pub fn cipher_box(&self) -> Option<CipherBox> {
        Some(CipherBox {
            ciphertext: codec::decode(&self.ciphertext)?,
            nonce: codec::decode_array(&self.ciphertext_nonce)?,
        })
    }

    /// Number of nested reply envelopes below this one.
    pub fn reply_depth(&self) -> usize {
        let mut depth = 0;
        let mut cursor = self.reply.as_deref();
        while let Some(next) = cursor {
            depth += 1;
            cursor = next.reply.as_deref();
        }
        depth
    }

    /// Serialise to the JSON body handed to the transport.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

fn reply_envelope<'de, D>(deserializer: D) -> Result<Option<Box<Envelope>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(value @ Value::Object(_)) => serde_json::from_value(value).ok().map(Box::new),
        _ => None,
    })
}
