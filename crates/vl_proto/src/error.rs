use thiserror::Error;

/// Encryption-time failures. Any of these aborts the whole envelope; a
/// partially wrapped envelope is never returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncryptError {
    #[error("No recipient devices supplied")]
    NoRecipients,

    #[error("Device {device_id} of user {user_id} has no public key")]
    MissingPublicKey { user_id: String, device_id: String },

    #[error("Device {device_id} has an invalid public key: {reason}")]
    InvalidPublicKey { device_id: String, reason: String },

    #[error("Crypto error: {0}")]
    Crypto(#[from] vl_crypto::CryptoError),
}

/// Decryption-time failures. Callers log
/// `KeyUnwrapFailed` / `BodyDecryptFailed` as corruption or tampering, while
/// `NoMatchingKey` is a normal state (e.g. a device enrolled after the send).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DecryptError {
    #[error("No key wrap addressed to this device")]
    NoMatchingKey,

    #[error("Key unwrap failed (corrupted or foreign wrap)")]
    KeyUnwrapFailed,

    #[error("Body decryption failed (corrupted ciphertext or key mismatch)")]
    BodyDecryptFailed,
}

impl DecryptError {
    /// `true` for conditions that are not corruption.
    pub fn is_expected(&self) -> bool {
        matches!(self, DecryptError::NoMatchingKey)
    }
}
