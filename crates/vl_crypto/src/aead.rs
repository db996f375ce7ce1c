//! Authenticated encryption of message bodies.
//!
//! Uses XChaCha20-Poly1305 (192-bit nonce).
//! Key size: 32 bytes.  Nonce: 24 bytes (random, per seal).  Tag: 16 bytes.
//!
//! Unlike a framed `nonce || ct` blob, a [`CipherBox`] keeps the nonce as a
//! separate field because the envelope transports it separately
//! (`ciphertextNonce`).

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    XChaCha20Poly1305, XNonce,
};
use rand_core::{CryptoRng, RngCore};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::CryptoError;

pub const KEY_LEN: usize = 32;
pub const NONCE_LEN: usize = 24;

/// Body AAD; binds message ciphertexts to this construction.
const BODY_AAD: &[u8] = b"vl-body-v1";

/// One-time message key. Never persisted, never transmitted in the clear.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey([u8; KEY_LEN]);

impl SymmetricKey {
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut key = [0u8; KEY_LEN];
        rng.fill_bytes(&mut key);
        Self(key)
    }

    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SymmetricKey(<redacted>)")
    }
}

/// Ciphertext (with tag) and the nonce it was sealed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CipherBox {
    pub ciphertext: Vec<u8>,
    pub nonce: [u8; NONCE_LEN],
}

pub fn random_nonce<R: RngCore + CryptoRng>(rng: &mut R) -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    rng.fill_bytes(&mut nonce);
    nonce
}

/// Encrypt raw bytes under `key` with an explicit nonce and AAD.
pub(crate) fn encrypt_raw(
    key: &[u8; KEY_LEN],
    nonce: &[u8; NONCE_LEN],
    msg: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let cipher = XChaCha20Poly1305::new_from_slice(key).map_err(|_| CryptoError::AeadEncrypt)?;
    cipher
        .encrypt(XNonce::from_slice(nonce), Payload { msg, aad })
        .map_err(|_| CryptoError::AeadEncrypt)
}

/// Decrypt raw bytes; any tag mismatch is `AeadDecrypt`.
pub(crate) fn decrypt_raw(
    key: &[u8; KEY_LEN],
    nonce: &[u8; NONCE_LEN],
    ct: &[u8],
    aad: &[u8],
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let cipher = XChaCha20Poly1305::new_from_slice(key).map_err(|_| CryptoError::AeadDecrypt)?;
    let plaintext = cipher
        .decrypt(XNonce::from_slice(nonce), Payload { msg: ct, aad })
        .map_err(|_| CryptoError::AeadDecrypt)?;
    Ok(Zeroizing::new(plaintext))
}

/// Seal UTF-8 plaintext under a fresh random nonce.
pub fn seal<R: RngCore + CryptoRng>(
    plaintext: &str,
    key: &SymmetricKey,
    rng: &mut R,
) -> Result<CipherBox, CryptoError> {
    let nonce = random_nonce(rng);
    let ciphertext = encrypt_raw(key.as_bytes(), &nonce, plaintext.as_bytes(), BODY_AAD)?;
    Ok(CipherBox { ciphertext, nonce })
}

/// Open a [`CipherBox`]. Fails closed: wrong key, flipped bits in either the
/// ciphertext or the nonce, and non-UTF-8 output are all `AeadDecrypt`.
pub fn open(sealed: &CipherBox, key: &SymmetricKey) -> Result<Zeroizing<String>, CryptoError> {
    let mut plaintext = decrypt_raw(key.as_bytes(), &sealed.nonce, &sealed.ciphertext, BODY_AAD)?;
    let bytes = std::mem::take(&mut *plaintext);
    String::from_utf8(bytes)
        .map(Zeroizing::new)
        .map_err(|e| {
            let mut rejected = e.into_bytes();
            rejected.zeroize();
            CryptoError::AeadDecrypt
        })
}
