//! vl_crypto — Vellum cryptographic primitives
//!
//! # Design principles
//! - NO custom crypto; all primitives come from audited Rust crates.
//! - Zeroize all secret material on drop.
//! - Randomness is always injected (`&mut R where R: RngCore + CryptoRng`);
//!   nothing in this crate reaches for an ambient RNG.
//!
//! # Module layout
//! - `codec` — tolerant base64 transport encoding
//! - `aead`  — per-message symmetric key + XChaCha20-Poly1305 seal/open
//! - `kdf`   — HKDF-SHA256 derivation of key-wrapping keys
//! - `keys`  — X25519 device keys (secret + transport-encoded public half)
//! - `wrap`  — per-device key wrapping with a fresh ephemeral keypair
//! - `error` — unified error type

pub mod aead;
pub mod codec;
pub mod error;
pub mod kdf;
pub mod keys;
pub mod wrap;

pub use aead::{CipherBox, SymmetricKey, NONCE_LEN};
pub use error::CryptoError;
pub use keys::{DevicePublicKey, DeviceSecret};
pub use wrap::WrappedKey;
