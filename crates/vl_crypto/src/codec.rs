//! Transport codec: binary ↔ base64 text.
//!
//! Encoding always emits the standard alphabet with padding. Decoding is
//! tolerant of what other clients put on the wire:
//!   - embedded whitespace / line breaks
//!   - the URL-safe alphabet (`-` / `_`)
//!   - missing `=` padding
//!
//! A decode failure is `None`, never a panic. Callers holding key material
//! treat `None` as an unrecoverable-key condition.

use base64::{engine::general_purpose::STANDARD, Engine};

pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn decode(text: &str) -> Option<Vec<u8>> {
    let mut normalised: String = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();

    let rem = normalised.len() % 4;
    if rem != 0 {
        normalised.extend(std::iter::repeat('=').take(4 - rem));
    }

    STANDARD.decode(normalised).ok()
}

/// Decode into a fixed-size array; `None` on decode failure or length mismatch.
pub fn decode_array<const N: usize>(text: &str) -> Option<[u8; N]> {
    decode(text)?.try_into().ok()
}
