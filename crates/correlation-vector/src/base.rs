//! Base field generation: random bases and UUID-derived bases.

use rand::rngs::OsRng;
use rand::RngCore;
use uuid::Uuid;

use crate::error::CorrelationVectorError;
use crate::version::CorrelationVectorVersion;

/// The base alphabet shared by all versions: 62 case-sensitive alphanumeric
/// characters in base64-like order, without padding, `+`, or `/`.
pub const BASE_ALPHABET: &[u8; 62] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Returns true if `c` is a valid base character.
pub fn is_base_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
}

/// Generates a fresh random base for `version` from the OS randomness source.
///
/// Fails with [`CorrelationVectorError::RandomnessUnavailable`] if the OS
/// source cannot be read; this is fatal to construction and never retried.
pub(crate) fn random_base(
    version: CorrelationVectorVersion,
) -> Result<String, CorrelationVectorError> {
    let len = version.rules().base_length;
    let mut bytes = vec![0u8; len];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| CorrelationVectorError::RandomnessUnavailable(e.to_string()))?;
    Ok(bytes
        .iter()
        .map(|&b| BASE_ALPHABET[b as usize % BASE_ALPHABET.len()] as char)
        .collect())
}

/// Encodes a UUID into a v2 base deterministically.
///
/// The 128-bit value is written in base 62 over [`BASE_ALPHABET`] and padded
/// on the left with the alphabet's zero digit (`A`) to exactly 22 characters.
/// 62^22 exceeds 2^128, so every UUID fits and the mapping is injective.
pub(crate) fn uuid_base(uuid: &Uuid) -> String {
    let mut n = uuid.as_u128();
    let mut buf = [BASE_ALPHABET[0]; 22];
    let mut i = buf.len();
    while n > 0 {
        i -= 1;
        buf[i] = BASE_ALPHABET[(n % 62) as usize];
        n /= 62;
    }
    buf.iter().map(|&b| b as char).collect()
}
