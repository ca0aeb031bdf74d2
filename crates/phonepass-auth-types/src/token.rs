//! Opaque bearer token keys.

use rand::RngExt;

/// Length of a token key in hex characters.
pub const TOKEN_KEY_LEN: usize = 40;

/// Generate a fresh random token key (40 lowercase hex characters).
///
/// ```
/// use phonepass_auth_types::token::{generate_token_key, is_well_formed, TOKEN_KEY_LEN};
///
/// let key = generate_token_key();
/// assert_eq!(key.len(), TOKEN_KEY_LEN);
/// assert!(is_well_formed(&key));
/// ```
pub fn generate_token_key() -> String {
    let bytes: [u8; TOKEN_KEY_LEN / 2] = rand::rng().random();
    hex::encode(bytes)
}

/// Cheap shape check before a key is looked up in storage.
///
/// Only the lowercase form produced by [`generate_token_key`] is accepted.
pub fn is_well_formed(key: &str) -> bool {
    key.len() == TOKEN_KEY_LEN
        && !key.bytes().any(|b| b.is_ascii_uppercase())
        && hex::decode(key).is_ok()
}
