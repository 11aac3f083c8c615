//! Role password hashing
//!
//! Stored form: `pbkdf2-sha256$<rounds>$<salt b64>$<hash b64>`

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine};
use rand::Rng;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

const SCHEME: &str = "pbkdf2-sha256";
const SALT_LEN: usize = 16;
const KEY_LEN: usize = 32;

pub const DEFAULT_ROUNDS: u32 = 100_000;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("malformed password hash")]
    Malformed,

    #[error("unsupported password scheme '{0}'")]
    UnsupportedScheme(String),
}

fn derive(password: &str, salt: &[u8], rounds: u32) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, rounds, &mut key);
    key
}

/// Hash a password with a fresh random salt
pub fn hash_password(password: &str, rounds: u32) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill(&mut salt);

    let key = derive(password, &salt, rounds);

    format!(
        "{}${}${}${}",
        SCHEME,
        rounds,
        STANDARD_NO_PAD.encode(salt),
        STANDARD_NO_PAD.encode(key)
    )
}

/// Check a password against a stored hash
pub fn verify_password(password: &str, stored: &str) -> Result<bool, PasswordError> {
    let mut parts = stored.split('$');
    let (Some(scheme), Some(rounds), Some(salt), Some(hash), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return Err(PasswordError::Malformed);
    };

    if scheme != SCHEME {
        return Err(PasswordError::UnsupportedScheme(scheme.to_string()));
    }

    let rounds: u32 = rounds.parse().map_err(|_| PasswordError::Malformed)?;
    if rounds == 0 {
        return Err(PasswordError::Malformed);
    }
    let salt = STANDARD_NO_PAD
        .decode(salt)
        .map_err(|_| PasswordError::Malformed)?;
    let expected = STANDARD_NO_PAD
        .decode(hash)
        .map_err(|_| PasswordError::Malformed)?;

    let key = derive(password, &salt, rounds);
    Ok(key.as_slice().ct_eq(expected.as_slice()).into())
}
