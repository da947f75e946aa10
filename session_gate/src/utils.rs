use std::num::NonZeroU32;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use ring::pbkdf2;
use ring::rand::SecureRandom;
use thiserror::Error;

const PASSWORD_HASH_SCHEME: &str = "pbkdf2-sha256";
const PASSWORD_HASH_ITERATIONS: u32 = 100_000;
const PASSWORD_SALT_LEN: usize = 16;
const PASSWORD_HASH_LEN: usize = ring::digest::SHA256_OUTPUT_LEN;

pub(crate) fn base64url_decode(input: &str) -> Result<Vec<u8>, UtilError> {
    let decoded = URL_SAFE_NO_PAD
        .decode(input)
        .map_err(|_| UtilError::Format("Failed to decode base64url".to_string()))?;
    Ok(decoded)
}

pub(crate) fn base64url_encode(input: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(input)
}

fn fill_random(buf: &mut [u8]) -> Result<(), UtilError> {
    let rng = ring::rand::SystemRandom::new();
    rng.fill(buf)
        .map_err(|_| UtilError::Crypto("Failed to generate random bytes".to_string()))
}

/// Generate `len` random bytes and return them base64url encoded (no padding)
pub fn gen_random_string(len: usize) -> Result<String, UtilError> {
    let mut bytes = vec![0u8; len];
    fill_random(&mut bytes)?;
    Ok(base64url_encode(&bytes))
}

/// Hash a password with PBKDF2-HMAC-SHA256 and a random salt
///
/// The result is self-describing: `pbkdf2-sha256$<iterations>$<salt>$<hash>`,
/// with salt and hash base64url encoded.
pub fn hash_password(password: &str) -> Result<String, UtilError> {
    let iterations = NonZeroU32::new(PASSWORD_HASH_ITERATIONS)
        .ok_or_else(|| UtilError::Crypto("Invalid iteration count".to_string()))?;

    let mut salt = [0u8; PASSWORD_SALT_LEN];
    fill_random(&mut salt)?;

    let mut hash = [0u8; PASSWORD_HASH_LEN];
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        iterations,
        &salt,
        password.as_bytes(),
        &mut hash,
    );

    Ok(format!(
        "{PASSWORD_HASH_SCHEME}${iterations}${}${}",
        base64url_encode(&salt),
        base64url_encode(&hash)
    ))
}

/// Verify a password against an encoded hash produced by [`hash_password`]
///
/// Malformed hashes never verify.
pub fn verify_password(password: &str, encoded: &str) -> bool {
    let Ok((iterations, salt, hash)) = parse_password_hash(encoded) else {
        tracing::warn!("Stored password hash is malformed");
        return false;
    };

    pbkdf2::verify(
        pbkdf2::PBKDF2_HMAC_SHA256,
        iterations,
        &salt,
        password.as_bytes(),
        &hash,
    )
    .is_ok()
}

/// [`hash_password`] on the blocking pool, keeping PBKDF2 off the async workers
pub async fn hash_password_blocking(password: &str) -> Result<String, UtilError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| UtilError::Crypto(format!("Password hashing task failed: {e}")))?
}

/// [`verify_password`] on the blocking pool
pub async fn verify_password_blocking(password: &str, encoded: &str) -> Result<bool, UtilError> {
    let password = password.to_string();
    let encoded = encoded.to_string();
    tokio::task::spawn_blocking(move || verify_password(&password, &encoded))
        .await
        .map_err(|e| UtilError::Crypto(format!("Password verification task failed: {e}")))
}

fn parse_password_hash(encoded: &str) -> Result<(NonZeroU32, Vec<u8>, Vec<u8>), UtilError> {
    let mut parts = encoded.split('$');
    let (Some(scheme), Some(iterations), Some(salt), Some(hash), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return Err(UtilError::Format("Unexpected password hash layout".to_string()));
    };

    if scheme != PASSWORD_HASH_SCHEME {
        return Err(UtilError::Format(format!(
            "Unsupported password hash scheme: {scheme}"
        )));
    }

    let iterations = iterations
        .parse::<u32>()
        .ok()
        .and_then(NonZeroU32::new)
        .ok_or_else(|| UtilError::Format("Invalid iteration count".to_string()))?;

    Ok((iterations, base64url_decode(salt)?, base64url_decode(hash)?))
}

#[derive(Debug, Error, Clone)]
pub enum UtilError {
    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Invalid format: {0}")]
    Format(String),
}
