use anyhow::{anyhow, Result};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use time::{Duration, OffsetDateTime};

pub const MAX_PASSWORD_BYTES: usize = 128;

const AUTH_TOKEN_BYTES: usize = 32;

/// A user's password. The plaintext is only ever held transiently while
/// signing up or logging in and is never persisted or serialized.
#[derive(Clone, Default)]
pub struct Password {
    pub plaintext: Option<String>,
    pub hash: String,
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Password").finish_non_exhaustive()
    }
}

impl Password {
    pub fn from_hash(hash: String) -> Self {
        Self {
            plaintext: None,
            hash,
        }
    }

    /// Hashes `plaintext` with a fresh salt and keeps both forms.
    pub fn set(&mut self, plaintext: &str) -> Result<()> {
        self.hash = hash_password(plaintext)?;
        self.plaintext = Some(plaintext.to_string());
        Ok(())
    }

    pub fn matches(&self, candidate: &str) -> Result<bool> {
        verify_password(candidate, &self.hash)
    }
}

pub fn hash_password(password: &str) -> Result<String> {
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(anyhow!(
            "password exceeds {} bytes",
            MAX_PASSWORD_BYTES
        ));
    }
    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| anyhow!("failed to hash password: {}", err))?;
    Ok(hash.to_string())
}

/// Verification runs in constant time with respect to the candidate; only a
/// malformed stored hash is an error.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|err| anyhow!("failed to parse password hash: {}", err))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthToken {
    #[serde(rename = "token")]
    pub plaintext: String,
    #[serde(skip)]
    pub hash: String,
    #[serde(skip)]
    pub user_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub expiry: OffsetDateTime,
}

pub fn generate_auth_token(user_id: i64, ttl: Duration) -> AuthToken {
    let mut bytes = [0u8; AUTH_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    let plaintext = URL_SAFE_NO_PAD.encode(bytes);

    AuthToken {
        hash: hash_token(&plaintext),
        plaintext,
        user_id,
        expiry: OffsetDateTime::now_utc() + ttl,
    }
}

fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)
}
