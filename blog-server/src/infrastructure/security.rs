use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};

use crate::domain::user::TokenId;

const TOKEN_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
pub const TOKEN_SECRET_LEN: usize = 40;

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)?
        .to_string();
    Ok(hash)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed = PasswordHash::new(hash)?;
    let argon2 = Argon2::default();
    Ok(argon2.verify_password(password.as_bytes(), &parsed).is_ok())
}

/// Random alphanumeric secret for a new bearer token.
pub fn generate_token_secret() -> String {
    let mut secret = String::with_capacity(TOKEN_SECRET_LEN);
    while secret.len() < TOKEN_SECRET_LEN {
        // 248 = 4 * 62, bytes at or above it are redrawn.
        let byte = (OsRng.next_u32() & 0xff) as u8;
        if byte < 248 {
            secret.push(TOKEN_ALPHABET[(byte % 62) as usize] as char);
        }
    }
    secret
}

/// Hex SHA-256, the only form of a token secret that is persisted.
pub fn hash_token(secret: &str) -> String {
    format!("{:x}", Sha256::digest(secret.as_bytes()))
}

/// A bearer token as presented by the client: `<id>|<secret>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlainTextToken {
    pub id: TokenId,
    pub secret: String,
}

impl PlainTextToken {
    pub fn parse(raw: &str) -> Option<Self> {
        let (id, secret) = raw.split_once('|')?;
        let id = id.parse().ok()?;
        if secret.is_empty() {
            return None;
        }
        Some(Self {
            id,
            secret: secret.to_string(),
        })
    }

    pub fn render(&self) -> String {
        format!("{}|{}", self.id, self.secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_round_trip() {
        let hash = hash_password("password123").unwrap();
        assert!(verify_password("password123", &hash).unwrap());
        assert!(!verify_password("wrongpassword", &hash).unwrap());
    }

    #[test]
    fn secrets_are_alphanumeric() {
        let secret = generate_token_secret();
        assert_eq!(secret.len(), TOKEN_SECRET_LEN);
        assert!(secret.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(secret, generate_token_secret());
    }

    #[test]
    fn token_hash_is_stable_hex() {
        let hash = hash_token("abc");
        assert_eq!(hash, "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
    }

    #[test]
    fn parses_plain_text_tokens() {
        let token = PlainTextToken::parse("12|secretValue").unwrap();
        assert_eq!(token.id, 12);
        assert_eq!(token.secret, "secretValue");
        assert_eq!(token.render(), "12|secretValue");

        assert!(PlainTextToken::parse("secretValue").is_none());
        assert!(PlainTextToken::parse("x|secret").is_none());
        assert!(PlainTextToken::parse("3|").is_none());
    }
}
