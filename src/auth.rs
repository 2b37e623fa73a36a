//! Credentials: salted password hashes and bearer tokens.
//!
//! Passwords are stored as `hex(salt)$hex(sha256(salt || password))`.
//! Tokens are HS256 JWTs carrying the user id. They are issued on register
//! and login; no endpoint currently requires one.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Errors from token handling.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("token encoding failed: {0}")]
    Encoding(String),
    #[error("invalid token: {0}")]
    InvalidToken(String),
    #[error("expired token")]
    ExpiredToken,
}

const SALT_LEN: usize = 16;

fn digest(salt: &[u8], password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    format!("{}${}", hex::encode(salt), digest(&salt, password))
}

/// Check a password against a stored `salt$digest` string.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, expected)) = stored.split_once('$') else {
        return false;
    };
    match hex::decode(salt_hex) {
        Ok(salt) => digest(&salt, password) == expected,
        Err(_) => false,
    }
}

/// Random secret for processes started without one configured.
pub fn random_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// JWT claims for issued bearer tokens.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    pub id: u64,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and validates HS256 tokens with a single secret.
#[derive(Clone)]
pub struct TokenIssuer {
    secret: Vec<u8>,
    ttl_secs: i64,
}

impl TokenIssuer {
    pub fn new(secret: &[u8], ttl_secs: i64) -> Self {
        Self {
            secret: secret.to_vec(),
            ttl_secs,
        }
    }

    pub fn issue(&self, user_id: u64) -> Result<String, AuthError> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            id: user_id,
            iat: now,
            exp: now + self.ttl_secs,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(&self.secret),
        )
        .map_err(|e| AuthError::Encoding(e.to_string()))
    }

    /// Validate a token string and return its claims.
    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let key = DecodingKey::from_secret(&self.secret);
        let validation = Validation::new(jsonwebtoken::Algorithm::HS256);

        let token_data: TokenData<Claims> =
            decode(token, &key, &validation).map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                _ => AuthError::InvalidToken(e.to_string()),
            })?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_verify() {
        let stored = hash_password("hunter2");
        assert!(verify_password("hunter2", &stored));
        assert!(!verify_password("hunter3", &stored));
    }

    #[test]
    fn test_hash_is_salted() {
        let a = hash_password("same");
        let b = hash_password("same");
        assert_ne!(a, b);
        assert!(verify_password("same", &a));
        assert!(verify_password("same", &b));
    }

    #[test]
    fn test_verify_malformed_hash() {
        assert!(!verify_password("pw", "no-separator"));
        assert!(!verify_password("pw", "zz$abcdef"));
    }

    #[test]
    fn test_token_valid() {
        let issuer = TokenIssuer::new(b"test-secret-key", 3600);
        let token = issuer.issue(42).unwrap();
        let claims = issuer.validate(&token).unwrap();
        assert_eq!(claims.id, 42);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_token_expired() {
        let issuer = TokenIssuer::new(b"test-secret-key", -3600);
        let token = issuer.issue(1).unwrap();
        match issuer.validate(&token) {
            Err(AuthError::ExpiredToken) => {}
            other => panic!("expected ExpiredToken, got {:?}", other),
        }
    }

    #[test]
    fn test_token_wrong_secret() {
        let token = TokenIssuer::new(b"secret-1", 3600).issue(1).unwrap();
        match TokenIssuer::new(b"secret-2", 3600).validate(&token) {
            Err(AuthError::InvalidToken(_)) => {}
            other => panic!("expected InvalidToken, got {:?}", other),
        }
    }

    #[test]
    fn test_token_garbage() {
        let issuer = TokenIssuer::new(b"secret", 3600);
        assert!(matches!(
            issuer.validate("not-a-jwt"),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_random_secret_length() {
        let secret = random_secret();
        assert_eq!(secret.len(), 64);
        assert_ne!(secret, random_secret());
    }
}
