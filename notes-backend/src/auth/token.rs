//! Stateless session tokens.
//!
//! Tokens are compact HS256 JWTs (`header.claims.signature`, base64url without
//! padding) carrying the user id and an expiry. Nothing is stored server-side,
//! so a token stays valid until it expires.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

const HEADER_JSON: &str = r#"{"alg":"HS256","typ":"JWT"}"#;
const ALGORITHM: &str = "HS256";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Unauthorized - No token provided")]
    MissingToken,
    /// Bad signature, malformed, or expired
    #[error("Unauthorized - Invalid token")]
    InvalidToken,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Claims {
    user_id: Uuid,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct Header {
    alg: String,
}

/// Issues and verifies session tokens with a server-held secret.
pub struct SessionIssuer {
    mac: HmacSha256,
    ttl: Duration,
}

impl SessionIssuer {
    pub fn new(secret: impl AsRef<[u8]>, ttl: Duration) -> Self {
        Self {
            mac: HmacSha256::new_from_slice(secret.as_ref()).expect("HMAC can take key of any size"),
            ttl,
        }
    }

    /// Issuer with a fresh random secret. Tokens do not survive a restart.
    pub fn with_random_secret(ttl: Duration) -> Self {
        let mut secret = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut secret);
        Self::new(secret, ttl)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user_id: &Uuid) -> String {
        self.issue_at(user_id, Utc::now())
    }

    fn issue_at(&self, user_id: &Uuid, now: DateTime<Utc>) -> String {
        let claims = Claims {
            user_id: *user_id,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        // Serializing a struct of a Uuid and two integers cannot fail
        let claims_json = serde_json::to_vec(&claims).unwrap_or_default();

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(HEADER_JSON),
            URL_SAFE_NO_PAD.encode(claims_json)
        );
        let signature = self.sign(signing_input.as_bytes());
        format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(signature))
    }

    /// Map a token back to its user id.
    pub fn verify(&self, token: &str) -> Result<Uuid, SessionError> {
        self.verify_at(token, Utc::now())
    }

    fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Uuid, SessionError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(SessionError::MissingToken);
        }

        let mut parts = token.split('.');
        let (Some(header_b64), Some(claims_b64), Some(signature_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(SessionError::InvalidToken);
        };

        let header: Header = decode_json(header_b64)?;
        if header.alg != ALGORITHM {
            return Err(SessionError::InvalidToken);
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| SessionError::InvalidToken)?;
        let signing_input = &token[..header_b64.len() + 1 + claims_b64.len()];
        let mut mac = self.mac.clone();
        mac.update(signing_input.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| SessionError::InvalidToken)?;

        let claims: Claims = decode_json(claims_b64)?;
        if now.timestamp() >= claims.exp {
            return Err(SessionError::InvalidToken);
        }

        Ok(claims.user_id)
    }

    fn sign(&self, input: &[u8]) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(input);
        mac.finalize().into_bytes().to_vec()
    }
}

fn decode_json<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T, SessionError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| SessionError::InvalidToken)?;
    serde_json::from_slice(&bytes).map_err(|_| SessionError::InvalidToken)
}
