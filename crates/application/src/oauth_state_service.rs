//! Signed OAuth state tokens.
//!
//! The role chosen at OAuth initiation rides in a server-issued, HMAC-signed,
//! short-lived state token and is only honored after the callback validates
//! the signature and expiry. Client-side storage is never consulted for the
//! role.

use std::fmt::Write as _;
use std::str::FromStr;

use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use redressa_core::{AppError, AppResult};
use redressa_domain::Role;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Default state token lifetime.
const STATE_TTL_SECONDS: i64 = 600;

/// Issues and validates signed OAuth state tokens.
///
/// Token layout: `{role}.{expires_at_unix}.{nonce_hex}.{tag_hex}` where the
/// tag is an HMAC-SHA256 over the first three segments.
#[derive(Clone)]
pub struct OAuthStateService {
    secret: Vec<u8>,
    ttl: Duration,
}

impl OAuthStateService {
    /// Creates a state service with the default ten-minute lifetime.
    #[must_use]
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
            ttl: Duration::seconds(STATE_TTL_SECONDS),
        }
    }

    /// Overrides the token lifetime.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Issues a signed state token carrying the intended role.
    pub fn issue(&self, role: Role) -> AppResult<String> {
        let mut nonce_bytes = [0u8; 16];
        getrandom::fill(&mut nonce_bytes).map_err(|error| {
            AppError::Internal(format!("failed to generate state nonce: {error}"))
        })?;
        let nonce = encode_hex(&nonce_bytes);

        let expires_at = (Utc::now() + self.ttl).timestamp();
        let payload = format!("{}.{expires_at}.{nonce}", role.as_str());
        let tag = self.sign(&payload)?;

        Ok(format!("{payload}.{tag}"))
    }

    /// Validates a state token and returns the role it carries.
    ///
    /// Any malformed, tampered or expired token is rejected with a single
    /// generic error.
    pub fn validate(&self, token: &str) -> AppResult<Role> {
        let segments: Vec<&str> = token.split('.').collect();
        let [role, expires_at, nonce, tag] = segments.as_slice() else {
            return Err(Self::invalid_token());
        };

        let payload = format!("{role}.{expires_at}.{nonce}");
        let tag_bytes = decode_hex(tag).ok_or_else(Self::invalid_token)?;

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&tag_bytes)
            .map_err(|_| Self::invalid_token())?;

        let expires_at: i64 = expires_at.parse().map_err(|_| Self::invalid_token())?;
        if Utc::now().timestamp() > expires_at {
            return Err(Self::invalid_token());
        }

        Role::from_str(role).map_err(|_| Self::invalid_token())
    }

    fn sign(&self, payload: &str) -> AppResult<String> {
        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        Ok(encode_hex(mac.finalize().into_bytes().as_slice()))
    }

    fn mac(&self) -> AppResult<HmacSha256> {
        HmacSha256::new_from_slice(&self.secret)
            .map_err(|error| AppError::Internal(format!("invalid state signing key: {error}")))
    }

    fn invalid_token() -> AppError {
        AppError::Unauthorized("invalid or expired oauth state token".to_owned())
    }
}

fn encode_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .fold(String::with_capacity(bytes.len() * 2), |mut acc, byte| {
            let _ = write!(acc, "{byte:02x}");
            acc
        })
}

fn decode_hex(value: &str) -> Option<Vec<u8>> {
    if value.len() % 2 != 0 {
        return None;
    }

    (0..value.len())
        .step_by(2)
        .map(|index| u8::from_str_radix(&value[index..index + 2], 16).ok())
        .collect()
}
