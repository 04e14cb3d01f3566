//! Signed token codec: verification tokens and session token pairs.
//!
//! Tokens are HS256 JWTs under a single shared secret. Signature and expiry
//! checks share one failure surface: a forged token and an expired token are
//! indistinguishable to the caller (`Unauthorized`). Expiry is exact, with no
//! validation leeway.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;

/// Claims asserting that a phone number passed OTP verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationClaims {
    pub phone: String,
    pub otp_id: Uuid,
    pub exp: i64,
    pub iat: i64,
}

/// Claims identifying an authenticated account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub user_id: Uuid,
    pub exp: i64,
    pub iat: i64,
}

/// Access/refresh pair returned to clients. `expires_in` is the access
/// token's remaining lifetime in seconds.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionTokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    verification_ttl_seconds: i64,
    access_ttl_seconds: i64,
    refresh_ttl_seconds: i64,
}

impl TokenCodec {
    #[must_use]
    pub fn new(secret: &str, config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            verification_ttl_seconds: config.verification_token_ttl_seconds(),
            access_ttl_seconds: config.access_token_ttl_seconds(),
            refresh_ttl_seconds: config.refresh_token_ttl_seconds(),
        }
    }

    fn strict_validation() -> Validation {
        let mut validation = Validation::default();
        validation.leeway = 0;
        validation
    }

    /// Mint a verification token bound to `{phone, otp_id}`.
    ///
    /// # Errors
    /// Returns an error if signing fails.
    pub fn mint_verification(
        &self,
        phone: &str,
        otp_id: Uuid,
    ) -> Result<(String, DateTime<Utc>)> {
        let now = Utc::now();
        let expires_at = now + Duration::seconds(self.verification_ttl_seconds);
        let claims = VerificationClaims {
            phone: phone.to_string(),
            otp_id,
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .context("Failed to sign verification token")?;
        Ok((token, expires_at))
    }

    /// Verify a verification token and return its claims.
    ///
    /// # Errors
    /// Returns `Unauthorized` for a bad signature, malformed token, or
    /// elapsed expiry; the failure surface is deliberately undifferentiated.
    pub fn verify_verification(&self, token: &str) -> Result<VerificationClaims, AuthError> {
        decode::<VerificationClaims>(token, &self.decoding_key, &Self::strict_validation())
            .map(|data| data.claims)
            .map_err(|_| AuthError::Unauthorized)
    }

    /// Mint an access/refresh session pair for an account.
    ///
    /// # Errors
    /// Returns an error if signing fails.
    pub fn mint_session_pair(&self, user_id: Uuid) -> Result<SessionTokenPair> {
        let now = Utc::now();
        let access_exp = now + Duration::seconds(self.access_ttl_seconds);
        let refresh_exp = now + Duration::seconds(self.refresh_ttl_seconds);

        let access_claims = SessionClaims {
            user_id,
            exp: access_exp.timestamp(),
            iat: now.timestamp(),
        };
        let refresh_claims = SessionClaims {
            user_id,
            exp: refresh_exp.timestamp(),
            iat: now.timestamp(),
        };

        let access_token = encode(&Header::default(), &access_claims, &self.encoding_key)
            .context("Failed to sign access token")?;
        let refresh_token = encode(&Header::default(), &refresh_claims, &self.encoding_key)
            .context("Failed to sign refresh token")?;

        Ok(SessionTokenPair {
            access_token,
            refresh_token,
            expires_in: access_exp.timestamp() - Utc::now().timestamp(),
        })
    }

    /// Verify a session token (access or refresh) and return its claims.
    ///
    /// # Errors
    /// Returns `Unauthorized` with the same undifferentiated surface as
    /// [`Self::verify_verification`].
    pub fn verify_session(&self, token: &str) -> Result<SessionClaims, AuthError> {
        decode::<SessionClaims>(token, &self.decoding_key, &Self::strict_validation())
            .map(|data| data.claims)
            .map_err(|_| AuthError::Unauthorized)
    }
}
