//! JWT token handling
//!
//! Two credential kinds, both bound to a user id:
//! - access tokens authorize per-request operations (short window)
//! - refresh tokens only mint new access tokens (long window)
//!
//! Every verification failure is reported to callers uniformly as
//! `Unauthenticated` so the API leaks nothing about why a credential was
//! rejected; the cause distinction stays in server logs.

use crate::config::JwtConfig;
use crate::error::{AppError, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

const TOKEN_TYPE_ACCESS: &str = "access";
const TOKEN_TYPE_REFRESH: &str = "refresh";

/// Access token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (user id)
    pub sub: String,
    /// Email at issue time
    pub email: String,
    /// Issuer
    pub iss: String,
    /// Token type discriminator (prevents token confusion)
    #[serde(default)]
    pub token_type: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// Refresh token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: String,
    pub iss: String,
    #[serde(default)]
    pub token_type: String,
    pub iat: i64,
    pub exp: i64,
}

/// JWT token manager (HS256, shared secret)
#[derive(Clone)]
pub struct JwtManager {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtManager {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Create a Validation with a strict leeway (5 seconds) instead of the
    /// default 60 seconds, so tokens expire promptly while still tolerating
    /// minor clock skew.
    fn strict_validation(&self) -> Validation {
        let mut v = Validation::new(Algorithm::HS256);
        v.leeway = 5;
        v.set_issuer(&[&self.config.issuer]);
        v.validate_aud = false;
        v
    }

    /// Create an access token for a user
    pub fn create_access_token(&self, user_id: i64, email: &str) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.config.access_token_ttl_secs);

        let claims = AccessClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            iss: self.config.issuer.clone(),
            token_type: TOKEN_TYPE_ACCESS.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(e.into()))
    }

    /// Create a refresh token for a user
    pub fn create_refresh_token(&self, user_id: i64) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.config.refresh_token_ttl_secs);

        let claims = RefreshClaims {
            sub: user_id.to_string(),
            iss: self.config.issuer.clone(),
            token_type: TOKEN_TYPE_REFRESH.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(e.into()))
    }

    /// Verify an access token and return its claims
    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims> {
        let data = decode::<AccessClaims>(token, &self.decoding_key, &self.strict_validation())
            .map_err(|e| {
                tracing::debug!(error = %e, "access token rejected");
                invalid_credential()
            })?;

        if data.claims.token_type != TOKEN_TYPE_ACCESS {
            tracing::debug!(token_type = %data.claims.token_type, "wrong token type for access");
            return Err(invalid_credential());
        }

        Ok(data.claims)
    }

    /// Verify a refresh token and return its claims. A refresh token is
    /// never accepted for resource operations; only the refresh flow calls
    /// this.
    pub fn verify_refresh_token(&self, token: &str) -> Result<RefreshClaims> {
        let data = decode::<RefreshClaims>(token, &self.decoding_key, &self.strict_validation())
            .map_err(|e| {
                tracing::debug!(error = %e, "refresh token rejected");
                invalid_credential()
            })?;

        if data.claims.token_type != TOKEN_TYPE_REFRESH {
            tracing::debug!(token_type = %data.claims.token_type, "wrong token type for refresh");
            return Err(invalid_credential());
        }

        Ok(data.claims)
    }

    /// Parse the subject claim into a user id
    pub fn subject_user_id(sub: &str) -> Result<i64> {
        sub.parse::<i64>().map_err(|_| {
            tracing::debug!(sub, "non-numeric subject claim");
            invalid_credential()
        })
    }

    /// Access token TTL in seconds
    pub fn access_token_ttl(&self) -> i64 {
        self.config.access_token_ttl_secs
    }
}

fn invalid_credential() -> AppError {
    AppError::Unauthenticated("invalid credential".to_string())
}
