use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::Claims;
use crate::models::TokenResponse;

/// Claims carried by tokens this gateway issues.
#[derive(Debug, Serialize)]
struct IssuedClaims<'a> {
    sub: &'a str,
    username: &'a str,
    iat: i64,
    exp: i64,
    jti: String,
}

/// Issues and verifies HS256 bearer tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: Arc::new(EncodingKey::from_secret(secret.as_bytes())),
            decoding: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
            ttl,
        }
    }

    /// Sign a token for `username`.
    #[instrument(skip(self))]
    pub fn issue(&self, username: &str) -> AppResult<TokenResponse> {
        let ttl_secs = i64::try_from(self.ttl.as_secs())
            .map_err(|_| AppError::Internal("token TTL out of range".to_string()))?;
        let now = Utc::now().timestamp();

        let claims = IssuedClaims {
            sub: username,
            username,
            iat: now,
            exp: now.saturating_add(ttl_secs),
            jti: Uuid::new_v4().to_string(),
        };

        let token = jsonwebtoken::encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("failed to sign token: {e}")))?;

        info!("Token issued");
        Ok(TokenResponse {
            token,
            token_type: "Bearer",
            expires_in: self.ttl.as_secs(),
        })
    }

    /// Check the signature and expiry of `token` and return its claims.
    ///
    /// # Errors
    ///
    /// `Unauthorized` when the token is malformed, signed with another key,
    /// uses another algorithm or has expired.
    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        let validation = Validation::new(Algorithm::HS256);

        jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(error = %e, "Bearer token rejected");
                AppError::Unauthorized("Invalid or expired token".to_string())
            })
    }
}
