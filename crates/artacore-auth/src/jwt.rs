//! JWT token management

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::error::AuthError;

/// Lifetime of every issued token. There is no refresh; callers log in again.
pub const TOKEN_TTL_SECS: i64 = 3600;

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: i64,
    /// Login email
    pub email: String,
    /// User role
    pub role: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// A freshly signed token together with what it encodes
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: i64,
    pub claims: Claims,
}

/// JWT manager for token generation and validation
///
/// Holds the HS256 signing secret; it is immutable after construction and
/// never printed.
#[derive(Clone)]
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for JwtManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtManager")
            .field("secret", &"<redacted>")
            .field("ttl_secs", &TOKEN_TTL_SECS)
            .finish()
    }
}

impl JwtManager {
    /// Create a new JWT manager
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is compared against the caller's clock in `validate_token_at`
        validation.validate_exp = false;
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Generate a token for a user, issued now
    pub fn generate_token(
        &self,
        user_id: i64,
        email: &str,
        role: &str,
    ) -> Result<IssuedToken, AuthError> {
        self.generate_token_at(user_id, email, role, Utc::now())
    }

    /// Generate a token as if issued at `now`
    pub fn generate_token_at(
        &self,
        user_id: i64,
        email: &str,
        role: &str,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, AuthError> {
        let exp = now + Duration::seconds(TOKEN_TTL_SECS);

        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            role: role.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        debug!("Generating token for user: {}", email);

        let token = self.encode_claims(&claims)?;

        Ok(IssuedToken {
            token,
            expires_in: TOKEN_TTL_SECS,
            claims,
        })
    }

    /// Sign arbitrary claims
    pub fn encode_claims(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("Token signing failed: {}", e)))
    }

    /// Validate a token against the current time and return its claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.validate_token_at(token, Utc::now())
    }

    /// Validate a token against `now`
    ///
    /// Signature failures, malformed tokens and expired tokens all map to
    /// [`AuthError::InvalidOrExpiredToken`].
    pub fn validate_token_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                debug!("Token rejected: {}", e);
                AuthError::InvalidOrExpiredToken
            })?;

        if token_data.claims.exp <= now.timestamp() {
            debug!("Token rejected: expired at {}", token_data.claims.exp);
            return Err(AuthError::InvalidOrExpiredToken);
        }

        Ok(token_data.claims)
    }
}
