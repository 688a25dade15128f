//! Request gate for the API prefix
//!
//! Every inbound request is classified as bypassing the gate (public prefix
//! or outside the API), admitted with verified claims, or rejected. The gate
//! keeps no state between requests.

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::error::AuthError;
use crate::jwt::{Claims, JwtManager};

/// Scheme prefix of the Authorization header, matched case-sensitively
pub const BEARER_PREFIX: &str = "Bearer ";

pub const DEFAULT_API_PREFIX: &str = "/api/";

/// Entry points that must work before the client holds a token
pub fn default_public_prefixes() -> Vec<String> {
    vec!["/api/auth".to_string(), "/api/register".to_string()]
}

/// Which paths the gate inspects
#[derive(Debug, Clone)]
pub struct GateConfig {
    pub api_prefix: String,
    pub public_prefixes: Vec<String>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            public_prefixes: default_public_prefixes(),
        }
    }
}

/// Outcome of [`RequestGate::authorize`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Public prefix or non-API path; headers were not inspected.
    Bypass,
    Admit(Claims),
    Reject(AuthError),
}

#[derive(Debug, Clone)]
pub struct RequestGate {
    config: GateConfig,
    jwt: Arc<JwtManager>,
}

impl RequestGate {
    pub fn new(jwt: Arc<JwtManager>, config: GateConfig) -> Self {
        Self { config, jwt }
    }

    /// True if `path` is exempt from token checks
    pub fn is_public(&self, path: &str) -> bool {
        self.config
            .public_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// Classify a request against the current time
    pub fn authorize(&self, path: &str, headers: &HeaderMap) -> GateDecision {
        self.authorize_at(path, headers, Utc::now())
    }

    /// Classify a request against `now`
    pub fn authorize_at(&self, path: &str, headers: &HeaderMap, now: DateTime<Utc>) -> GateDecision {
        if self.is_public(path) || !path.starts_with(self.config.api_prefix.as_str()) {
            return GateDecision::Bypass;
        }

        let token = match headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(AuthError::MissingOrMalformedHeader)
            .and_then(extract_bearer_token)
        {
            Ok(token) => token,
            Err(e) => return GateDecision::Reject(e),
        };

        match self.jwt.validate_token_at(token, now) {
            Ok(claims) => GateDecision::Admit(claims),
            Err(e) => GateDecision::Reject(e),
        }
    }
}

/// Extract the token from a `Bearer <token>` header value
pub fn extract_bearer_token(header: &str) -> Result<&str, AuthError> {
    match header.strip_prefix(BEARER_PREFIX) {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(AuthError::MissingOrMalformedHeader),
    }
}
