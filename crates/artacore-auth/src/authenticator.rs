//! Credential verification and token issuance

use artacore_db::Database;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::error::AuthError;
use crate::jwt::{IssuedToken, JwtManager};
use crate::password::{hash_password, verify_password};

/// Stored credentials for one account
#[derive(Debug, Clone)]
pub struct CredentialRecord {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub role: String,
}

/// Read-only lookup of credentials by email
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Find the record whose email equals `email` exactly
    async fn find_credentials(&self, email: &str) -> Result<Option<CredentialRecord>, AuthError>;
}

#[async_trait]
impl CredentialStore for Database {
    async fn find_credentials(&self, email: &str) -> Result<Option<CredentialRecord>, AuthError> {
        let user = self
            .get_user_by_email(email)
            .await
            .map_err(|e| AuthError::Internal(format!("Credential lookup failed: {}", e)))?;

        Ok(user.map(|u| CredentialRecord {
            id: u.id,
            email: u.email,
            password_hash: u.password_hash,
            role: u.role.as_str().to_string(),
        }))
    }
}

/// Verifies email/password pairs and issues access tokens
pub struct Authenticator {
    store: Arc<dyn CredentialStore>,
    jwt: Arc<JwtManager>,
    /// Verified against when the email is unknown, so both failure paths
    /// cost one Argon2 verification.
    dummy_hash: String,
}

impl Authenticator {
    pub fn new(store: Arc<dyn CredentialStore>, jwt: Arc<JwtManager>) -> Result<Self, AuthError> {
        let dummy_hash = hash_password("artacore-unknown-account")?;
        Ok(Self {
            store,
            jwt,
            dummy_hash,
        })
    }

    /// Check credentials and issue a token
    ///
    /// Unknown email and wrong password both return
    /// [`AuthError::InvalidCredentials`].
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<IssuedToken, AuthError> {
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        debug!("Login attempt for user: {}", email);

        let record = self.store.find_credentials(email).await.inspect_err(|e| {
            error!("Login lookup failed: {}", e);
        })?;

        let hash_to_verify = record
            .as_ref()
            .map(|r| r.password_hash.as_str())
            .unwrap_or(self.dummy_hash.as_str());

        let password_valid = verify_password(password, hash_to_verify).inspect_err(|e| {
            error!("Password verification failed for {}: {}", email, e);
        })?;

        let record = match (record, password_valid) {
            (Some(r), true) => r,
            _ => {
                metrics::counter!("artacore_logins_total", "outcome" => "rejected").increment(1);
                debug!("Rejected credentials for user: {}", email);
                return Err(AuthError::InvalidCredentials);
            }
        };

        let issued = self
            .jwt
            .generate_token(record.id, &record.email, &record.role)?;

        metrics::counter!("artacore_logins_total", "outcome" => "success").increment(1);
        info!("User {} logged in successfully", record.email);

        Ok(issued)
    }
}
