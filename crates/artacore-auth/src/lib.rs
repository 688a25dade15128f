//! Artacore CMS Authentication and Authorization
//!
//! This crate provides credential verification, JWT issuance, the request
//! gate that guards the API prefix, and the role policy consulted by
//! handlers.

pub mod authenticator;
pub mod error;
pub mod gate;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod policy;

pub use authenticator::{Authenticator, CredentialRecord, CredentialStore};
pub use error::AuthError;
pub use gate::{GateConfig, GateDecision, RequestGate};
pub use jwt::{Claims, IssuedToken, JwtManager, TOKEN_TTL_SECS};
pub use middleware::{AuthUser, gate_middleware};
pub use password::{hash_password, verify_password};
pub use policy::{Action, FlatPolicy, Policy, RolePolicy, policy_from_name};
