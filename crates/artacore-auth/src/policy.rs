//! Role policy consulted by handlers
//!
//! The gate only establishes identity. Whether that identity may perform a
//! given action is decided here, per handler.

use artacore_db::UserRole;
use std::sync::Arc;
use tracing::debug;

use crate::error::AuthError;
use crate::middleware::AuthUser;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ReadContent,
    WriteContent,
    DeleteContent,
    UploadMedia,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::ReadContent => "read-content",
            Action::WriteContent => "write-content",
            Action::DeleteContent => "delete-content",
            Action::UploadMedia => "upload-media",
        }
    }
}

pub trait Policy: Send + Sync {
    fn can_perform(&self, user: &AuthUser, action: Action) -> bool;

    /// Like [`Policy::can_perform`] but as a `Result` for handlers
    fn require(&self, user: &AuthUser, action: Action) -> Result<(), AuthError> {
        if self.can_perform(user, action) {
            Ok(())
        } else {
            debug!(
                "Denied {} to {} ({})",
                action.as_str(),
                user.email,
                user.role.as_str()
            );
            Err(AuthError::InsufficientPermissions)
        }
    }
}

/// Permissions by role
///
/// Admins and editors may do everything, authors may not delete, viewers
/// may only read.
#[derive(Debug, Clone, Copy, Default)]
pub struct RolePolicy;

impl Policy for RolePolicy {
    fn can_perform(&self, user: &AuthUser, action: Action) -> bool {
        match user.role {
            UserRole::Admin | UserRole::Editor => true,
            UserRole::Author => !matches!(action, Action::DeleteContent),
            UserRole::Viewer => matches!(action, Action::ReadContent),
        }
    }
}

/// Every authenticated identity may perform every action
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatPolicy;

impl Policy for FlatPolicy {
    fn can_perform(&self, _user: &AuthUser, _action: Action) -> bool {
        true
    }
}

/// Resolve a policy by its configuration name (`"role"` or `"flat"`)
pub fn policy_from_name(name: &str) -> Option<Arc<dyn Policy>> {
    match name {
        "role" => Some(Arc::new(RolePolicy)),
        "flat" => Some(Arc::new(FlatPolicy)),
        _ => None,
    }
}
