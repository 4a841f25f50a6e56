use serde::{Deserialize, Serialize};

use crate::UserId;

/// User information carried by every authenticated gateway request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    user_id: UserId,
    suspended: bool,
}

impl UserIdentity {
    /// Creates an active user identity.
    #[must_use]
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            suspended: false,
        }
    }

    /// Creates a suspended user identity.
    ///
    /// Suspended identities short-circuit every access resolution to a denial
    /// before any grant is read.
    #[must_use]
    pub fn suspended(user_id: UserId) -> Self {
        Self {
            user_id,
            suspended: true,
        }
    }

    /// Returns the stable user identifier.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns whether the account is suspended.
    #[must_use]
    pub fn is_suspended(&self) -> bool {
        self.suspended
    }
}
