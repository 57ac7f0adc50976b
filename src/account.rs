use crate::AuthError;

/// Read-only snapshot of a local account, fetched by a [`UserStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserState {
    pub username: String,
    pub encoded_secret: String,
    pub enabled: bool,
    pub account_expired: bool,
    pub account_locked: bool,
    pub password_expired: bool,
}

impl UserState {
    /// An enabled, unexpired, unlocked account with the given encoded secret.
    pub fn new(username: impl Into<String>, encoded_secret: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            encoded_secret: encoded_secret.into(),
            enabled: true,
            account_expired: false,
            account_locked: false,
            password_expired: false,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn expired(mut self) -> Self {
        self.account_expired = true;
        self
    }

    pub fn locked(mut self) -> Self {
        self.account_locked = true;
        self
    }

    pub fn password_expired(mut self) -> Self {
        self.password_expired = true;
        self
    }
}

/// Lookup collaborator for local account snapshots.
pub trait UserStore: Send + Sync {
    fn find_by_username(&self, identity: &str) -> Option<UserState>;
}

/// Post-match validation gate over a [`UserState`].
///
/// Evaluated only after a credential match has succeeded, in fixed order:
/// disabled, then expired, then locked, then password-expired. The order is
/// part of the contract; callers observe disabled-takes-priority-over-locked
/// semantics. Pure, no I/O.
pub struct AccountPolicy;

impl AccountPolicy {
    pub fn validate(state: &UserState) -> Result<(), AuthError> {
        if !state.enabled {
            Err(AuthError::AccountDisabled)
        } else if state.account_expired {
            Err(AuthError::AccountExpired)
        } else if state.account_locked {
            Err(AuthError::AccountLocked)
        } else if state.password_expired {
            Err(AuthError::PasswordExpired)
        } else {
            Ok(())
        }
    }
}
