//! Identity store backed by the configured user table.

use std::collections::BTreeMap;

use async_trait::async_trait;

use gradebook_core::auth::{Credentials, IdentityStore};
use gradebook_core::error::{GradebookError, Result};
use gradebook_core::model::{Identity, Role};

use crate::config::{GradebookConfig, UserConfig};

/// Checks credentials against a fixed user table.
///
/// Passwords are compared as given; users with an empty password never
/// authenticate.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityStore {
    users: BTreeMap<String, UserConfig>,
}

impl StaticIdentityStore {
    pub fn new(users: BTreeMap<String, UserConfig>) -> Self {
        Self { users }
    }

    pub fn from_config(config: &GradebookConfig) -> Self {
        Self::new(config.users.clone())
    }

    /// Add or replace a user.
    pub fn with_user(mut self, username: &str, password: &str, role: Role) -> Self {
        self.users.insert(
            username.to_string(),
            UserConfig {
                password: password.to_string(),
                role,
            },
        );
        self
    }

    /// Usernames and roles, without passwords.
    pub fn roster(&self) -> Vec<(String, Role)> {
        self.users
            .iter()
            .map(|(name, user)| (name.clone(), user.role))
            .collect()
    }
}

#[async_trait]
impl IdentityStore for StaticIdentityStore {
    async fn authenticate(&self, credentials: &Credentials) -> Result<Identity> {
        match self.users.get(&credentials.username) {
            Some(user) if !user.password.is_empty() && user.password == credentials.password => {
                Ok(Identity::new(credentials.username.clone(), user.role))
            }
            _ => {
                tracing::warn!(username = %credentials.username, "authentication failed");
                Err(GradebookError::Unauthorized)
            }
        }
    }
}
