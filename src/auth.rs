use std::collections::HashSet;

use async_trait::async_trait;
use pgwire::api::auth::{AuthSource, LoginInfo, Password};
use pgwire::error::PgWireResult;

/// Shared-password source. Identity management lives outside the server; the
/// login user name is taken as the acting user.
#[derive(Debug)]
pub struct InnkeepAuthSource {
    password: String,
}

impl InnkeepAuthSource {
    pub fn new(password: String) -> Self {
        Self { password }
    }
}

#[async_trait]
impl AuthSource for InnkeepAuthSource {
    async fn get_password(&self, _login: &LoginInfo) -> PgWireResult<Password> {
        Ok(Password::new(None, self.password.as_bytes().to_vec()))
    }
}

/// The user a request acts for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: String,
    pub admin: bool,
}

impl Actor {
    pub fn user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            admin: false,
        }
    }

    pub fn admin(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            admin: true,
        }
    }

    /// Owner of the record, or an admin.
    pub fn may_access(&self, owner: &str) -> bool {
        self.admin || self.user_id == owner
    }
}

/// Users granted the admin role.
#[derive(Debug, Clone, Default)]
pub struct AdminList {
    users: HashSet<String>,
}

impl AdminList {
    /// Comma-separated user names, as in `INNKEEP_ADMINS`.
    pub fn parse(list: &str) -> Self {
        Self {
            users: list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        }
    }

    pub fn actor(&self, user_id: &str) -> Actor {
        Actor {
            user_id: user_id.to_string(),
            admin: self.users.contains(user_id),
        }
    }
}
