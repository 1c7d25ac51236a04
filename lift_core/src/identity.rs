//! Identity of the user driving the log.
//!
//! Credentials are not handled here; an external provider (configuration or
//! the CLI `--user` flag) vouches for the username.

use crate::config::UserConfig;
use crate::{Error, Result};

/// Who is logging, as supplied by the identity provider
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    pub display_name: String,
    pub authenticated: bool,
}

impl Identity {
    /// An authenticated identity
    pub fn authenticated(username: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            display_name: display_name.into(),
            authenticated: true,
        }
    }

    /// Nobody is logged in
    pub fn anonymous() -> Self {
        Self {
            username: String::new(),
            display_name: String::new(),
            authenticated: false,
        }
    }

    /// Resolve the identity from config, with an optional username override.
    ///
    /// The display name falls back to the username.
    pub fn resolve(user: &UserConfig, username_override: Option<&str>) -> Self {
        let username = username_override
            .map(str::to_string)
            .or_else(|| user.username.clone())
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());

        match username {
            Some(username) => {
                let display_name = match (&user.display_name, username_override) {
                    (Some(name), None) => name.clone(),
                    _ => username.clone(),
                };
                Self::authenticated(username, display_name)
            }
            None => Self::anonymous(),
        }
    }

    /// Username of an authenticated identity
    pub fn require_authenticated(&self) -> Result<&str> {
        if self.authenticated && !self.username.is_empty() {
            Ok(&self.username)
        } else {
            Err(Error::Identity(
                "no authenticated user; set [user] username in config or pass --user".into(),
            ))
        }
    }
}
