//! Permission token grammar: `resource:action[:scope]`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AuthzError, AuthzResult};

/// Data scope carried by a permission token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Cross-tenant.
    All,
    /// Limited to entities of the caller's own tenant.
    Own,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Own => "own",
        }
    }
}

/// A parsed permission token borrowing from its source string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionToken<'a> {
    pub resource: &'a str,
    pub action: &'a str,
    pub scope: Option<Scope>,
}

impl<'a> PermissionToken<'a> {
    /// Parse a token. Resource and action must be non-empty lowercase
    /// identifiers (`[a-z0-9_]+`); the scope, when present, must be
    /// `all` or `own`.
    pub fn parse(raw: &'a str) -> AuthzResult<Self> {
        let malformed = || AuthzError::MalformedToken(raw.to_string());

        let mut parts = raw.split(':');
        let resource = parts.next().filter(|p| is_ident(p)).ok_or_else(malformed)?;
        let action = parts.next().filter(|p| is_ident(p)).ok_or_else(malformed)?;
        let scope = match parts.next() {
            None => None,
            Some("all") => Some(Scope::All),
            Some("own") => Some(Scope::Own),
            Some(_) => return Err(malformed()),
        };
        if parts.next().is_some() {
            return Err(malformed());
        }

        Ok(Self {
            resource,
            action,
            scope,
        })
    }

    /// Compose the token string for `resource:action:scope`.
    pub fn compose(resource: &str, action: &str, scope: Scope) -> String {
        format!("{resource}:{action}:{}", scope.as_str())
    }
}

impl fmt::Display for PermissionToken<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.scope {
            Some(scope) => write!(f, "{}:{}:{}", self.resource, self.action, scope.as_str()),
            None => write!(f, "{}:{}", self.resource, self.action),
        }
    }
}

fn is_ident(s: &str) -> bool {
    !s.is_empty()
        && s.bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
}
