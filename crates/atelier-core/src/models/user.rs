//! User domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tenant_context::TenantOwned;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum UserStatus {
    Active,
    Inactive,
    Suspended,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    /// `None` for platform-level users.
    pub tenant_id: Option<Uuid>,
    pub role_id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub status: UserStatus,
    /// Tokens granted on top of the role's permissions.
    pub granted_permissions: Vec<String>,
    /// Tokens withheld from the role's permissions.
    pub revoked_permissions: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TenantOwned for User {
    fn tenant_id(&self) -> Option<Uuid> {
        self.tenant_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub tenant_id: Option<Uuid>,
    pub role_id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// Raw password (hashed with Argon2id before storage).
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateUser {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role_id: Option<Uuid>,
    pub status: Option<UserStatus>,
    pub granted_permissions: Option<Vec<String>>,
    pub revoked_permissions: Option<Vec<String>>,
}
