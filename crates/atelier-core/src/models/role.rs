//! Role domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AtelierError, AtelierResult};
use crate::tenant_context::TenantOwned;

/// Highest hierarchy level a role may carry.
pub const MAX_ROLE_LEVEL: u8 = 100;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RoleType {
    /// Platform-wide role, shared by every tenant.
    System,
    /// Role defined by and private to one tenant.
    Tenant,
}

impl RoleType {
    /// `System` roles carry no tenant; `Tenant` roles must carry one.
    pub fn check_tenant(self, tenant_id: Option<Uuid>) -> AtelierResult<()> {
        match (self, tenant_id) {
            (Self::System, None) | (Self::Tenant, Some(_)) => Ok(()),
            (Self::System, Some(_)) => Err(AtelierError::validation(
                "system roles cannot belong to a tenant",
            )),
            (Self::Tenant, None) => Err(AtelierError::validation(
                "tenant roles require a tenant_id",
            )),
        }
    }
}

/// A named bundle of permission tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub role_type: RoleType,
    /// `None` for system roles.
    pub tenant_id: Option<Uuid>,
    /// Hierarchy level, 0–100. Higher levels outrank lower ones.
    pub level: u8,
    /// Permission tokens (`resource:action:scope`).
    pub permissions: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TenantOwned for Role {
    fn tenant_id(&self) -> Option<Uuid> {
        self.tenant_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRole {
    pub name: String,
    pub description: String,
    pub role_type: RoleType,
    pub tenant_id: Option<Uuid>,
    pub level: u8,
    pub permissions: Vec<String>,
}

impl CreateRole {
    /// Check the type/tenant invariant and the level range.
    pub fn validate(&self) -> AtelierResult<()> {
        if self.name.trim().is_empty() {
            return Err(AtelierError::validation("role name must not be empty"));
        }
        check_level(self.level)?;
        self.role_type.check_tenant(self.tenant_id)
    }
}

/// Role type and tenant are immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateRole {
    pub name: Option<String>,
    pub description: Option<String>,
    pub level: Option<u8>,
    pub permissions: Option<Vec<String>>,
}

impl UpdateRole {
    pub fn validate(&self) -> AtelierResult<()> {
        if let Some(name) = &self.name
            && name.trim().is_empty()
        {
            return Err(AtelierError::validation("role name must not be empty"));
        }
        match self.level {
            Some(level) => check_level(level),
            None => Ok(()),
        }
    }
}

fn check_level(level: u8) -> AtelierResult<()> {
    if level > MAX_ROLE_LEVEL {
        return Err(AtelierError::validation(format!(
            "role level {level} exceeds {MAX_ROLE_LEVEL}"
        )));
    }
    Ok(())
}
