//! Tenant domain model.
//!
//! A tenant is one salon business. All salon data (staff accounts,
//! tenant roles, customers) is partitioned by tenant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tenant_context::TenantOwned;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SubscriptionPlan {
    Free,
    Basic,
    Professional,
    Enterprise,
}

impl SubscriptionPlan {
    /// Seat limit applied when a tenant is created without an explicit
    /// `max_users`.
    pub fn default_max_users(self) -> u32 {
        match self {
            Self::Free => 3,
            Self::Basic => 10,
            Self::Professional => 50,
            Self::Enterprise => 500,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TenantStatus {
    Active,
    Trial,
    Suspended,
    Cancelled,
}

impl TenantStatus {
    /// Whether members of the tenant may sign in.
    pub fn allows_sign_in(self) -> bool {
        matches!(self, Self::Active | Self::Trial)
    }
}

/// An isolated salon organization; the unit of data partitioning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    /// Human-readable name.
    pub name: String,
    /// URL-safe unique identifier (e.g., `studio-rosa`).
    pub slug: String,
    pub subscription_plan: SubscriptionPlan,
    /// Maximum number of active users the tenant may hold.
    pub max_users: u32,
    pub status: TenantStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A tenant owns itself for `:own` scoping purposes.
impl TenantOwned for Tenant {
    fn tenant_id(&self) -> Option<Uuid> {
        Some(self.id)
    }
}

/// Fields required to create a new tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTenant {
    pub name: String,
    pub slug: String,
    pub subscription_plan: SubscriptionPlan,
    /// Defaults to the plan's seat limit.
    pub max_users: Option<u32>,
}

/// Fields that can be updated on an existing tenant.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateTenant {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub subscription_plan: Option<SubscriptionPlan>,
    pub max_users: Option<u32>,
    pub status: Option<TenantStatus>,
}
