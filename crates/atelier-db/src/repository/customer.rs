//! SurrealDB implementation of [`CustomerRepository`].

use atelier_core::error::{AtelierError, AtelierResult};
use atelier_core::models::customer::{CreateCustomer, Customer, UpdateCustomer};
use atelier_core::repository::{CustomerRepository, PaginatedResult, Pagination};
use atelier_core::tenant_context::TenantContext;
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::{DbError, parse_uuid};
use crate::repository::CountRow;
use crate::tenant_scope::TenantScope;

#[derive(Debug, SurrealValue)]
struct CustomerRow {
    tenant_id: String,
    first_name: String,
    last_name: String,
    email: Option<String>,
    phone: Option<String>,
    notes: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CustomerRow {
    fn into_customer(self, id: Uuid) -> Result<Customer, DbError> {
        Ok(Customer {
            id,
            tenant_id: parse_uuid(&self.tenant_id, "tenant")?,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct CustomerRowWithId {
    record_id: String,
    tenant_id: String,
    first_name: String,
    last_name: String,
    email: Option<String>,
    phone: Option<String>,
    notes: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CustomerRowWithId {
    fn try_into_customer(self) -> Result<Customer, DbError> {
        let id = parse_uuid(&self.record_id, "customer")?;
        CustomerRow {
            tenant_id: self.tenant_id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_customer(id)
    }
}

/// SurrealDB implementation of the Customer repository.
#[derive(Clone)]
pub struct SurrealCustomerRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealCustomerRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> CustomerRepository for SurrealCustomerRepository<C> {
    async fn create(&self, ctx: &TenantContext, input: CreateCustomer) -> AtelierResult<Customer> {
        ctx.check_write(Some(input.tenant_id))?;
        if input.first_name.trim().is_empty() && input.last_name.trim().is_empty() {
            return Err(AtelierError::validation("customer needs a name"));
        }

        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('customer', $id) SET \
                 tenant_id = $tenant_id, \
                 first_name = $first_name, last_name = $last_name, \
                 email = $email, phone = $phone, notes = $notes",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("first_name", input.first_name))
            .bind(("last_name", input.last_name))
            .bind(("email", input.email))
            .bind(("phone", input.phone))
            .bind(("notes", input.notes.unwrap_or_default()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_check("customer", e))?;

        let rows: Vec<CustomerRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "customer".into(),
            id: id_str,
        })?;

        Ok(row.into_customer(id)?)
    }

    async fn get_by_id(&self, ctx: &TenantContext, id: Uuid) -> AtelierResult<Customer> {
        let scope = TenantScope::new(ctx);
        let id_str = id.to_string();

        let query = format!(
            "SELECT * FROM type::record('customer', $id) WHERE {}",
            scope.visible()
        );
        let mut result = self
            .db
            .query(query)
            .bind(scope.binding())
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CustomerRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "customer".into(),
            id: id_str,
        })?;

        Ok(row.into_customer(id)?)
    }

    async fn update(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        input: UpdateCustomer,
    ) -> AtelierResult<Customer> {
        let scope = TenantScope::new(ctx);
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.first_name.is_some() {
            sets.push("first_name = $first_name");
        }
        if input.last_name.is_some() {
            sets.push("last_name = $last_name");
        }
        if input.email.is_some() {
            sets.push("email = $email");
        }
        if input.phone.is_some() {
            sets.push("phone = $phone");
        }
        if input.notes.is_some() {
            sets.push("notes = $notes");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('customer', $id) SET {} WHERE {}",
            sets.join(", "),
            scope.writable()
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(scope.binding())
            .bind(("id", id_str.clone()));
        if let Some(first_name) = input.first_name {
            builder = builder.bind(("first_name", first_name));
        }
        if let Some(last_name) = input.last_name {
            builder = builder.bind(("last_name", last_name));
        }
        // Some(None) clears the field.
        if let Some(email) = input.email {
            builder = builder.bind(("email", email));
        }
        if let Some(phone) = input.phone {
            builder = builder.bind(("phone", phone));
        }
        if let Some(notes) = input.notes {
            builder = builder.bind(("notes", notes));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_check("customer", e))?;

        // Rows outside the context are reported as missing.
        let rows: Vec<CustomerRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "customer".into(),
            id: id_str,
        })?;

        Ok(row.into_customer(id)?)
    }

    async fn delete(&self, ctx: &TenantContext, id: Uuid) -> AtelierResult<()> {
        let scope = TenantScope::new(ctx);
        let id_str = id.to_string();

        let query = format!(
            "DELETE type::record('customer', $id) WHERE {} RETURN BEFORE",
            scope.writable()
        );
        let mut result = self
            .db
            .query(query)
            .bind(scope.binding())
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let deleted: Vec<CustomerRow> = result.take(0).map_err(DbError::from)?;
        if deleted.is_empty() {
            return Err(DbError::NotFound {
                entity: "customer".into(),
                id: id_str,
            }
            .into());
        }
        Ok(())
    }

    async fn list(
        &self,
        ctx: &TenantContext,
        pagination: Pagination,
    ) -> AtelierResult<PaginatedResult<Customer>> {
        let scope = TenantScope::new(ctx);

        let count_query = format!(
            "SELECT count() AS total FROM customer WHERE {} GROUP ALL",
            scope.visible()
        );
        let mut count_result = self
            .db
            .query(count_query)
            .bind(scope.binding())
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map_or(0, |r| r.total);

        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM customer WHERE {} \
             ORDER BY last_name ASC, first_name ASC LIMIT $limit START $offset",
            scope.visible()
        );
        let mut result = self
            .db
            .query(query)
            .bind(scope.binding())
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CustomerRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(CustomerRowWithId::try_into_customer)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
