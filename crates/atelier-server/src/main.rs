//! Atelier Server — application entry point.

use std::time::Duration;

use atelier_core::error::AtelierResult;
use atelier_core::repository::{Pagination, SessionRepository, TenantRepository};
use atelier_core::tenant_context::TenantContext;
use atelier_db::{DbManager, SurrealSessionRepository, SurrealTenantRepository};
use atelier_server::bootstrap;
use atelier_server::config::ServerConfig;
use atelier_server::state::AppState;
use surrealdb::{Connection, Surreal};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(15 * 60);

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("atelier=info"));
    tracing_subscriber::fmt().with_env_filter(filter).json().init();

    if let Err(e) = run().await {
        error!(error = %e, "Atelier server failed");
        std::process::exit(1);
    }
}

async fn run() -> AtelierResult<()> {
    info!("Starting Atelier server...");

    let config = ServerConfig::from_env()?;
    let manager = DbManager::connect(&config.db).await?;
    let db = manager.client().clone();

    atelier_db::run_migrations(&db).await?;
    info!(version = atelier_db::current_version(&db).await?, "schema ready");

    let state = AppState::new(db.clone(), config);
    let seeded = bootstrap::seed_builtin_roles(&state.roles).await?;
    info!(
        created = seeded.created,
        updated = seeded.updated,
        unchanged = seeded.unchanged,
        "built-in roles seeded"
    );
    info!(operations = state.guard.routes().len(), "authorization guard ready");

    let mut sweep = tokio::time::interval(SESSION_SWEEP_INTERVAL);
    loop {
        tokio::select! {
            _ = sweep.tick() => {
                if let Err(e) = sweep_expired_sessions(&db).await {
                    warn!(error = %e, "expired session sweep failed");
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    info!("Atelier server stopped.");
    Ok(())
}

/// Session cleanup is tenant-scoped, so the sweep walks every tenant plus
/// the platform context.
async fn sweep_expired_sessions<C: Connection>(db: &Surreal<C>) -> AtelierResult<()> {
    let tenants = SurrealTenantRepository::new(db.clone());
    let sessions = SurrealSessionRepository::new(db.clone());

    let mut removed = sessions.cleanup_expired(&TenantContext::System).await?;
    let mut pagination = Pagination::default();
    loop {
        let page = tenants.list(pagination.clone()).await?;
        for tenant in &page.items {
            removed += sessions
                .cleanup_expired(&TenantContext::Tenant(tenant.id))
                .await?;
        }
        pagination.offset += page.items.len() as u64;
        if page.items.is_empty() || pagination.offset >= page.total {
            break;
        }
    }

    if removed > 0 {
        info!(removed, "expired sessions swept");
    }
    Ok(())
}
