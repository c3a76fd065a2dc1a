//! SurrealDB connection over WebSocket.

use surrealdb::Surreal;
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use tracing::info;

use crate::error::DbError;

#[derive(Debug, Clone)]
pub struct DbConfig {
    /// `host:port` of the SurrealDB server.
    pub endpoint: String,
    pub namespace: String,
    pub database: String,
    pub root_user: String,
    pub root_password: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            endpoint: "127.0.0.1:8000".into(),
            namespace: "atelier".into(),
            database: "main".into(),
            root_user: "root".into(),
            root_password: "root".into(),
        }
    }
}

/// An authenticated client bound to the Atelier namespace and database.
#[derive(Clone)]
pub struct DbManager {
    client: Surreal<Client>,
}

impl DbManager {
    pub async fn connect(config: &DbConfig) -> Result<Self, DbError> {
        info!(
            endpoint = %config.endpoint,
            namespace = %config.namespace,
            database = %config.database,
            "opening SurrealDB connection"
        );

        let client = Surreal::new::<Ws>(config.endpoint.as_str()).await?;
        client
            .signin(Root {
                username: config.root_user.clone(),
                password: config.root_password.clone(),
            })
            .await?;
        client
            .use_ns(config.namespace.as_str())
            .use_db(config.database.as_str())
            .await?;

        info!(endpoint = %config.endpoint, "SurrealDB connection ready");
        Ok(Self { client })
    }

    pub fn client(&self) -> &Surreal<Client> {
        &self.client
    }
}
