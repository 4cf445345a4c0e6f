// [libs/infra/db/src/client.rs]
/*!
 * APARATO: DATABASE CONNECTION CLIENT
 * CLASIFICACION: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: GESTION DE ENLACES Y PERSISTENCIA ACID
 *
 * En modo memoria, una conexion ancla se mantiene abierta durante toda la
 * vida del cliente: sin ella, SQLite purga la base en cuanto la ultima
 * conexion se cierra, incluso mientras otras conexiones siguen vivas.
 */

use crate::errors::DbError;
use crate::schema::apply_schema;
use libsql::{Builder, Connection, Database};
use std::sync::Arc;
use tracing::{info, instrument};

#[derive(Clone)]
pub struct DbClient {
    driver: Arc<Database>,
    _memory_anchor: Option<Arc<Connection>>,
}

impl DbClient {
    #[instrument(skip(access_token))]
    pub async fn connect(connection_url: &str, access_token: Option<String>) -> Result<Self, DbError> {
        if connection_url.is_empty() {
            return Err(DbError::ConfigurationError("DATABASE_URL is unset".into()));
        }

        info!("🔌 [db]: connecting to [{}]", connection_url);

        let is_remote = connection_url.starts_with("libsql://") || connection_url.starts_with("https://");
        let is_memory = connection_url.contains(":memory:") || connection_url.contains("mode=memory");

        let driver = if is_remote {
            let token = access_token
                .ok_or_else(|| DbError::ConfigurationError("remote database requires an access token".into()))?;
            Builder::new_remote(connection_url.to_string(), token).build().await
        } else {
            Builder::new_local(connection_url).build().await
        }
        .map_err(|e| DbError::ConnectionError(e.to_string()))?;

        let driver = Arc::new(driver);
        let mut anchor = None;

        if is_memory {
            let anchor_conn = driver.connect().map_err(|e| DbError::ConnectionError(e.to_string()))?;
            apply_schema(&anchor_conn)
                .await
                .map_err(|e| DbError::ConnectionError(e.to_string()))?;
            anchor = Some(Arc::new(anchor_conn));
            info!("⚓ [db]: in-memory database anchored for the lifetime of this client");
        } else {
            let bootstrap_conn = driver.connect().map_err(|e| DbError::ConnectionError(e.to_string()))?;
            apply_schema(&bootstrap_conn)
                .await
                .map_err(|e| DbError::ConnectionError(e.to_string()))?;
        }

        Ok(Self {
            driver,
            _memory_anchor: anchor,
        })
    }

    pub fn get_connection(&self) -> Result<Connection, DbError> {
        self.driver.connect().map_err(|e| DbError::ConnectionError(e.to_string()))
    }
}
