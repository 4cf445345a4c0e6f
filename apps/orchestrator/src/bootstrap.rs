// [apps/orchestrator/src/bootstrap.rs]
/*!
 * APARATO: ARRANQUE DEL PROCESO
 * CLASIFICACION: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: VALIDACION PRE-OPERATIVA ANTES DE ACEPTAR TRAFICO
 */

use tracing::{info, instrument};

use crate::config::Config;

/// Runs every check that must pass before the process is allowed to bind
/// its listener: configuration sanity and database reachability. Anything
/// caught here is a deployment mistake, so the process exits rather than
/// limping along in a half-configured state.
#[instrument(skip(config))]
pub async fn certify(config: &Config) -> anyhow::Result<()> {
    config.validate().map_err(|reason| anyhow::anyhow!("configuration rejected: {reason}"))?;
    info!("✅ [bootstrap]: configuration validated");

    let probe = bin2nlp_infra_db::DbClient::connect(&config.database_url, config.database_token.clone()).await?;
    probe.get_connection()?;
    info!("✅ [bootstrap]: database reachable at startup");

    tokio::fs::create_dir_all(&config.blob_store_path).await?;
    info!(path = %config.blob_store_path, "✅ [bootstrap]: blob store directory ready");

    Ok(())
}
