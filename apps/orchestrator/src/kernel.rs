// [apps/orchestrator/src/kernel.rs]
/*!
 * APARATO: KERNEL DEL ORQUESTADOR
 * CLASIFICACION: COMPOSITION ROOT (ESTRATO L1-APP)
 * RESPONSABILIDAD: IGNICION DE WORKERS, TAREAS DE MANTENIMIENTO Y SERVIDOR HTTP
 */

use std::net::SocketAddr;
use std::time::Duration;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::routes::build_router;
use crate::state::AppState;
use crate::worker;

pub struct Kernel {
    state: AppState,
}

impl Kernel {
    #[instrument(skip(config))]
    pub async fn ignite(config: Config) -> anyhow::Result<Self> {
        let state = AppState::bootstrap(config).await?;
        Ok(Self { state })
    }

    /// Spawns the worker fleet and every background maintenance task, then
    /// blocks serving HTTP traffic until the process is killed.
    pub async fn launch(self) -> anyhow::Result<()> {
        let worker_count = self.state.config.worker_concurrency;
        info!(worker_count, "🧵 [kernel]: spawning worker fleet");
        for index in 0..worker_count {
            let worker_id = format!("worker-{}-{}", index, Uuid::new_v4());
            let state = self.state.clone();
            tokio::spawn(worker::run(state, worker_id));
        }

        spawn_lease_reaper(self.state.clone());
        spawn_cache_sweeper(self.state.clone());
        spawn_blob_sweeper(self.state.clone());
        spawn_rate_limit_sweeper(self.state.clone());

        let router = build_router(self.state.clone());
        let bind_address: SocketAddr = self
            .state
            .config
            .bind_address
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid BIND_ADDRESS: {e}"))?;

        info!(address = %bind_address, "🚀 [kernel]: listening");
        let listener = tokio::net::TcpListener::bind(bind_address).await?;
        axum::serve(listener, router).await?;
        Ok(())
    }
}

/// Reclaims processing-status jobs whose worker lease has gone stale
/// (crashed or hung worker), returning them to the retry/dead-letter path.
fn spawn_lease_reaper(state: AppState) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(state.config.cleanup_interval).await;
            match state.supervisor.reap_stale_leases(&state.job_queue).await {
                Ok(0) => {}
                Ok(reaped) => warn!(reaped, "⏱️  [kernel]: stale leases reclaimed"),
                Err(error) => warn!("⚠️  [kernel]: lease reaper failed: {}", error),
            }
        }
    });
}

fn spawn_cache_sweeper(state: AppState) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(state.config.cleanup_interval).await;
            match state.result_cache.sweep_expired().await {
                Ok(0) => {}
                Ok(swept) => info!(swept, "🧹 [kernel]: expired cache entries swept"),
                Err(error) => warn!("⚠️  [kernel]: cache sweep failed: {}", error),
            }
        }
    });
}

fn spawn_blob_sweeper(state: AppState) {
    let interval = state.config.cleanup_interval.max(Duration::from_secs(60));
    state.blobs.clone().spawn_sweep_task(interval);
}

fn spawn_rate_limit_sweeper(state: AppState) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(state.config.cleanup_interval).await;
            if let Err(error) = state.rate_limiter.cleanup_expired().await {
                warn!("⚠️  [kernel]: rate limit sweep failed: {}", error);
            }
        }
    });
}
