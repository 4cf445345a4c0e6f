// [apps/orchestrator/src/worker.rs]
/*!
 * APARATO: BUCLE DE TRABAJADOR
 * CLASIFICACION: APPLICATION LAYER (ESTRATO L1-APP)
 * RESPONSABILIDAD: ARRIENDO, EJECUCION SUPERVISADA Y LIBERACION DE UN JOB
 */

use std::time::Duration;

use bin2nlp_infra_db::WorkerRepository;
use tracing::{info, instrument, warn};

use crate::state::AppState;

const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Runs forever: lease the next eligible job, supervise it to completion,
/// then loop. Sleeps briefly whenever the queue comes back empty so an
/// idle fleet does not spin the database.
#[instrument(skip(state), fields(worker_id = %worker_id))]
pub async fn run(state: AppState, worker_id: String) {
    info!("🧵 [worker]: loop starting");
    loop {
        heartbeat(&state, &worker_id, None).await;

        let leased = match state.job_queue.lease_next(&worker_id).await {
            Ok(job) => job,
            Err(error) => {
                warn!("⚠️  [worker]: lease attempt failed: {}", error);
                tokio::time::sleep(IDLE_POLL_INTERVAL).await;
                continue;
            }
        };

        let Some(job) = leased else {
            tokio::time::sleep(IDLE_POLL_INTERVAL).await;
            continue;
        };

        heartbeat(&state, &worker_id, Some(job.id)).await;
        let cancellation = state.in_flight.register(job.id);

        info!(job_id = %job.id, tenant_id = %job.tenant_id, "📦 [worker]: job leased");
        match state
            .supervisor
            .supervise(&job, &worker_id, &state.job_queue, &state.executor, &cancellation)
            .await
        {
            Ok(outcome) => info!(job_id = %job.id, outcome = ?outcome, "🏁 [worker]: job settled"),
            Err(error) => warn!(job_id = %job.id, "❌ [worker]: supervision failed: {}", error),
        }

        state.in_flight.deregister(job.id);
    }
}

/// Best-effort: a heartbeat failure never interrupts the lease/execute
/// cycle, it only means this worker briefly drops out of `GET
/// /api/v1/workers` until the next successful write.
async fn heartbeat(state: &AppState, worker_id: &str, current_job_id: Option<uuid::Uuid>) {
    let connection = match state.db.get_connection() {
        Ok(connection) => connection,
        Err(error) => {
            warn!("⚠️  [worker]: heartbeat skipped, connection unavailable: {}", error);
            return;
        }
    };
    if let Err(error) = WorkerRepository::new(connection).record_heartbeat(worker_id, current_job_id).await {
        warn!("⚠️  [worker]: heartbeat write failed: {}", error);
    }
}
