// [apps/orchestrator/src/state.rs]
/*!
 * APARATO: ESTADO COMPARTIDO DE LA APLICACION
 * CLASIFICACION: COMPOSITION ROOT (ESTRATO L1-APP)
 * RESPONSABILIDAD: CABLEADO DE TODOS LOS COMPONENTES DE DOMINIO/INFRA
 * Y REGISTRO DE BANDERAS DE CANCELACION EN VUELO
 */

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use bin2nlp_core_credential_vault::CredentialVault;
use bin2nlp_domain_job_queue::JobQueue;
use bin2nlp_domain_pipeline_executor::{CancellationFlag, PipelineExecutor};
use bin2nlp_domain_rate_limiter::RateLimiter;
use bin2nlp_domain_recovery_supervisor::{RecoverySupervisor, RecoverySupervisorConfig};
use bin2nlp_domain_result_cache::ResultCache;
use bin2nlp_infra_blob_store::BlobStore;
use bin2nlp_infra_db::DbClient;
use bin2nlp_infra_decompiler_client::{DecompilationCollaborator, SubprocessDecompiler};
use uuid::Uuid;

use crate::config::Config;

/// Every long-lived collaborator the handlers and worker loops need,
/// wired once at boot and shared behind `Arc` for the life of the
/// process.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Arc<DbClient>,
    pub blobs: Arc<BlobStore>,
    pub vault: Arc<CredentialVault>,
    pub rate_limiter: Arc<RateLimiter>,
    pub result_cache: Arc<ResultCache>,
    pub job_queue: Arc<JobQueue>,
    pub executor: Arc<PipelineExecutor>,
    pub supervisor: Arc<RecoverySupervisor>,
    pub in_flight: Arc<InFlightRegistry>,
    pub maintenance_mode: Arc<std::sync::atomic::AtomicBool>,
}

impl AppState {
    pub async fn bootstrap(config: Config) -> anyhow::Result<Self> {
        let db = Arc::new(DbClient::connect(&config.database_url, config.database_token.clone()).await?);
        let blobs = Arc::new(BlobStore::new(config.blob_store_path.clone()));
        let vault = Arc::new(CredentialVault::from_env(&config.vault_key_env_var));
        let rate_limiter = Arc::new(RateLimiter::new(db.clone(), config.rate_limiter_config()));
        let result_cache = Arc::new(ResultCache::new(db.clone()));
        let job_queue = Arc::new(JobQueue::new(db.clone()));

        let decompiler: Arc<dyn DecompilationCollaborator> =
            Arc::new(SubprocessDecompiler::new(config.decompiler_executable_path.clone()));
        let http_client = reqwest::Client::builder().build()?;
        let executor = Arc::new(PipelineExecutor::new(
            db.clone(),
            blobs.clone(),
            decompiler,
            rate_limiter.clone(),
            result_cache.clone(),
            vault.clone(),
            http_client,
        ));

        let supervisor = Arc::new(RecoverySupervisor::new(RecoverySupervisorConfig {
            default_timeout: config.default_operation_timeout,
            max_timeout: config.max_operation_timeout,
            warning_fraction: 0.8,
            grace_period: std::time::Duration::from_secs(5),
            stale_lease_timeout: config.stale_lease_timeout,
        }));

        Ok(Self {
            config: Arc::new(config),
            db,
            blobs,
            vault,
            rate_limiter,
            result_cache,
            job_queue,
            executor,
            supervisor,
            in_flight: Arc::new(InFlightRegistry::default()),
            maintenance_mode: Arc::new(std::sync::atomic::AtomicBool::new(false)),
        })
    }

    pub fn is_in_maintenance(&self) -> bool {
        self.maintenance_mode.load(std::sync::atomic::Ordering::Relaxed)
    }
}

/// Tracks one `CancellationFlag` per leased job so an HTTP-issued cancel
/// can reach a worker mid-execution rather than only affect rows still
/// sitting in `pending`.
#[derive(Default)]
pub struct InFlightRegistry {
    flags: Mutex<HashMap<Uuid, CancellationFlag>>,
}

impl InFlightRegistry {
    pub fn register(&self, job_id: Uuid) -> CancellationFlag {
        let flag = CancellationFlag::new();
        self.flags.lock().expect("in-flight registry lock poisoned").insert(job_id, flag.clone());
        flag
    }

    pub fn deregister(&self, job_id: Uuid) {
        self.flags.lock().expect("in-flight registry lock poisoned").remove(&job_id);
    }

    /// Signals cancellation to a job's flag if it is currently leased by a
    /// worker. Returns `true` if a flag was found and signalled.
    pub fn signal(&self, job_id: Uuid) -> bool {
        match self.flags.lock().expect("in-flight registry lock poisoned").get(&job_id) {
            Some(flag) => {
                flag.cancel();
                true
            }
            None => false,
        }
    }
}
