// [apps/orchestrator/src/main.rs]
/*!
 * APARATO: ORCHESTRATOR MAIN ENTRY POINT
 * CLASIFICACION: APPLICATION SHELL (ESTRATO L3)
 * RESPONSABILIDAD: BOOTSTRAP DE INFRAESTRUCTURA E IGNICION DEL PROCESO
 */

use bin2nlp_orchestrator::prelude::*;

use bin2nlp_shared_telemetry::init_tracing;
use dotenvy::dotenv;
use tracing::{error, info};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    init_tracing("bin2nlp_orchestrator");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_stack_size(4 * 1024 * 1024)
        .build()?;

    runtime.block_on(async {
        info!("🛰️  [main]: ignition sequence starting");

        let config = Config::from_env();

        if let Err(error) = bin2nlp_orchestrator::bootstrap::certify(&config).await {
            error!("❌ [main]: pre-operative certification failed: {}", error);
            std::process::exit(1);
        }

        let kernel = Kernel::ignite(config).await?;
        info!("🚀 [main]: system operational, launching worker fleet and HTTP listener");
        kernel.launch().await?;
        Ok(())
    })
}
