// [libs/shared/telemetry/src/lib.rs]
/*!
 * APARATO: TELEMETRY OBSERVER
 * CLASIFICACION: SHARED UTILITY (ESTRATO L4/L6)
 * RESPONSABILIDAD: GESTION DE TELEMETRIA ESTRUCTURADA Y CAPTURA DE PANICOS
 *
 * Arquitectura de registro no bloqueante: el rastro de ejecucion se
 * preserva incluso ante una terminacion abrupta de un worker task.
 */

use std::panic;
use tracing::{error, info, instrument};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt as formatting_layer, EnvFilter};

/// Initializes the process-wide tracing subscriber plus a panic hook that
/// reports thread terminations structurally before the process unwinds.
///
/// Development: compact, colorized, human-readable. Production: flattened
/// JSON events suitable for ingestion by a log aggregator.
///
/// # Panics
/// Panics if a global subscriber has already been installed.
#[instrument(skip_all)]
pub fn init_tracing(service_nominal_identifier: &str) {
    let environmental_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "{}={level},tower_http=warn,hyper=warn,libsql=error",
            service_nominal_identifier,
            level = if cfg!(debug_assertions) { "debug" } else { "info" }
        )
        .into()
    });

    let is_production_strata = !cfg!(debug_assertions);

    if is_production_strata {
        tracing_subscriber::registry()
            .with(environmental_filter)
            .with(formatting_layer::layer().json().flatten_event(true))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(environmental_filter)
            .with(formatting_layer::layer().compact().with_target(false))
            .init();
    }

    let service_id_snapshot = service_nominal_identifier.to_string();

    panic::set_hook(Box::new(move |panic_metadata| {
        let panic_location = panic_metadata
            .location()
            .map(|location| format!("{}:{}:{}", location.file(), location.line(), location.column()))
            .unwrap_or_else(|| "unknown".to_string());

        let panic_payload_message = panic_metadata
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| panic_metadata.payload().downcast_ref::<String>().map(|s| s.as_str()))
            .unwrap_or("undefined panic payload");

        error!(
            target: "panic_monitor",
            service = %service_id_snapshot,
            location = %panic_location,
            "🔥 [panic]: thread terminated abruptly: {}",
            panic_payload_message
        );
    }));

    info!(
        "👁️  [telemetry]: observability initialized for [{}]",
        service_nominal_identifier
    );
}
