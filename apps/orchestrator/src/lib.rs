// [apps/orchestrator/src/lib.rs]
/*!
 * APARATO: ORCHESTRATOR LIBRARY ROOT
 * CLASIFICACION: CRATE ROOT (ESTRATO L3)
 * RESPONSABILIDAD: DEFINICION DEL ARBOL DE MODULOS DE LA APLICACION
 */

/// Lectura y validacion de los controles de operador.
pub mod config;
/// Verificacion de arranque: conectividad y credenciales antes de aceptar trafico.
pub mod bootstrap;
/// Estado compartido inyectado en cada handler y en cada worker.
pub mod state;
/// Ignicion y ciclo de vida del proceso: workers, tareas de mantenimiento, servidor HTTP.
pub mod kernel;
/// Bucle de un worker individual: arriendo, ejecucion supervisada, liberacion.
pub mod worker;
/// Adaptadores HTTP de entrada.
pub mod handlers;
/// Traduccion de fallos internos a respuestas JSON.
pub mod errors;
/// Topologia de rutas.
pub mod routes;
/// Guardianes perimetrales (modo mantenimiento).
pub mod middleware;

/// Re-exportacion de los componentes necesarios para la ignicion minima
/// del sistema desde `main.rs`.
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::kernel::Kernel;
    pub use crate::state::AppState;
}
