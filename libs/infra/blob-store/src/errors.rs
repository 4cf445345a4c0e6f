// [libs/infra/blob-store/src/errors.rs]
// =================================================================
// APARATO: BLOB STORE ERRORS
// RESPONSABILIDAD: CATALOGO DE FALLOS EN EL ALMACEN DE OBJETOS C2
// =================================================================

use thiserror::Error;

/// Fallos posibles al leer, escribir o purgar objetos del almacen
/// direccionado por contenido.
#[derive(Error, Debug)]
pub enum BlobError {
    /// La clave excede `MAX_KEY_LENGTH_BYTES`; rechazada antes de tocar disco.
    #[error("la clave de {0} bytes excede el limite de {1} bytes")]
    KeyTooLarge(usize, usize),

    /// No existe payload para la clave solicitada (o ya expiro).
    #[error("objeto no encontrado")]
    NotFound,

    /// Error de E/S del sistema operativo (permisos, disco lleno, etc).
    #[error("error de E/S: {0}")]
    Io(#[from] std::io::Error),

    /// El sidecar `.meta` no pudo interpretarse como JSON valido.
    #[error("metadata corrupta: {0}")]
    CorruptMetadata(#[from] serde_json::Error),

    /// No se pudo adquirir el cerrojo advisory sobre el objeto dentro del plazo.
    #[error("cerrojo advisory no disponible para el objeto")]
    LockUnavailable,
}
