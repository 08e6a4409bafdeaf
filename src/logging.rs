//! # Logging operacional
//! src/logging.rs
//!
//! Inicializa `tracing` para los mensajes del servidor (arranque, errores,
//! conexiones). No confundir con el audit log de `crate::audit`.
//!
//! El nivel se controla con `RUST_LOG`; por defecto `file_server=info`.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "file_server=info";

/// Instala el subscriber global. Llamar una sola vez desde `main`.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());

    // try_init: en tests otro subscriber puede estar instalado ya
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
