//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! Este módulo implementa el servidor TCP que:
//! 1. Escucha en un puerto (`dispatcher`)
//! 2. Encola las conexiones aceptadas en una cola acotada
//! 3. Las reparte entre un número fijo de workers (`worker`)
//! 4. Se detiene de forma ordenada ante SIGTERM/SIGINT (`shutdown`)

pub mod context;
pub mod dispatcher;
pub mod shutdown;
pub mod tcp;
pub mod worker;

// Re-exportar para facilitar el uso
pub use context::{ServerContext, Task};
pub use shutdown::Shutdown;
pub use tcp::Server;
pub use worker::WorkerPool;
