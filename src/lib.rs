//! # File Server
//! src/lib.rs
//!
//! Servidor HTTP/1.1 concurrente de archivos implementado desde cero:
//! un dispatcher, una cola acotada y un pool fijo de workers que atienden
//! GET, HEAD y PUT sobre un directorio plano.
//!
//! ## Arquitectura
//!
//! - `queue`: cola FIFO acotada y bloqueante (Mutex + Condvar)
//! - `http`: parser incremental de requests y construcción de responses
//! - `files`: handlers GET/HEAD/PUT sobre el directorio raíz
//! - `audit`: audit log con buffer, una línea por request
//! - `server`: dispatcher, workers y apagado ordenado
//! - `config`, `error`, `logging`: CLI, errores fatales y tracing
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use file_server::config::Config;
//! use file_server::server::Server;
//!
//! let config = Config::default();
//! let mut server = Server::new(config).expect("configuración inválida");
//! server.run().expect("Error al iniciar servidor");
//! ```

pub mod audit;
pub mod config;
pub mod error;
pub mod files;
pub mod http;
pub mod logging;
pub mod queue;
pub mod server;
