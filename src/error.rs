//! # Errores del Servidor
//! src/error.rs
//!
//! Errores que terminan el proceso. Los errores de un request individual
//! (`http::ParseError`, fallas de I/O sobre archivos) se absorben en el
//! worker y nunca llegan hasta aquí.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuración inválida (threads = 0, etc.)
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("cannot bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("cannot open log file {path}: {source}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// El archivo de log dejó de aceptar escrituras
    #[error("audit log write failed: {0}")]
    AuditLog(#[source] io::Error),

    #[error("accept failed: {0}")]
    Accept(#[source] io::Error),

    #[error("failed to spawn thread: {0}")]
    Spawn(#[source] io::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, ServerError>;
