//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración del servidor de archivos con soporte para argumentos CLI
//! y variables de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./file_server -t 8 -l audit.log 8080
//! ./file_server --root ./data --requests-per-thread 20 8080
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! HTTP_THREADS=8 HTTP_LOGFILE=audit.log ./file_server 8080
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Configuración del servidor HTTP/1.1 de archivos
#[derive(Debug, Clone, Parser)]
#[command(name = "file_server")]
#[command(about = "Servidor HTTP/1.1 concurrente de archivos (GET, PUT, HEAD)")]
#[command(version = "0.1.0")]
pub struct Config {
    /// Puerto en el que escucha el servidor
    pub port: u16,

    /// Número de workers
    #[arg(short = 't', long = "threads", default_value = "4", env = "HTTP_THREADS")]
    pub threads: usize,

    /// Archivo de audit log (se crea o se trunca). Sin él no hay audit log.
    #[arg(short = 'l', long = "logfile", env = "HTTP_LOGFILE")]
    pub logfile: Option<PathBuf>,

    /// Conexiones encoladas por worker antes de que el accept se frene
    #[arg(long = "requests-per-thread", default_value = "10", env = "HTTP_REQUESTS_PER_THREAD")]
    pub requests_per_thread: usize,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "127.0.0.1", env = "HTTP_HOST")]
    pub host: String,

    /// Directorio donde se guardan/leen archivos
    #[arg(long, default_value = ".", env = "HTTP_ROOT")]
    pub root: PathBuf,

    /// Segundos que un read o write sobre una conexión puede quedar sin progreso
    #[arg(long = "timeout", default_value = "10", env = "HTTP_TIMEOUT")]
    pub timeout_secs: u64,
}

impl Config {
    /// Crea una nueva configuración parseando argumentos CLI
    ///
    /// Sin puerto, clap imprime el uso y termina con código distinto de 0.
    pub fn new() -> Self {
        Config::parse()
    }

    /// Obtiene la dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use file_server::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "127.0.0.1:8080");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Capacidad de la cola de conexiones: threads × requests_per_thread
    pub fn queue_capacity(&self) -> usize {
        self.threads.saturating_mul(self.requests_per_thread)
    }

    /// Timeout de lectura/escritura de cada conexión aceptada
    pub fn io_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Valida la configuración
    ///
    /// Retorna errores si hay valores inválidos
    pub fn validate(&self) -> Result<(), String> {
        if self.threads == 0 {
            return Err("Threads must be >= 1".to_string());
        }
        if self.requests_per_thread == 0 {
            return Err("Requests per thread must be >= 1".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("Timeout must be >= 1 second".to_string());
        }
        if !self.root.is_dir() {
            return Err(format!("Root {} is not a directory", self.root.display()));
        }
        Ok(())
    }

    /// Resumen de la configuración en el log
    pub fn print_summary(&self) {
        info!(
            address = %self.address(),
            root = %self.root.display(),
            threads = self.threads,
            timeout_secs = self.timeout_secs,
            queue_capacity = self.queue_capacity(),
            audit_log = %self
                .logfile
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "disabled".to_string()),
            "Configuración"
        );
    }
}

impl Default for Config {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            port: 8080,
            threads: 4,
            logfile: None,
            requests_per_thread: 10,
            host: "127.0.0.1".to_string(),
            root: PathBuf::from("."),
            timeout_secs: 10,
        }
    }
}
