//! # File Server - Entry Point
//! src/main.rs
//!
//! Punto de entrada del servidor HTTP/1.1 de archivos.
//!
//! ```bash
//! file_server [-t threads] [-l logfile] <port>
//! ```

use file_server::config::Config;
use file_server::logging;
use file_server::server::Server;
use tracing::error;

fn main() {
    logging::init();

    // Sin puerto o con flags inválidos clap termina aquí con el uso
    let config = Config::new();
    config.print_summary();

    let mut server = match Server::new(config) {
        Ok(server) => server,
        Err(e) => {
            error!("Error fatal: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.shutdown_handle().register_signals() {
        error!("No se pudieron registrar las señales: {}", e);
        std::process::exit(1);
    }

    // Bloquea hasta SIGTERM/SIGINT o un error fatal
    if let Err(e) = server.run() {
        error!("Error fatal: {}", e);
        std::process::exit(1);
    }
}
