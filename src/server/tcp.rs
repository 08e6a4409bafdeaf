//! # Servidor TCP Concurrente
//! src/server/tcp.rs
//!
//! Arma el servidor completo: un dispatcher que acepta, una cola acotada y
//! un pool fijo de workers. Cada conexión atiende un solo request.
//!
//! ## Apagado
//!
//! 1. Se activa el flag (señal, `Shutdown::trigger` o error fatal)
//! 2. El dispatcher deja de aceptar y cierra el socket de escucha
//! 3. Se encola un `Stop` por worker y se espera a que terminen
//! 4. Se vacía el buffer del audit log

use crate::audit::AuditLog;
use crate::config::Config;
use crate::error::{Result, ServerError};
use crate::files::FileStore;
use crate::server::context::ServerContext;
use crate::server::dispatcher::Dispatcher;
use crate::server::shutdown::Shutdown;
use crate::server::worker::WorkerPool;
use std::io;
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use tracing::{error, info};

/// Servidor HTTP/1.1 de archivos
pub struct Server {
    config: Config,
    context: Arc<ServerContext>,
    listener: Option<TcpListener>,
}

impl Server {
    /// Valida la configuración y abre (truncando) el audit log si se pidió
    pub fn new(config: Config) -> Result<Self> {
        config.validate().map_err(ServerError::Config)?;

        let audit = match &config.logfile {
            Some(path) => AuditLog::open(path).map_err(|source| ServerError::LogFile {
                path: path.clone(),
                source,
            })?,
            None => AuditLog::disabled(),
        };

        Ok(Self::with_audit_log(config, audit))
    }

    /// Como `new`, con un audit log ya construido y sin validar
    pub fn with_audit_log(config: Config, audit: AuditLog) -> Self {
        let context = ServerContext::new(
            config.queue_capacity(),
            FileStore::new(&config.root),
            audit,
            Shutdown::new(),
        );

        Self {
            config,
            context: Arc::new(context),
            listener: None,
        }
    }

    /// Handle para pedir el apagado desde otro thread o desde señales
    pub fn shutdown_handle(&self) -> Shutdown {
        self.context.shutdown().clone()
    }

    /// Abre el socket de escucha y retorna la dirección real
    ///
    /// Con puerto 0 el sistema elige uno libre.
    pub fn bind(&mut self) -> Result<SocketAddr> {
        let listener = self.open_listener()?;
        let addr = listener.local_addr()?;
        self.listener = Some(listener);
        Ok(addr)
    }

    fn open_listener(&self) -> Result<TcpListener> {
        let address = self.config.address();
        TcpListener::bind(&address).map_err(|source| ServerError::Bind { address, source })
    }

    /// Corre hasta que se pida el apagado
    ///
    /// Retorna el primer error fatal: accept fallido fuera del apagado o
    /// un audit log que dejó de aceptar escrituras.
    pub fn run(&mut self) -> Result<()> {
        let listener = match self.listener.take() {
            Some(listener) => listener,
            None => self.open_listener()?,
        };
        let addr = listener.local_addr()?;

        let workers = WorkerPool::spawn(self.config.threads, &self.context)?;

        let dispatcher = match Dispatcher::new(listener, Arc::clone(&self.context), self.config.io_timeout())
            .and_then(Dispatcher::spawn)
        {
            Ok(handle) => handle,
            Err(e) => {
                workers.shutdown();
                return Err(ServerError::Spawn(e));
            }
        };

        info!(address = %addr, threads = self.config.threads, "Servidor escuchando");

        let dispatched = dispatcher.join().unwrap_or_else(|_| {
            Err(ServerError::Io(io::Error::new(
                io::ErrorKind::Other,
                "dispatcher thread panicked",
            )))
        });

        // Si el dispatcher cayó por su cuenta, el resto también se detiene
        self.context.shutdown().trigger();
        workers.shutdown();

        let flushed = self.context.audit.flush();
        info!("Servidor detenido");

        dispatched?;
        if let Some(failure) = self.context.take_failure() {
            return Err(failure);
        }
        flushed.map_err(|e| {
            error!(error = %e, "No se pudo vaciar el audit log");
            ServerError::AuditLog(e)
        })
    }
}
