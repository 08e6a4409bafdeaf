//! # Contexto compartido
//! src/server/context.rs
//!
//! Todo lo que el dispatcher y los workers comparten vive aquí, detrás de
//! un `Arc`: la cola de conexiones, el flag de apagado, el audit log y el
//! lock que serializa handler + audit.

use crate::audit::AuditLog;
use crate::error::ServerError;
use crate::files::FileStore;
use crate::queue::BoundedQueue;
use crate::server::shutdown::Shutdown;
use std::net::TcpStream;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Elementos de la cola de conexiones
#[derive(Debug)]
pub enum Task {
    /// Conexión aceptada, propiedad exclusiva de quien la saque de la cola
    Connection(TcpStream),

    /// Centinela: el worker que lo saca termina su loop
    Stop,
}

pub struct ServerContext {
    pub(crate) queue: BoundedQueue<Task>,
    pub(crate) files: FileStore,
    pub(crate) audit: AuditLog,
    pub(crate) shutdown: Shutdown,

    /// Un solo worker a la vez ejecuta un handler y escribe su línea de audit
    handler_lock: Mutex<()>,

    /// Primer error fatal reportado por un worker
    failure: Mutex<Option<ServerError>>,
}

impl ServerContext {
    pub fn new(queue_capacity: usize, files: FileStore, audit: AuditLog, shutdown: Shutdown) -> Self {
        Self {
            queue: BoundedQueue::new(queue_capacity),
            files,
            audit,
            shutdown,
            handler_lock: Mutex::new(()),
            failure: Mutex::new(None),
        }
    }

    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub(crate) fn lock_handlers(&self) -> MutexGuard<'_, ()> {
        self.handler_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registra un error fatal y pide el apagado
    ///
    /// Solo se conserva el primero; los siguientes suelen ser consecuencia.
    pub(crate) fn fail(&self, error: ServerError) {
        {
            let mut failure = self.failure.lock().unwrap_or_else(PoisonError::into_inner);
            if failure.is_none() {
                *failure = Some(error);
            }
        }
        self.shutdown.trigger();
    }

    pub(crate) fn take_failure(&self) -> Option<ServerError> {
        self.failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}
