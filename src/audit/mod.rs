//! # Audit Log
//! src/audit/mod.rs
//!
//! Registro de los resultados de cada request, una línea por request:
//!
//! ```text
//! GET,hello.txt,200,1
//! PUT,notes.txt,201,2
//! ```
//!
//! Las líneas se acumulan en un buffer en memoria y se escriben al
//! archivo cuando el buffer llegaría a `BUFFER_CAPACITY` bytes o al apagar
//! el servidor. Buffer, contador y archivo viven detrás de un único `Mutex`.

use crate::http::StatusCode;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Bytes acumulados que disparan el flush
pub const BUFFER_CAPACITY: usize = 4096;

struct AuditState {
    /// Destino de las líneas; `None` cuando el log está deshabilitado
    sink: Option<Box<dyn Write + Send>>,

    buffer: Vec<u8>,
}

impl AuditState {
    fn flush(&mut self) -> io::Result<()> {
        if let Some(sink) = self.sink.as_mut() {
            if !self.buffer.is_empty() {
                sink.write_all(&self.buffer)?;
            }
            sink.flush()?;
        }
        self.buffer.clear();
        Ok(())
    }
}

/// Audit log compartido por todos los workers
pub struct AuditLog {
    state: Mutex<AuditState>,
}

impl AuditLog {
    /// Escribe sobre cualquier destino (archivo, `Vec<u8>` en tests, etc.)
    pub fn new(sink: Box<dyn Write + Send>) -> Self {
        Self {
            state: Mutex::new(AuditState {
                sink: Some(sink),
                buffer: Vec::with_capacity(BUFFER_CAPACITY),
            }),
        }
    }

    /// Crea el archivo si no existe y lo trunca si existe
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(Box::new(file)))
    }

    /// Log deshabilitado: `record` no hace nada
    pub fn disabled() -> Self {
        Self {
            state: Mutex::new(AuditState {
                sink: None,
                buffer: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, AuditState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_enabled(&self) -> bool {
        self.lock().sink.is_some()
    }

    /// Registra el resultado de un request
    ///
    /// Solo 200, 201, 404 y 500 generan una línea; el resto se descarta.
    /// Retorna `true` si la línea quedó en el buffer. Un error aquí
    /// significa que el archivo de log ya no acepta escrituras.
    pub fn record(
        &self,
        method: &str,
        uri: &str,
        status: StatusCode,
        request_id: u64,
    ) -> io::Result<bool> {
        if !status.is_auditable() {
            return Ok(false);
        }

        let mut state = self.lock();
        if state.sink.is_none() {
            return Ok(false);
        }

        let line = format_entry(method, uri, status, request_id);
        if state.buffer.len() + line.len() >= BUFFER_CAPACITY {
            state.flush()?;
        }
        state.buffer.extend_from_slice(line.as_bytes());
        Ok(true)
    }

    /// Escribe lo acumulado en el destino
    pub fn flush(&self) -> io::Result<()> {
        self.lock().flush()
    }

    /// Bytes en el buffer que todavía no llegan al destino
    pub fn buffered_len(&self) -> usize {
        self.lock().buffer.len()
    }
}

/// `<METHOD>,<URI>,<STATUS>,<REQUEST-ID>\n`
pub fn format_entry(method: &str, uri: &str, status: StatusCode, request_id: u64) -> String {
    format!("{},{},{},{}\n", method, uri, status.as_u16(), request_id)
}
