//! # Dispatcher
//! src/server/dispatcher.rs
//!
//! Dueño del socket de escucha: acepta conexiones y las encola. Cuando la
//! cola está llena el `push` bloquea, y con eso se frena el `accept`.
//!
//! El `accept` es bloqueante; `Shutdown::trigger` lo destraba conectándose
//! al propio listener. Cada conexión aceptada recibe timeouts de lectura y
//! escritura, para que un cliente inactivo no retenga a un worker para
//! siempre.

use crate::error::ServerError;
use crate::server::context::{ServerContext, Task};
use std::io::{self, ErrorKind};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub struct Dispatcher {
    listener: TcpListener,
    context: Arc<ServerContext>,
    io_timeout: Duration,
}

impl Dispatcher {
    pub fn new(listener: TcpListener, context: Arc<ServerContext>, io_timeout: Duration) -> io::Result<Self> {
        context.shutdown.set_waker(listener.local_addr()?);
        Ok(Self {
            listener,
            context,
            io_timeout,
        })
    }

    /// Lanza el loop de accept en su propio thread
    pub fn spawn(self) -> io::Result<JoinHandle<Result<(), ServerError>>> {
        thread::Builder::new()
            .name("dispatcher".to_string())
            .spawn(move || self.run())
    }

    /// Acepta hasta que se active el apagado
    ///
    /// Al retornar se cierra el socket de escucha.
    pub fn run(self) -> Result<(), ServerError> {
        info!("Dispatcher aceptando conexiones");

        // El waker ya está registrado: un trigger posterior a este chequeo
        // siempre despierta al accept
        while !self.context.shutdown.is_triggered() {
            match self.listener.accept() {
                // Puede ser la conexión de trigger o un cliente tardío
                Ok(_) if self.context.shutdown.is_triggered() => break,
                Ok((stream, peer)) => {
                    if let Err(e) = self.configure(&stream) {
                        warn!(%peer, error = %e, "No se pudo configurar la conexión");
                        continue;
                    }
                    debug!(%peer, queued = self.context.queue_len(), "Conexión aceptada");
                    self.context.queue.push(Task::Connection(stream));
                }
                Err(e)
                    if matches!(
                        e.kind(),
                        ErrorKind::Interrupted | ErrorKind::ConnectionAborted | ErrorKind::ConnectionReset
                    ) =>
                {
                    continue
                }
                Err(_) if self.context.shutdown.is_triggered() => break,
                Err(e) => {
                    error!(error = %e, "Error al aceptar conexión");
                    return Err(ServerError::Accept(e));
                }
            }
        }

        info!("Dispatcher detenido");
        Ok(())
    }

    fn configure(&self, stream: &TcpStream) -> io::Result<()> {
        stream.set_read_timeout(Some(self.io_timeout))?;
        stream.set_write_timeout(Some(self.io_timeout))
    }
}
