//! # Apagado del Servidor
//! src/server/shutdown.rs
//!
//! Flag atómico compartido por el dispatcher, los workers y el thread de
//! señales. Activarlo también despierta al dispatcher, que está bloqueado
//! en `accept`: `trigger` abre una conexión propia contra el listener.

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

const WAKE_TIMEOUT: Duration = Duration::from_secs(1);

/// Handle clonable del flag de apagado
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    flag: Arc<AtomicBool>,

    /// Dirección del listener a la que conectarse para destrabar `accept`
    waker: Arc<Mutex<Option<SocketAddr>>>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// SIGTERM y SIGINT activan el apagado desde un thread dedicado
    pub fn register_signals(&self) -> io::Result<()> {
        use signal_hook::consts::{SIGINT, SIGTERM};
        use signal_hook::iterator::Signals;

        let mut signals = Signals::new([SIGTERM, SIGINT])?;
        let shutdown = self.clone();

        thread::Builder::new()
            .name("signals".to_string())
            .spawn(move || {
                if let Some(signal) = signals.forever().next() {
                    info!(signal, "Señal recibida, deteniendo el servidor");
                    shutdown.trigger();
                }
            })?;
        Ok(())
    }

    /// Pide al servidor que se detenga
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);

        let waker = *self.waker.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(addr) = waker {
            // Solo importa que accept retorne; la conexión se descarta
            if let Err(e) = TcpStream::connect_timeout(&addr, WAKE_TIMEOUT) {
                debug!(%addr, error = %e, "No se pudo despertar al dispatcher");
            }
        }
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Registra el listener que `trigger` debe despertar
    pub(crate) fn set_waker(&self, listening: SocketAddr) {
        *self.waker.lock().unwrap_or_else(PoisonError::into_inner) = Some(wake_address(listening));
    }
}

/// Un listener en 0.0.0.0/:: se alcanza por loopback
fn wake_address(listening: SocketAddr) -> SocketAddr {
    let mut addr = listening;
    if addr.ip().is_unspecified() {
        match addr {
            SocketAddr::V4(_) => addr.set_ip(Ipv4Addr::LOCALHOST.into()),
            SocketAddr::V6(_) => addr.set_ip(Ipv6Addr::LOCALHOST.into()),
        }
    }
    addr
}
