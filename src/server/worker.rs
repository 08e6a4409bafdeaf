//! # Pool de Workers
//! src/server/worker.rs
//!
//! N threads que sacan conexiones de la cola y atienden exactamente un
//! request por conexión: parsear, ejecutar el handler, responder, escribir
//! la línea de audit y cerrar.
//!
//! Un worker solo termina al sacar `Task::Stop`. Así las conexiones que ya
//! estaban encoladas antes del apagado se atienden igual.

use crate::error::ServerError;
use crate::http::{RequestParser, Response};
use crate::server::context::{ServerContext, Task};
use std::io::{Read, Write};
use std::net::{Shutdown as NetShutdown, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Tiempo máximo esperando que el cliente cierre su lado
const LINGER_TIMEOUT: Duration = Duration::from_millis(200);

/// Bytes sobrantes que se descartan antes de cerrar de todas formas
const LINGER_LIMIT: u64 = 64 * 1024;

pub struct WorkerPool {
    context: Arc<ServerContext>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Lanza `size` workers sobre el contexto compartido
    ///
    /// Si falla la creación de algún thread, detiene los ya lanzados.
    pub fn spawn(size: usize, context: &Arc<ServerContext>) -> Result<Self, ServerError> {
        let mut pool = Self {
            context: Arc::clone(context),
            handles: Vec::with_capacity(size),
        };

        for id in 0..size {
            let ctx = Arc::clone(context);
            let spawned = thread::Builder::new()
                .name(format!("worker-{}", id))
                .spawn(move || worker_loop(id, ctx));

            match spawned {
                Ok(handle) => pool.handles.push(handle),
                Err(e) => {
                    pool.shutdown();
                    return Err(ServerError::Spawn(e));
                }
            }
        }

        info!(workers = size, "Workers iniciados");
        Ok(pool)
    }

    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Encola un `Stop` por worker
    ///
    /// Van detrás de cualquier conexión pendiente, que se atiende primero.
    pub fn stop(&self) {
        for _ in 0..self.handles.len() {
            self.context.queue.push(Task::Stop);
        }
    }

    /// Espera a que terminen todos los workers
    pub fn join(self) {
        for handle in self.handles {
            let name = handle.thread().name().unwrap_or("worker").to_string();
            if handle.join().is_err() {
                error!(worker = %name, "Worker terminó con panic");
            }
        }
    }

    /// `stop` + `join`
    pub fn shutdown(self) {
        self.stop();
        self.join();
    }
}

fn worker_loop(id: usize, context: Arc<ServerContext>) {
    debug!(worker = id, "Worker esperando conexiones");

    loop {
        match context.queue.pop() {
            Task::Stop => break,
            Task::Connection(mut stream) => {
                let peer = stream
                    .peer_addr()
                    .map(|addr| addr.to_string())
                    .unwrap_or_else(|_| "unknown".to_string());
                handle_connection(&context, &mut stream, &peer);
                close(stream);
            }
        }
    }

    debug!(worker = id, "Worker detenido");
}

/// Atiende un único request sobre `stream`
pub(crate) fn handle_connection<S: Read + Write>(context: &ServerContext, stream: &mut S, peer: &str) {
    let request = match RequestParser::new(&mut *stream).parse() {
        Ok(request) => request,
        Err(e) => {
            let status = e.status();
            warn!(peer, error = %e, status = status.as_u16(), "Request inválido");
            // 400 y 501 no generan línea de audit
            debug_assert!(!status.is_auditable());
            send(stream, Response::error(status), peer);
            return;
        }
    };

    // Handler + línea de audit, atómicos respecto de los demás workers. El
    // envío queda afuera: un cliente que no lee solo frena a este worker.
    let response = {
        let _guard = context.lock_handlers();
        let response = context.files.respond(&request);

        if let Err(e) = context.audit.record(
            request.method().as_str(),
            request.uri(),
            response.status(),
            request.request_id(),
        ) {
            error!(error = %e, "No se pudo escribir el audit log; deteniendo el servidor");
            context.fail(ServerError::AuditLog(e));
        }
        response
    };

    let status = response.status();
    send(stream, response, peer);

    info!(
        peer,
        method = request.method().as_str(),
        uri = request.uri(),
        status = status.as_u16(),
        request_id = request.request_id(),
        "Request atendido"
    );
}

/// Cierra la conexión sin perder la respuesta ya escrita
///
/// Cerrar un socket con bytes sin leer manda un RST que puede descartar la
/// respuesta en el cliente. Se envía FIN y se drena lo que quede.
fn close(mut stream: TcpStream) {
    if stream.shutdown(NetShutdown::Write).is_err() {
        return;
    }
    if stream.set_read_timeout(Some(LINGER_TIMEOUT)).is_ok() {
        let _ = std::io::copy(&mut (&mut stream).take(LINGER_LIMIT), &mut std::io::sink());
    }
}

/// Si el cliente ya se fue, la respuesta se pierde y no pasa nada más
fn send<W: Write>(stream: &mut W, response: Response, peer: &str) {
    if let Err(e) = response.write_to(stream) {
        debug!(peer, error = %e, "No se pudo enviar la respuesta");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditLog;
    use crate::files::FileStore;
    use crate::server::shutdown::Shutdown;
    use std::fs;
    use std::io;
    use std::net::TcpListener;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use std::time::Instant;

    #[derive(Clone, Default)]
    struct SharedSink(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }
    }

    fn temp_root(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("file_server_worker_{}_{}", tag, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn context(root: &Path, audit: AuditLog) -> Arc<ServerContext> {
        Arc::new(ServerContext::new(4, FileStore::new(root), audit, Shutdown::new()))
    }

    /// Envía `raw` a un worker conectado por TCP y devuelve la respuesta
    fn exchange(ctx: &Arc<ServerContext>, raw: &[u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().unwrap();

        let t = thread::spawn({
            let ctx = Arc::clone(ctx);
            move || {
                let (mut stream, peer) = listener.accept().unwrap();
                handle_connection(&ctx, &mut stream, &peer.to_string());
            }
        });

        let mut client = TcpStream::connect(addr).unwrap();
        client.write_all(raw).unwrap();
        client.shutdown(NetShutdown::Write).unwrap();

        let mut buf = Vec::new();
        client.read_to_end(&mut buf).unwrap();
        t.join().unwrap();
        String::from_utf8_lossy(&buf).into_owned()
    }

    #[test]
    fn test_put_then_get() {
        let root = temp_root("put_get");
        let sink = SharedSink::default();
        let ctx = context(&root, AuditLog::new(Box::new(sink.clone())));

        let text = exchange(&ctx, b"PUT /a.txt HTTP/1.1\r\nContent-Length: 5\r\nRequest-Id: 7\r\n\r\nhello");
        assert!(text.starts_with("HTTP/1.1 201 Created\r\n"));
        assert_eq!(fs::read(root.join("a.txt")).unwrap(), b"hello");

        let text = exchange(&ctx, b"GET /a.txt HTTP/1.1\r\n\r\n");
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Content-Length: 5\r\n"));
        assert!(text.ends_with("\r\n\r\nhello"));

        ctx.audit.flush().unwrap();
        let log = String::from_utf8(sink.0.lock().unwrap().clone()).unwrap();
        assert_eq!(log, "PUT,a.txt,201,7\nGET,a.txt,200,0\n");

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_parse_errors_not_audited() {
        let root = temp_root("parse_errors");
        let sink = SharedSink::default();
        let ctx = context(&root, AuditLog::new(Box::new(sink.clone())));

        let text = exchange(&ctx, b"DELETE /a.txt HTTP/1.1\r\n\r\n");
        assert!(text.starts_with("HTTP/1.1 501 Not Implemented\r\n"));

        let text = exchange(&ctx, b"GET /../etc HTTP/1.1\r\n\r\n");
        assert!(text.starts_with("HTTP/1.1 400 Bad Request\r\n"));

        ctx.audit.flush().unwrap();
        assert!(sink.0.lock().unwrap().is_empty());

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_missing_file_is_audited() {
        let root = temp_root("missing");
        let sink = SharedSink::default();
        let ctx = context(&root, AuditLog::new(Box::new(sink.clone())));

        let text = exchange(&ctx, b"GET /nope HTTP/1.1\r\nRequest-Id: 3\r\n\r\n");
        assert!(text.starts_with("HTTP/1.1 404 Not Found\r\n"));

        ctx.audit.flush().unwrap();
        let log = String::from_utf8(sink.0.lock().unwrap().clone()).unwrap();
        assert_eq!(log, "GET,nope,404,3\n");

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_stalled_reader_does_not_block_other_requests() {
        let root = temp_root("stalled");
        fs::write(root.join("big"), vec![b'x'; 32 * 1024 * 1024]).unwrap();
        let ctx = context(&root, AuditLog::disabled());

        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().unwrap();
        let stalled = thread::spawn({
            let ctx = Arc::clone(&ctx);
            move || {
                let (mut stream, peer) = listener.accept().unwrap();
                stream.set_write_timeout(Some(Duration::from_secs(5))).unwrap();
                handle_connection(&ctx, &mut stream, &peer.to_string());
            }
        });

        // Pide el archivo grande y nunca lee la respuesta
        let mut slow = TcpStream::connect(addr).unwrap();
        slow.write_all(b"GET /big HTTP/1.1\r\n\r\n").unwrap();
        thread::sleep(Duration::from_millis(200));

        let started = Instant::now();
        let text = exchange(&ctx, b"GET /missing HTTP/1.1\r\n\r\n");
        assert!(text.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(started.elapsed() < Duration::from_secs(2), "{:?}", started.elapsed());

        drop(slow);
        stalled.join().unwrap();
        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_client_gone_before_request() {
        let root = temp_root("gone");
        let ctx = context(&root, AuditLog::disabled());

        let text = exchange(&ctx, b"");
        assert_eq!(text, "HTTP/1.1 400 Bad Request\r\nContent-Length: 12\r\n\r\nBad Request\n");
        assert!(!ctx.shutdown().is_triggered());

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_audit_failure_triggers_shutdown() {
        let root = temp_root("broken_audit");
        fs::write(root.join("big"), vec![b'x'; 16]).unwrap();
        let ctx = context(&root, AuditLog::new(Box::new(BrokenSink)));

        // Suficientes líneas para forzar un flush del buffer
        let line_len = "GET,big,200,0\n".len();
        for _ in 0..(2 * crate::audit::BUFFER_CAPACITY / line_len) {
            exchange(&ctx, b"GET /big HTTP/1.1\r\n\r\n");
            if ctx.shutdown().is_triggered() {
                break;
            }
        }

        assert!(ctx.shutdown().is_triggered());
        assert!(matches!(ctx.take_failure(), Some(ServerError::AuditLog(_))));

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_pool_drains_queue_before_stop() {
        let root = temp_root("pool");
        fs::write(root.join("f"), b"data").unwrap();
        let ctx = context(&root, AuditLog::disabled());

        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().unwrap();

        let clients: Vec<_> = (0..3)
            .map(|_| {
                let mut client = TcpStream::connect(addr).unwrap();
                client.write_all(b"GET /f HTTP/1.1\r\n\r\n").unwrap();
                client
            })
            .collect();

        for _ in 0..3 {
            let (stream, _) = listener.accept().unwrap();
            ctx.queue.push(Task::Connection(stream));
        }

        let pool = WorkerPool::spawn(2, &ctx).unwrap();
        assert_eq!(pool.size(), 2);
        pool.stop();
        pool.join();

        for mut client in clients {
            let mut buf = String::new();
            client.read_to_string(&mut buf).unwrap();
            assert!(buf.starts_with("HTTP/1.1 200 OK\r\n"));
            assert!(buf.ends_with("data"));
        }
        assert!(ctx.queue.is_empty());

        fs::remove_dir_all(&root).unwrap();
    }
}
