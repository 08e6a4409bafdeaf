//! # Handlers de Archivos
//! src/files/mod.rs
//!
//! Implementa GET, HEAD y PUT sobre un directorio raíz. Cada URI ya
//! validado por el parser es un único nombre de archivo dentro de la raíz.
//!
//! | Método   | Resultado                                         |
//! |----------|---------------------------------------------------|
//! | GET      | 200 + contenido, 404 si no existe                 |
//! | HEAD     | 200 + Content-Length del archivo, sin body        |
//! | PUT      | 200 si sobrescribió, 201 si creó                  |
//! | cualquiera sobre un directorio | 403                         |

use crate::http::{Method, ParsedRequest, Response, StatusCode};
use std::fs::{File, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::PathBuf;
use tracing::debug;

/// Servidor de archivos anclado a un directorio
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Despacha según el método del request
    pub fn respond(&self, request: &ParsedRequest) -> Response {
        match request.method() {
            Method::GET => self.get(request.uri(), false),
            Method::HEAD => self.get(request.uri(), true),
            Method::PUT => self.put(request.uri(), request.body().unwrap_or_default()),
        }
    }

    /// GET / HEAD
    pub fn get(&self, name: &str, head_only: bool) -> Response {
        let path = self.root.join(name);

        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "open for read failed");
                return Response::error(read_error_status(&e));
            }
        };

        let metadata = match file.metadata() {
            Ok(metadata) => metadata,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "stat failed");
                return Response::error(StatusCode::InternalServerError);
            }
        };

        // Directorios y archivos especiales no se sirven
        if !metadata.is_file() {
            return Response::error(StatusCode::Forbidden);
        }

        let response = Response::new(StatusCode::Ok);
        if head_only {
            response.with_content_length(metadata.len())
        } else {
            response.with_file(file, metadata.len())
        }
    }

    /// PUT: trunca si existe (200) o crea (201)
    pub fn put(&self, name: &str, body: &[u8]) -> Response {
        let path = self.root.join(name);

        if path.is_dir() {
            return Response::error(StatusCode::Forbidden);
        }

        let (mut file, status) = match OpenOptions::new().write(true).truncate(true).open(&path) {
            Ok(file) => (file, StatusCode::Ok),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                match OpenOptions::new().write(true).create_new(true).open(&path) {
                    Ok(file) => (file, StatusCode::Created),
                    Err(e) => {
                        debug!(path = %path.display(), error = %e, "create failed");
                        return Response::error(write_error_status(&e));
                    }
                }
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "open for write failed");
                return Response::error(write_error_status(&e));
            }
        };

        if let Err(e) = file.write_all(body).and_then(|_| file.flush()) {
            debug!(path = %path.display(), error = %e, "write failed");
            return Response::error(StatusCode::InternalServerError);
        }

        Response::canned(status)
    }
}

fn read_error_status(e: &io::Error) -> StatusCode {
    match e.kind() {
        ErrorKind::NotFound => StatusCode::NotFound,
        ErrorKind::PermissionDenied => StatusCode::Forbidden,
        _ => StatusCode::InternalServerError,
    }
}

fn write_error_status(e: &io::Error) -> StatusCode {
    match e.kind() {
        ErrorKind::PermissionDenied => StatusCode::Forbidden,
        // La raíz desapareció
        ErrorKind::NotFound => StatusCode::NotFound,
        _ => StatusCode::InternalServerError,
    }
}
