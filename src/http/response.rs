//! # Construcción de Respuestas HTTP
//! src/http/response.rs
//!
//! API para construir respuestas HTTP/1.1 y escribirlas en el socket.
//!
//! ## Formato de una respuesta
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Content-Length: 3\r\n
//! \r\n
//! OK\n
//! ```
//!
//! ## Ejemplo de uso
//!
//! ```
//! use file_server::http::{Response, StatusCode};
//!
//! let response = Response::canned(StatusCode::NotFound);
//! let bytes = response.to_bytes();
//! assert_eq!(bytes, b"HTTP/1.1 404 Not Found\r\nContent-Length: 10\r\n\r\nNot Found\n");
//! ```

use super::StatusCode;
use std::fs::File;
use std::io::{self, Read, Write};

/// Cuerpo de la respuesta
#[derive(Debug)]
pub enum Body {
    /// Sin bytes después de los headers (HEAD)
    Empty,

    /// Bytes en memoria
    Bytes(Vec<u8>),

    /// Archivo abierto que se copia al socket al escribir la respuesta
    File { file: File, len: u64 },
}

/// Representa una respuesta HTTP/1.1 completa
#[derive(Debug)]
pub struct Response {
    status: StatusCode,

    /// Headers en orden de inserción
    headers: Vec<(String, String)>,

    body: Body,
}

impl Response {
    /// Crea una nueva respuesta sin headers ni body
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Body::Empty,
        }
    }

    /// Respuesta estándar cuyo body es la reason phrase más `\n`
    ///
    /// Se usa para todos los errores y para el resultado de un PUT.
    pub fn canned(status: StatusCode) -> Self {
        Self::new(status).with_body(&format!("{}\n", status.reason_phrase()))
    }

    /// Alias de `canned` para respuestas de error
    pub fn error(status: StatusCode) -> Self {
        Self::canned(status)
    }

    /// Agrega un header a la respuesta (si ya existe, se sobrescribe)
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.add_header(name, value);
        self
    }

    /// Versión mutable de `with_header`
    pub fn add_header(&mut self, name: &str, value: &str) {
        match self.headers.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
    }

    /// Establece el body desde un string y calcula `Content-Length`
    pub fn with_body(self, body: &str) -> Self {
        self.with_body_bytes(body.as_bytes().to_vec())
    }

    /// Establece el body desde bytes y calcula `Content-Length`
    pub fn with_body_bytes(mut self, body: Vec<u8>) -> Self {
        self.add_header("Content-Length", &body.len().to_string());
        self.body = Body::Bytes(body);
        self
    }

    /// Body servido directamente desde un archivo de `len` bytes
    pub fn with_file(mut self, file: File, len: u64) -> Self {
        self.add_header("Content-Length", &len.to_string());
        self.body = Body::File { file, len };
        self
    }

    /// Solo anuncia `Content-Length` sin enviar body (HEAD)
    pub fn with_content_length(mut self, len: u64) -> Self {
        self.add_header("Content-Length", &len.to_string());
        self.body = Body::Empty;
        self
    }

    /// Status line, headers y línea vacía
    pub fn head_bytes(&self) -> Vec<u8> {
        let mut result = format!("HTTP/1.1 {}\r\n", self.status).into_bytes();
        for (name, value) in &self.headers {
            result.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
        }
        result.extend_from_slice(b"\r\n");
        result
    }

    /// Convierte la respuesta a bytes (los bodies de archivo no se incluyen)
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = self.head_bytes();
        if let Body::Bytes(body) = &self.body {
            result.extend_from_slice(body);
        }
        result
    }

    /// Escribe la respuesta completa en `out`
    ///
    /// Retorna los bytes de body enviados.
    pub fn write_to<W: Write>(self, out: &mut W) -> io::Result<u64> {
        out.write_all(&self.head_bytes())?;
        let sent = match self.body {
            Body::Empty => 0,
            Body::Bytes(body) => {
                out.write_all(&body)?;
                body.len() as u64
            }
            Body::File { file, len } => io::copy(&mut file.take(len), out)?,
        };
        out.flush()?;
        Ok(sent)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Obtiene un header específico
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> &Body {
        &self.body
    }
}
