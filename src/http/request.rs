//! # Request HTTP/1.1 parseado
//! src/http/request.rs
//!
//! Resultado de `RequestParser::parse`. Se crea por conexión y se descarta
//! cuando el worker termina de atenderla.

use std::collections::HashMap;

/// Métodos HTTP soportados
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET - Leer un archivo
    GET,

    /// HEAD - Como GET pero solo retorna headers
    HEAD,

    /// PUT - Crear o sobrescribir un archivo
    PUT,
}

impl Method {
    /// Match exacto y sensible a mayúsculas
    ///
    /// Retorna `None` para cualquier otro verbo (el parser lo convierte en 501).
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "GET" => Some(Method::GET),
            "HEAD" => Some(Method::HEAD),
            "PUT" => Some(Method::PUT),
            _ => None,
        }
    }

    /// Convierte el método a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
            Method::PUT => "PUT",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Representa un request HTTP/1.1 completamente decodificado
///
/// `body` existe si y solo si el método es PUT.
#[derive(Debug, Clone)]
pub struct ParsedRequest {
    pub(crate) method: Method,

    /// Nombre del archivo, sin el `/` inicial
    pub(crate) uri: String,

    /// Headers tal cual llegaron (el último duplicado gana)
    pub(crate) headers: HashMap<String, String>,

    /// `None` cuando no vino `Content-Length`
    pub(crate) content_length: Option<usize>,

    /// Valor de `Request-Id` / `RequestID`, 0 si no vino
    pub(crate) request_id: u64,

    pub(crate) body: Option<Vec<u8>>,
}

impl ParsedRequest {
    pub fn method(&self) -> Method {
        self.method
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Obtiene un header específico (match exacto del nombre)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(|s| s.as_str())
    }

    pub fn content_length(&self) -> Option<usize> {
        self.content_length
    }

    pub fn request_id(&self) -> u64 {
        self.request_id
    }

    /// Body del PUT; `None` para GET y HEAD
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }
}
