//! # Módulo HTTP
//!
//! Implementa el subconjunto de HTTP/1.1 que usa el servidor de archivos,
//! sin librerías de alto nivel:
//!
//! - Parsing incremental de requests directamente desde el socket
//! - Construcción de responses
//! - Códigos de estado
//!
//! ### Formato de Request
//!
//! ```text
//! PUT /notes.txt HTTP/1.1\r\n
//! Content-Length: 5\r\n
//! Request-Id: 12\r\n
//! \r\n
//! hello
//! ```
//!
//! ### Formato de Response
//!
//! ```text
//! HTTP/1.1 201 Created\r\n
//! Content-Length: 8\r\n
//! \r\n
//! Created
//! ```
//!
//! Una conexión lleva exactamente un request: no hay keep-alive,
//! pipelining ni chunked transfer-encoding.

pub mod parser;    // Máquina de estados sobre el socket
pub mod request;   // Request ya decodificado
pub mod response;  // Construcción de HTTP responses
pub mod status;    // Códigos de estado HTTP

pub use parser::{ParseError, RequestParser};
pub use request::{Method, ParsedRequest};
pub use response::{Body, Response};
pub use status::StatusCode;
