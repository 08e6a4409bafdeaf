//! # Códigos de Estado HTTP
//! src/http/status.rs
//!
//! Códigos de estado que produce el servidor de archivos:
//!
//! - **2xx**: Éxito (200 OK, 201 Created)
//! - **4xx**: Error del cliente (400, 403, 404)
//! - **5xx**: Error del servidor (500, 501)

/// Representa los códigos de estado HTTP que soporta nuestro servidor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// 200 OK - GET/HEAD exitoso o PUT que sobrescribió un archivo
    Ok = 200,

    /// 201 Created - PUT que creó un archivo nuevo
    Created = 201,

    /// 400 Bad Request - Request malformado
    BadRequest = 400,

    /// 403 Forbidden - Sin permisos o el recurso es un directorio
    Forbidden = 403,

    /// 404 Not Found - El archivo no existe
    NotFound = 404,

    /// 500 Internal Server Error - Error de I/O inesperado
    InternalServerError = 500,

    /// 501 Not Implemented - Método distinto de GET, PUT, HEAD
    NotImplemented = 501,
}

impl StatusCode {
    /// Convierte el código a su valor numérico
    ///
    /// # Ejemplo
    /// ```
    /// use file_server::http::StatusCode;
    /// assert_eq!(StatusCode::Created.as_u16(), 201);
    /// ```
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// Retorna el texto de razón (reason phrase) asociado al código
    ///
    /// # Ejemplo
    /// ```
    /// use file_server::http::StatusCode;
    /// assert_eq!(StatusCode::NotImplemented.reason_phrase(), "Not Implemented");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::Created => "Created",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::NotImplemented => "Not Implemented",
        }
    }

    /// Solo estos resultados quedan en el audit log
    ///
    /// # Ejemplo
    /// ```
    /// use file_server::http::StatusCode;
    /// assert!(StatusCode::NotFound.is_auditable());
    /// assert!(!StatusCode::BadRequest.is_auditable());
    /// ```
    pub fn is_auditable(&self) -> bool {
        matches!(
            self,
            StatusCode::Ok
                | StatusCode::Created
                | StatusCode::NotFound
                | StatusCode::InternalServerError
        )
    }
}

impl std::fmt::Display for StatusCode {
    /// Formato: "200 OK"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}
