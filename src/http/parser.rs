//! # Parser Incremental de Requests HTTP/1.1
//! src/http/parser.rs
//!
//! Lee directamente del socket en bloques de tamaño fijo (sin `BufReader`)
//! y decodifica un request completo o un código de error.
//!
//! ## Máquina de estados
//!
//! ```text
//! StartLine -> Headers -> (Body | Done) -> Done
//!      \__________\__________\________> Err(ParseError)
//! ```
//!
//! ## Delimitadores partidos entre lecturas
//!
//! Un `read()` puede cortar en medio de `\r\n` o `\r\n\r\n`. Después de
//! cada lectura se vuelve a revisar un sufijo de `delim.len() - 1` bytes
//! del bloque anterior (el "carry-over") junto con los bytes nuevos:
//!
//! ```text
//! lectura 1: "GET /a HTTP/1.1\r\n\r"     lectura 2: "\n"
//!                                  ^^^ carry-over (3 bytes)
//! ```

use super::request::{Method, ParsedRequest};
use super::StatusCode;
use std::collections::HashMap;
use std::io::{ErrorKind, Read};
use std::str::FromStr;

/// Tamaño máximo de request line + headers
pub const MAX_HEAD_LEN: usize = 2048;

/// Largo máximo del nombre de archivo (sin el `/` inicial)
pub const MAX_URI_LEN: usize = 20;

/// Bytes pedidos al socket en cada `read()`
const CHUNK_SIZE: usize = 512;

const CRLF: &[u8] = b"\r\n";
const HEAD_END: &[u8] = b"\r\n\r\n";
const HTTP_VERSION: &str = "HTTP/1.1";

/// Errores que pueden ocurrir durante el parsing
///
/// Todos son 400 excepto `UnsupportedMethod` (501).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Se llenó el buffer sin encontrar `\r\n\r\n`
    HeadTooLarge,

    /// El cliente cerró antes de completar el request
    ConnectionClosed,

    /// Error de lectura del socket
    Io(ErrorKind),

    /// No se encontró el triple METHOD URI VERSION
    MalformedRequestLine,

    /// Método bien formado pero no implementado
    UnsupportedMethod(String),

    /// URI sin `/` inicial, con `/` o `\` internos, vacío o demasiado largo
    InvalidUri(String),

    /// Versión distinta de HTTP/1.1
    InvalidHttpVersion(String),

    /// Header sin separador `": "`
    InvalidHeader(String),

    /// Valor no numérico en Content-Length o Request-Id
    InvalidHeaderValue { name: String, value: String },

    /// PUT sin Content-Length
    MissingContentLength,

    /// El body no coincide con Content-Length
    BodyLengthMismatch { expected: usize, received: usize },

    /// GET/HEAD con bytes después de los headers
    UnexpectedBody(usize),
}

impl ParseError {
    /// Código HTTP con el que se responde al cliente
    pub fn status(&self) -> StatusCode {
        match self {
            ParseError::UnsupportedMethod(_) => StatusCode::NotImplemented,
            _ => StatusCode::BadRequest,
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::HeadTooLarge => write!(f, "Request head exceeds {} bytes", MAX_HEAD_LEN),
            ParseError::ConnectionClosed => write!(f, "Connection closed mid-request"),
            ParseError::Io(kind) => write!(f, "Read error: {}", kind),
            ParseError::MalformedRequestLine => write!(f, "Invalid request line format"),
            ParseError::UnsupportedMethod(m) => write!(f, "Unsupported HTTP method: {}", m),
            ParseError::InvalidUri(u) => write!(f, "Invalid URI: {}", u),
            ParseError::InvalidHttpVersion(v) => write!(f, "Invalid HTTP version: {}", v),
            ParseError::InvalidHeader(h) => write!(f, "Invalid header: {}", h),
            ParseError::InvalidHeaderValue { name, value } => {
                write!(f, "Invalid value for {}: {}", name, value)
            }
            ParseError::MissingContentLength => write!(f, "PUT without Content-Length"),
            ParseError::BodyLengthMismatch { expected, received } => write!(
                f,
                "Body length mismatch: expected {} bytes, received {}",
                expected, received
            ),
            ParseError::UnexpectedBody(n) => write!(f, "Unexpected {} body bytes", n),
        }
    }
}

impl std::error::Error for ParseError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    StartLine,
    Headers,
    Body,
    Done,
}

/// Busca `delim` en `buffer[from..]`, retornando la posición absoluta
///
/// `carry` son los bytes ya revisados en la pasada anterior que se vuelven
/// a incluir porque podrían ser el prefijo de un delimitador partido.
fn scan(buffer: &[u8], delim: &[u8], from: usize, carry: usize) -> Option<usize> {
    let start = from - carry;
    buffer[start..]
        .windows(delim.len())
        .position(|window| window == delim)
        .map(|pos| start + pos)
}

/// Entero decimal sin signo: solo dígitos ASCII, al menos uno
fn parse_decimal<T: FromStr>(value: &str) -> Option<T> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

/// Parser incremental de un único request
///
/// # Ejemplo
/// ```
/// use file_server::http::{Method, RequestParser};
///
/// let raw: &[u8] = b"PUT /notes.txt HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello";
/// let request = RequestParser::new(raw).parse().unwrap();
///
/// assert_eq!(request.method(), Method::PUT);
/// assert_eq!(request.uri(), "notes.txt");
/// assert_eq!(request.body(), Some(&b"hello"[..]));
/// ```
pub struct RequestParser<R> {
    reader: R,

    /// Bytes leídos del socket (como máximo `MAX_HEAD_LEN` durante los headers)
    buffer: Vec<u8>,

    /// Inicio de los bytes todavía no consumidos
    cursor: usize,

    state: State,

    method: Option<Method>,
    uri: String,
    headers: HashMap<String, String>,
    content_length: Option<usize>,
    request_id: u64,
    body: Option<Vec<u8>>,
}

impl<R: Read> RequestParser<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: Vec::with_capacity(MAX_HEAD_LEN),
            cursor: 0,
            state: State::StartLine,
            method: None,
            uri: String::new(),
            headers: HashMap::new(),
            content_length: None,
            request_id: 0,
            body: None,
        }
    }

    /// Consume el request completo
    ///
    /// En caso de error el llamador no debe invocar ningún handler: debe
    /// responder con `err.status()` y cerrar la conexión.
    pub fn parse(mut self) -> Result<ParsedRequest, ParseError> {
        loop {
            self.state = match self.state {
                State::StartLine => self.parse_start_line()?,
                State::Headers => self.parse_headers()?,
                State::Body => self.read_body()?,
                State::Done => return self.finish(),
            };
        }
    }

    /// Lee un bloque más del socket al final del buffer
    fn read_chunk(&mut self) -> Result<(), ParseError> {
        let room = MAX_HEAD_LEN - self.buffer.len();
        if room == 0 {
            return Err(ParseError::HeadTooLarge);
        }

        let mut chunk = [0u8; CHUNK_SIZE];
        let want = room.min(CHUNK_SIZE);
        loop {
            match self.reader.read(&mut chunk[..want]) {
                Ok(0) => return Err(ParseError::ConnectionClosed),
                Ok(n) => {
                    self.buffer.extend_from_slice(&chunk[..n]);
                    return Ok(());
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(ParseError::Io(e.kind())),
            }
        }
    }

    /// Lee hasta que `delim` aparezca después del cursor
    ///
    /// Retorna la posición absoluta del delimitador en el buffer. Si el
    /// delimitador ya estaba en el buffer no se lee nada del socket.
    fn fill_until(&mut self, delim: &[u8]) -> Result<usize, ParseError> {
        let mut scanned = self.cursor;
        let mut carry = 0;
        loop {
            if let Some(pos) = scan(&self.buffer, delim, scanned, carry) {
                return Ok(pos);
            }

            // Lo que quedó sin revisar al final podría ser el inicio del delimitador
            carry = (delim.len() - 1).min(self.buffer.len() - self.cursor);
            scanned = self.buffer.len();
            self.read_chunk()?;
        }
    }

    /// `METHOD SP /name SP HTTP/1.1`
    fn parse_start_line(&mut self) -> Result<State, ParseError> {
        // El bloque completo de headers tiene que caber en el buffer
        self.fill_until(HEAD_END)?;
        let line_end = self.fill_until(CRLF)?;

        let line = std::str::from_utf8(&self.buffer[..line_end])
            .map_err(|_| ParseError::MalformedRequestLine)?;

        let mut parts = line.splitn(3, ' ');
        let (method, uri, version) = match (parts.next(), parts.next(), parts.next()) {
            (Some(m), Some(u), Some(v)) if !m.is_empty() && !u.is_empty() && !v.is_empty() => {
                (m, u, v)
            }
            _ => return Err(ParseError::MalformedRequestLine),
        };

        let method = Method::from_token(method)
            .ok_or_else(|| ParseError::UnsupportedMethod(method.to_string()))?;

        let name = uri
            .strip_prefix('/')
            .filter(|name| {
                !name.is_empty()
                    && !name.contains(|c| c == '/' || c == '\\')
                    && name.chars().count() <= MAX_URI_LEN
            })
            .ok_or_else(|| ParseError::InvalidUri(uri.to_string()))?;

        if version != HTTP_VERSION {
            return Err(ParseError::InvalidHttpVersion(version.to_string()));
        }

        self.method = Some(method);
        self.uri = name.to_string();
        self.cursor = line_end + CRLF.len();

        Ok(State::Headers)
    }

    /// Una línea `Name: value` por cada `\r\n`, hasta la línea vacía
    fn parse_headers(&mut self) -> Result<State, ParseError> {
        loop {
            let line_end = self.fill_until(CRLF)?;
            let start = self.cursor;
            self.cursor = line_end + CRLF.len();

            if line_end == start {
                break;
            }

            let line = String::from_utf8_lossy(&self.buffer[start..line_end]).into_owned();
            self.parse_header_line(&line)?;
        }

        let leftover = self.buffer.len() - self.cursor;
        match self.method {
            Some(Method::PUT) => Ok(State::Body),
            _ if leftover > 0 => Err(ParseError::UnexpectedBody(leftover)),
            _ => Ok(State::Done),
        }
    }

    fn parse_header_line(&mut self, line: &str) -> Result<(), ParseError> {
        let (name, value) = line
            .split_once(": ")
            .ok_or_else(|| ParseError::InvalidHeader(line.to_string()))?;

        let invalid = || ParseError::InvalidHeaderValue {
            name: name.to_string(),
            value: value.to_string(),
        };

        // Nombres sensibles a mayúsculas
        match name {
            "Content-Length" => {
                self.content_length = Some(parse_decimal(value).ok_or_else(invalid)?);
            }
            "Request-Id" | "RequestID" => {
                self.request_id = parse_decimal(value).ok_or_else(invalid)?;
            }
            _ => {}
        }

        self.headers.insert(name.to_string(), value.to_string());
        Ok(())
    }

    /// Solo para PUT: exactamente `Content-Length` bytes
    fn read_body(&mut self) -> Result<State, ParseError> {
        let expected = self.content_length.ok_or(ParseError::MissingContentLength)?;

        let buffered = &self.buffer[self.cursor..];
        if buffered.len() > expected {
            return Err(ParseError::BodyLengthMismatch {
                expected,
                received: buffered.len(),
            });
        }

        let mut body = buffered.to_vec();
        let remaining = (expected - body.len()) as u64;
        (&mut self.reader)
            .take(remaining)
            .read_to_end(&mut body)
            .map_err(|e| ParseError::Io(e.kind()))?;

        if body.len() != expected {
            return Err(ParseError::BodyLengthMismatch {
                expected,
                received: body.len(),
            });
        }

        self.cursor = self.buffer.len();
        self.body = Some(body);
        Ok(State::Done)
    }

    fn finish(self) -> Result<ParsedRequest, ParseError> {
        let method = self.method.ok_or(ParseError::MalformedRequestLine)?;
        Ok(ParsedRequest {
            method,
            uri: self.uri,
            headers: self.headers,
            content_length: self.content_length,
            request_id: self.request_id,
            body: self.body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    /// Entrega los datos en bloques de `chunk` bytes, como un socket lento
    struct ChunkedReader<'a> {
        data: &'a [u8],
        chunk: usize,
    }

    impl Read for ChunkedReader<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.chunk.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    /// Falla siempre con el error indicado
    struct FailingReader(ErrorKind);

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::from(self.0))
        }
    }

    fn parse(raw: &[u8]) -> Result<ParsedRequest, ParseError> {
        RequestParser::new(raw).parse()
    }

    fn parse_chunked(raw: &[u8], chunk: usize) -> Result<ParsedRequest, ParseError> {
        RequestParser::new(ChunkedReader { data: raw, chunk }).parse()
    }

    #[test]
    fn test_parse_simple_get() {
        let request = parse(b"GET /hello.txt HTTP/1.1\r\n\r\n").unwrap();

        assert_eq!(request.method(), Method::GET);
        assert_eq!(request.uri(), "hello.txt");
        assert_eq!(request.content_length(), None);
        assert_eq!(request.request_id(), 0);
        assert!(request.body().is_none());
    }

    #[test]
    fn test_parse_head_with_headers() {
        let raw = b"HEAD /a HTTP/1.1\r\nHost: localhost:8080\r\nRequest-Id: 7\r\n\r\n";
        let request = parse(raw).unwrap();

        assert_eq!(request.method(), Method::HEAD);
        assert_eq!(request.header("Host"), Some("localhost:8080"));
        assert_eq!(request.request_id(), 7);
    }

    #[test]
    fn test_request_id_alias() {
        let request = parse(b"GET /a HTTP/1.1\r\nRequestID: 42\r\n\r\n").unwrap();
        assert_eq!(request.request_id(), 42);
    }

    #[test]
    fn test_duplicate_header_last_wins() {
        let raw = b"GET /a HTTP/1.1\r\nX-Test: one\r\nX-Test: two\r\nRequest-Id: 1\r\nRequest-Id: 2\r\n\r\n";
        let request = parse(raw).unwrap();
        assert_eq!(request.header("X-Test"), Some("two"));
        assert_eq!(request.request_id(), 2);
    }

    #[test]
    fn test_header_names_case_sensitive() {
        // "content-length" no se reconoce, así que el PUT no tiene largo
        let raw = b"PUT /a HTTP/1.1\r\ncontent-length: 3\r\n\r\nabc";
        assert_eq!(parse(raw).unwrap_err(), ParseError::MissingContentLength);
    }

    #[test]
    fn test_parse_put_with_body() {
        let raw = b"PUT /f.txt HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello";
        let request = parse(raw).unwrap();

        assert_eq!(request.method(), Method::PUT);
        assert_eq!(request.content_length(), Some(5));
        assert_eq!(request.body(), Some(&b"hello"[..]));
    }

    #[test]
    fn test_parse_put_empty_body() {
        let request = parse(b"PUT /empty HTTP/1.1\r\nContent-Length: 0\r\n\r\n").unwrap();
        assert_eq!(request.body(), Some(&b""[..]));
    }

    #[test]
    fn test_put_body_larger_than_head_buffer() {
        let body = vec![b'x'; 10 * MAX_HEAD_LEN];
        let mut raw = format!("PUT /big HTTP/1.1\r\nContent-Length: {}\r\n\r\n", body.len()).into_bytes();
        raw.extend_from_slice(&body);

        let request = parse_chunked(&raw, 700).unwrap();
        assert_eq!(request.body().map(|b| b.len()), Some(body.len()));
    }

    #[test]
    fn test_delimiters_split_across_every_chunk_size() {
        let raw = b"PUT /f.txt HTTP/1.1\r\nContent-Length: 5\r\nRequest-Id: 9\r\n\r\nhello";
        for chunk in 1..=raw.len() {
            let request = parse_chunked(raw, chunk)
                .unwrap_or_else(|e| panic!("chunk size {}: {}", chunk, e));
            assert_eq!(request.uri(), "f.txt");
            assert_eq!(request.request_id(), 9);
            assert_eq!(request.body(), Some(&b"hello"[..]));
        }
    }

    #[test]
    fn test_scan_uses_carry_over() {
        let buffer = b"abc\r\n\r\ndef";
        // Primera pasada vio "abc\r\n\r" (6 bytes) sin encontrar el delimitador
        assert_eq!(scan(&buffer[..6], HEAD_END, 0, 0), None);
        // Sin carry-over el delimitador partido se pierde
        assert_eq!(scan(buffer, HEAD_END, 6, 0), None);
        // Con carry-over de 3 bytes aparece en la posición 3
        assert_eq!(scan(buffer, HEAD_END, 6, 3), Some(3));
    }

    #[test]
    fn test_body_too_short() {
        let raw = b"PUT /f.txt HTTP/1.1\r\nContent-Length: 5\r\n\r\nhel";
        assert_eq!(
            parse(raw).unwrap_err(),
            ParseError::BodyLengthMismatch { expected: 5, received: 3 }
        );
        assert_eq!(parse(raw).unwrap_err().status(), StatusCode::BadRequest);
    }

    #[test]
    fn test_body_too_long() {
        let raw = b"PUT /f.txt HTTP/1.1\r\nContent-Length: 2\r\n\r\nhello";
        assert!(matches!(
            parse(raw),
            Err(ParseError::BodyLengthMismatch { expected: 2, received: 5 })
        ));
    }

    #[test]
    fn test_put_without_content_length() {
        let raw = b"PUT /f.txt HTTP/1.1\r\n\r\n";
        assert_eq!(parse(raw).unwrap_err(), ParseError::MissingContentLength);
    }

    #[test]
    fn test_get_with_trailing_bytes() {
        let raw = b"GET /f.txt HTTP/1.1\r\n\r\nextra";
        assert_eq!(parse(raw).unwrap_err(), ParseError::UnexpectedBody(5));
    }

    #[test]
    fn test_unsupported_method_is_501() {
        let err = parse(b"DELETE /x HTTP/1.1\r\n\r\n").unwrap_err();
        assert_eq!(err, ParseError::UnsupportedMethod("DELETE".to_string()));
        assert_eq!(err.status(), StatusCode::NotImplemented);
    }

    #[test]
    fn test_lowercase_method_is_501() {
        let err = parse(b"get /x HTTP/1.1\r\n\r\n").unwrap_err();
        assert_eq!(err.status(), StatusCode::NotImplemented);
    }

    #[test]
    fn test_missing_version() {
        assert_eq!(
            parse(b"GET /x\r\n\r\n").unwrap_err(),
            ParseError::MalformedRequestLine
        );
    }

    #[test]
    fn test_invalid_version() {
        let err = parse(b"GET /x HTTP/1.0\r\n\r\n").unwrap_err();
        assert!(matches!(err, ParseError::InvalidHttpVersion(_)));
        assert_eq!(err.status(), StatusCode::BadRequest);
    }

    #[test]
    fn test_uri_rejections() {
        let long = format!("GET /{} HTTP/1.1\r\n\r\n", "a".repeat(MAX_URI_LEN + 1));
        let cases: Vec<&[u8]> = vec![
            b"GET /a/b HTTP/1.1\r\n\r\n",
            b"GET /a\\b HTTP/1.1\r\n\r\n",
            b"GET a HTTP/1.1\r\n\r\n",
            b"GET / HTTP/1.1\r\n\r\n",
            long.as_bytes(),
        ];
        for raw in cases {
            let err = parse(raw).unwrap_err();
            assert!(matches!(err, ParseError::InvalidUri(_)), "{:?}", err);
            assert_eq!(err.status(), StatusCode::BadRequest);
        }
    }

    #[test]
    fn test_uri_at_max_length() {
        let name = "b".repeat(MAX_URI_LEN);
        let raw = format!("GET /{} HTTP/1.1\r\n\r\n", name);
        assert_eq!(parse(raw.as_bytes()).unwrap().uri(), name);
    }

    #[test]
    fn test_header_without_separator() {
        let err = parse(b"GET /a HTTP/1.1\r\nBroken-Header\r\n\r\n").unwrap_err();
        assert_eq!(err, ParseError::InvalidHeader("Broken-Header".to_string()));
    }

    #[test]
    fn test_non_numeric_content_length() {
        let err = parse(b"PUT /a HTTP/1.1\r\nContent-Length: abc\r\n\r\n").unwrap_err();
        assert!(matches!(err, ParseError::InvalidHeaderValue { .. }));
    }

    #[test]
    fn test_negative_content_length() {
        let err = parse(b"PUT /a HTTP/1.1\r\nContent-Length: -1\r\n\r\n").unwrap_err();
        assert!(matches!(err, ParseError::InvalidHeaderValue { .. }));
    }

    #[test]
    fn test_signed_numeric_headers() {
        for raw in [
            &b"PUT /a HTTP/1.1\r\nContent-Length: +5\r\n\r\nhello"[..],
            &b"GET /a HTTP/1.1\r\nRequest-Id: +7\r\n\r\n"[..],
            &b"GET /a HTTP/1.1\r\nRequest-Id: \r\n\r\n"[..],
        ] {
            let err = parse(raw).unwrap_err();
            assert!(matches!(err, ParseError::InvalidHeaderValue { .. }), "{:?}", err);
            assert_eq!(err.status(), StatusCode::BadRequest);
        }
    }

    #[test]
    fn test_non_numeric_request_id() {
        let err = parse(b"GET /a HTTP/1.1\r\nRequest-Id: x1\r\n\r\n").unwrap_err();
        assert_eq!(err.status(), StatusCode::BadRequest);
    }

    #[test]
    fn test_head_too_large() {
        let mut raw = b"GET /a HTTP/1.1\r\n".to_vec();
        while raw.len() <= MAX_HEAD_LEN {
            raw.extend_from_slice(b"X-Filler: aaaaaaaaaaaaaaaaaaaaaaaa\r\n");
        }
        raw.extend_from_slice(b"\r\n");
        assert_eq!(parse(&raw).unwrap_err(), ParseError::HeadTooLarge);
    }

    #[test]
    fn test_connection_closed_before_head_end() {
        assert_eq!(
            parse(b"GET /a HTTP/1.1\r\n").unwrap_err(),
            ParseError::ConnectionClosed
        );
        assert_eq!(parse(b"").unwrap_err(), ParseError::ConnectionClosed);
    }

    #[test]
    fn test_read_error_is_400() {
        let err = RequestParser::new(FailingReader(ErrorKind::ConnectionReset))
            .parse()
            .unwrap_err();
        assert_eq!(err, ParseError::Io(ErrorKind::ConnectionReset));
        assert_eq!(err.status(), StatusCode::BadRequest);
    }

    #[test]
    fn test_read_timeout_is_bad_request() {
        // Un socket con timeout vencido reporta WouldBlock o TimedOut según la plataforma
        for kind in [ErrorKind::WouldBlock, ErrorKind::TimedOut] {
            let err = RequestParser::new(FailingReader(kind)).parse().unwrap_err();
            assert_eq!(err, ParseError::Io(kind));
            assert_eq!(err.status(), StatusCode::BadRequest);
        }
    }

    #[test]
    fn test_garbage_request_line() {
        let err = parse(b"\x00\x01\x02\x03garbage\r\n\r\n").unwrap_err();
        assert_eq!(err.status(), StatusCode::BadRequest);
    }
}
