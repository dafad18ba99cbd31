//! `Session` implementation on top of `ureq`.
//!
//! # Design
//! `ureq` hands back a whole response object rather than calling out while
//! the transfer runs, so this session re-creates the curl-style callback
//! stream from it: the status line and each header are delivered as raw
//! CRLF-terminated lines, then the body is read in fixed-size chunks and
//! pushed through `write`. A short write aborts the transfer. When verbose,
//! the same data is mirrored to `debug` as trace events.
//!
//! Request header lines follow curl conventions: `Name: value` is sent,
//! `Name:` with nothing after the colon suppresses the header, and a line
//! without a colon is skipped.

use std::fmt::Write as _;
use std::io::{self, Read};
use std::time::Duration;

use ureq::http::{self, Request, Uri};

use crate::error::{ErrorCode, TransportError};
use crate::http::{InfoType, TransferMethod, TransferOption};
use crate::transport::{Session, TransferHandler};

/// Body bytes read from the connection per `write` callback.
pub const READ_CHUNK: usize = 16 * 1024;

/// Redirect hops allowed when following is enabled.
pub const MAX_REDIRECTS: u32 = 10;

#[derive(Debug, Clone)]
pub struct UreqSession {
    url: Option<String>,
    timeout: Duration,
    connect_timeout: Duration,
    follow_location: bool,
    no_body: bool,
    verbose: bool,
    method: TransferMethod,
    body: Option<Vec<u8>>,
    headers: Vec<Vec<u8>>,
    response_code: u16,
}

impl Default for UreqSession {
    fn default() -> Self {
        Self {
            url: None,
            timeout: Duration::ZERO,
            connect_timeout: Duration::ZERO,
            follow_location: false,
            no_body: false,
            verbose: false,
            method: TransferMethod::Get,
            body: None,
            headers: Vec::new(),
            response_code: 0,
        }
    }
}

fn non_zero(d: Duration) -> Option<Duration> {
    (!d.is_zero()).then_some(d)
}

/// Split a raw header line into name and value, or `None` if it should not
/// be sent.
fn parse_request_header(line: &[u8]) -> Option<(&str, &[u8])> {
    let colon = line.iter().position(|&b| b == b':')?;
    let name = std::str::from_utf8(&line[..colon]).ok()?.trim();
    let value = line[colon + 1..].trim_ascii();
    if name.is_empty() || value.is_empty() {
        return None;
    }
    Some((name, value))
}

fn io_code(err: &io::Error) -> ErrorCode {
    match err.kind() {
        io::ErrorKind::TimedOut => ErrorCode::OperationTimedOut,
        io::ErrorKind::ConnectionRefused => ErrorCode::CouldntConnect,
        io::ErrorKind::BrokenPipe | io::ErrorKind::WriteZero => ErrorCode::SendError,
        _ => ErrorCode::RecvError,
    }
}

fn map_ureq_error(err: ureq::Error) -> TransportError {
    let code = match &err {
        ureq::Error::Timeout(_) => ErrorCode::OperationTimedOut,
        ureq::Error::HostNotFound => ErrorCode::CouldntResolveHost,
        ureq::Error::ConnectionFailed => ErrorCode::CouldntConnect,
        ureq::Error::BadUri(_) => ErrorCode::UrlMalformed,
        ureq::Error::TooManyRedirects => ErrorCode::TooManyRedirects,
        ureq::Error::StatusCode(_) => ErrorCode::HttpReturnedError,
        ureq::Error::Http(_) => ErrorCode::BadFunctionArgument,
        ureq::Error::Io(e) => io_code(e),
        _ => ErrorCode::RecvError,
    };
    TransportError::with_detail(code, err.to_string())
}

fn map_http_error(err: http::Error) -> TransportError {
    TransportError::with_detail(ErrorCode::BadFunctionArgument, err.to_string())
}

impl UreqSession {
    fn http_method(&self) -> Result<http::Method, TransportError> {
        if self.no_body {
            return Ok(http::Method::HEAD);
        }
        match &self.method {
            TransferMethod::Get => Ok(http::Method::GET),
            TransferMethod::Post => Ok(http::Method::POST),
            TransferMethod::Put => Ok(http::Method::PUT),
            TransferMethod::Custom(token) => http::Method::from_bytes(token.as_bytes())
                .map_err(|e| TransportError::with_detail(ErrorCode::BadFunctionArgument, e.to_string())),
        }
    }

    fn agent(&self) -> ureq::Agent {
        let redirects = if self.follow_location { MAX_REDIRECTS } else { 0 };
        ureq::Agent::config_builder()
            .http_status_as_error(false)
            .max_redirects(redirects)
            .timeout_global(non_zero(self.timeout))
            .timeout_connect(non_zero(self.connect_timeout))
            .build()
            .new_agent()
    }

    fn request_head(&self, method: &http::Method, uri: &Uri, headers: &[(&str, &[u8])]) -> String {
        let mut head = format!("{method} {} HTTP/1.1\r\n", uri.path_and_query().map_or("/", |p| p.as_str()));
        if let Some(host) = uri.authority() {
            let _ = write!(head, "Host: {host}\r\n");
        }
        for (name, value) in headers {
            let _ = write!(head, "{name}: {}\r\n", String::from_utf8_lossy(value));
        }
        head.push_str("\r\n");
        head
    }
}

impl Session for UreqSession {
    fn global_init() {
        // ureq keeps no process-wide state; the hook is where it would go.
        tracing::info!("ureq transport ready");
    }

    fn open() -> Result<Self, TransportError> {
        Ok(Self::default())
    }

    fn set_option(&mut self, option: TransferOption) -> Result<(), TransportError> {
        match option {
            TransferOption::Url(url) => self.url = Some(url),
            TransferOption::Timeout(d) => self.timeout = d,
            TransferOption::ConnectTimeout(d) => self.connect_timeout = d,
            TransferOption::FollowLocation(on) => self.follow_location = on,
            TransferOption::NoBody(on) => self.no_body = on,
            TransferOption::Verbose(on) => self.verbose = on,
            TransferOption::Method(method) => self.method = method,
            TransferOption::PostFields(body) => self.body = body,
            TransferOption::HttpHeaders(headers) => self.headers = headers,
            // ureq draws no progress meter and manages its own connection pool.
            TransferOption::NoProgress(_) | TransferOption::TcpKeepAlive(_) => {}
        }
        Ok(())
    }

    fn perform(&mut self, handler: &mut dyn TransferHandler) -> Result<(), TransportError> {
        self.response_code = 0;

        let url = self
            .url
            .as_deref()
            .ok_or_else(|| TransportError::with_detail(ErrorCode::UrlMalformed, "No URL set"))?;
        let uri: Uri = url
            .parse()
            .map_err(|e: http::uri::InvalidUri| TransportError::with_detail(ErrorCode::UrlMalformed, e.to_string()))?;
        let method = self.http_method()?;

        let mut sent = Vec::with_capacity(self.headers.len());
        for line in &self.headers {
            match parse_request_header(line) {
                Some(pair) => sent.push(pair),
                None => tracing::debug!(header = %String::from_utf8_lossy(line), "request header not sent"),
            }
        }
        let builder = sent
            .iter()
            .fold(Request::builder().method(method.as_str()).uri(url), |b, (name, value)| {
                b.header(*name, *value)
            });

        let body = if method == http::Method::HEAD { None } else { self.body.clone() };

        if self.verbose {
            handler.debug(InfoType::Text, format!("Requesting {url}\n").as_bytes());
            handler.debug(InfoType::HeaderOut, self.request_head(&method, &uri, &sent).as_bytes());
            if let Some(bytes) = &body {
                handler.debug(InfoType::DataOut, bytes);
            }
        }

        let agent = self.agent();
        let response = match body {
            Some(bytes) => agent.run(builder.body(bytes).map_err(map_http_error)?),
            None => agent.run(builder.body(()).map_err(map_http_error)?),
        }
        .map_err(map_ureq_error)?;

        let (parts, body) = response.into_parts();
        self.response_code = parts.status.as_u16();

        let mut head = vec![format!(
            "{:?} {} {}\r\n",
            parts.version,
            parts.status.as_u16(),
            parts.status.canonical_reason().unwrap_or("")
        )];
        for (name, value) in &parts.headers {
            head.push(format!("{name}: {}\r\n", String::from_utf8_lossy(value.as_bytes())));
        }
        head.push("\r\n".to_string());

        if self.verbose {
            handler.debug(InfoType::HeaderIn, head.concat().as_bytes());
        }
        for line in &head {
            if handler.header(line.as_bytes()) != line.len() {
                return Err(TransportError::with_detail(
                    ErrorCode::WriteError,
                    "Failed writing header",
                ));
            }
        }

        let mut reader = body.into_reader();
        let mut buf = vec![0u8; READ_CHUNK];
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(TransportError::with_detail(io_code(&e), e.to_string())),
            };
            if self.verbose {
                handler.debug(InfoType::DataIn, &buf[..n]);
            }
            if handler.write(&buf[..n]) != n {
                return Err(TransportError::with_detail(
                    ErrorCode::WriteError,
                    "Failure writing output to destination",
                ));
            }
        }

        if self.verbose {
            handler.debug(
                InfoType::Text,
                format!("Completed with status {}\n", self.response_code).as_bytes(),
            );
        }
        Ok(())
    }

    fn response_code(&self) -> u16 {
        self.response_code
    }
}
