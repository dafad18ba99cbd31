//! Error types for the request bridge.
//!
//! # Design
//! Transport failures carry a numeric `ErrorCode` because that number is what
//! ultimately crosses the C boundary as the execute result. The numbering
//! follows the long-established curl result table so scripts written against
//! curl-based bridges keep interpreting codes the same way. A failure may also
//! carry a captured diagnostic, which takes precedence over the generic text
//! when the caller asks for an error message.

use crate::http::Method;

/// Result codes reported by the transport layer. `Ok` is always `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorCode {
    Ok = 0,
    UnsupportedProtocol = 1,
    FailedInit = 2,
    UrlMalformed = 3,
    CouldntResolveHost = 6,
    CouldntConnect = 7,
    WeirdServerReply = 8,
    HttpReturnedError = 22,
    WriteError = 23,
    OutOfMemory = 27,
    OperationTimedOut = 28,
    SslConnectError = 35,
    BadFunctionArgument = 43,
    TooManyRedirects = 47,
    UnknownOption = 48,
    SendError = 55,
    RecvError = 56,
}

impl ErrorCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Generic human-readable text for this code.
    pub fn description(self) -> &'static str {
        match self {
            ErrorCode::Ok => "No error",
            ErrorCode::UnsupportedProtocol => "Unsupported protocol",
            ErrorCode::FailedInit => "Failed initialization",
            ErrorCode::UrlMalformed => "URL using bad/illegal format or missing URL",
            ErrorCode::CouldntResolveHost => "Couldn't resolve host name",
            ErrorCode::CouldntConnect => "Couldn't connect to server",
            ErrorCode::WeirdServerReply => "Weird server reply",
            ErrorCode::HttpReturnedError => "HTTP response code said error",
            ErrorCode::WriteError => "Failed writing received data to application",
            ErrorCode::OutOfMemory => "Out of memory",
            ErrorCode::OperationTimedOut => "Timeout was reached",
            ErrorCode::SslConnectError => "SSL connect error",
            ErrorCode::BadFunctionArgument => "A transport function was given a bad argument",
            ErrorCode::TooManyRedirects => "Number of redirects hit maximum amount",
            ErrorCode::UnknownOption => "An unknown option was passed in",
            ErrorCode::SendError => "Failed sending data to the peer",
            ErrorCode::RecvError => "Failure when receiving data from the peer",
        }
    }

    /// Look up a raw code as received from a caller.
    pub fn from_i32(code: i32) -> Option<Self> {
        const ALL: [ErrorCode; 17] = [
            ErrorCode::Ok,
            ErrorCode::UnsupportedProtocol,
            ErrorCode::FailedInit,
            ErrorCode::UrlMalformed,
            ErrorCode::CouldntResolveHost,
            ErrorCode::CouldntConnect,
            ErrorCode::WeirdServerReply,
            ErrorCode::HttpReturnedError,
            ErrorCode::WriteError,
            ErrorCode::OutOfMemory,
            ErrorCode::OperationTimedOut,
            ErrorCode::SslConnectError,
            ErrorCode::BadFunctionArgument,
            ErrorCode::TooManyRedirects,
            ErrorCode::UnknownOption,
            ErrorCode::SendError,
            ErrorCode::RecvError,
        ];
        ALL.into_iter().find(|c| c.as_i32() == code)
    }
}

/// Generic code-to-text lookup for raw codes, including ones this table
/// does not know.
pub fn describe(code: i32) -> &'static str {
    match ErrorCode::from_i32(code) {
        Some(c) => c.description(),
        None => "Unknown error",
    }
}

/// A failure reported by the transport layer, either while setting an option
/// or while performing the transfer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", message(.code, .detail))]
pub struct TransportError {
    pub code: ErrorCode,
    /// Diagnostic text captured for this specific failure, if any.
    pub detail: Option<String>,
}

fn message<'a>(code: &ErrorCode, detail: &'a Option<String>) -> &'a str {
    detail.as_deref().unwrap_or(code.description())
}

impl TransportError {
    pub fn new(code: ErrorCode) -> Self {
        Self { code, detail: None }
    }

    pub fn with_detail(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self {
            code,
            detail: Some(detail.into()),
        }
    }
}

/// Errors returned by `Request::execute`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecuteError {
    /// The method submits a body but none was supplied. Detected before the
    /// transport is touched.
    #[error("{0} requires a request body")]
    MissingBody(Method),

    /// Option setup, header preparation, or the transfer itself failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}
