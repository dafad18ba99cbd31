//! Plain-data vocabulary shared by the request handle and the transport.
//!
//! # Design
//! The numeric values of `Method` and the option bits are part of the C
//! contract: scripts pass them as bare integers, so they are fixed here and
//! never reordered. `TransferOption` is the one way the request handle talks
//! to a transport session; every variant maps to a single option-setting call
//! that may fail on its own.

use std::fmt;
use std::time::Duration;

/// Request method as selected by the calling script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Method {
    Get = 0,
    Post = 1,
    PostJson = 2,
    PostForm = 3,
    Delete = 4,
    Put = 5,
}

impl Method {
    /// Methods that cannot be executed without a request body.
    pub fn requires_body(self) -> bool {
        matches!(self, Method::PostJson | Method::PostForm)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::PostJson => "POST_JSON",
            Method::PostForm => "POST_FORM",
            Method::Delete => "DELETE",
            Method::Put => "PUT",
        }
    }
}

impl TryFrom<i32> for Method {
    type Error = i32;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Method::Get),
            1 => Ok(Method::Post),
            2 => Ok(Method::PostJson),
            3 => Ok(Method::PostForm),
            4 => Ok(Method::Delete),
            5 => Ok(Method::Put),
            other => Err(other),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bitwise-combinable execute options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecuteOptions(u32);

impl ExecuteOptions {
    pub const NONE: Self = Self(0);
    pub const FOLLOW_REDIRECTS: Self = Self(1);
    pub const NO_BODY: Self = Self(2);
    pub const DEBUG: Self = Self(4);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for ExecuteOptions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for ExecuteOptions {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Method as configured on the transport session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferMethod {
    Get,
    Post,
    Put,
    /// Arbitrary method token sent verbatim on the request line.
    Custom(String),
}

/// One option-setting call on a transport session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOption {
    Url(String),
    /// Overall transfer timeout. `Duration::ZERO` means no limit.
    Timeout(Duration),
    ConnectTimeout(Duration),
    NoProgress(bool),
    FollowLocation(bool),
    /// Do not ask for a response body (HEAD semantics).
    NoBody(bool),
    /// Deliver trace events to the handler's `debug` callback.
    Verbose(bool),
    Method(TransferMethod),
    /// Request body bytes, length taken from the buffer. `None` clears a
    /// body left over from an earlier transfer.
    PostFields(Option<Vec<u8>>),
    /// Raw request header lines in send order.
    HttpHeaders(Vec<Vec<u8>>),
    TcpKeepAlive(bool),
}

/// Kinds of trace events a transport reports while verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoType {
    Text,
    HeaderOut,
    DataOut,
    SslDataOut,
    HeaderIn,
    DataIn,
    SslDataIn,
    /// Anything the transport reports that this bridge does not render.
    Other,
}
