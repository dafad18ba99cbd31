//! The request handle: one transport session plus everything accumulated
//! around it.
//!
//! # Design
//! `Request` owns its session, request headers, response sink, debug level,
//! and diagnostic buffer, and drops them together. `execute` walks
//! `Idle -> Configuring -> Executing -> Completed | Failed`; configuration
//! options are re-applied on every call so nothing leaks from one execution
//! into the next except the accumulated response data, which by default is
//! appended to rather than replaced.
//!
//! The reported body length on success is the accumulated size plus one;
//! callers size their receive buffers from it.

use std::time::Duration;

use crate::error::{self, ErrorCode, ExecuteError, TransportError};
use crate::headers::HeaderList;
use crate::http::{ExecuteOptions, Method, TransferMethod, TransferOption};
use crate::lifecycle::TRANSPORT_INIT;
use crate::shim::SinkHandler;
use crate::sink::ResponseSink;
use crate::transport::Session;

/// Connect timeout applied to every execution.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(7);

/// Capacity of the diagnostic buffer, terminator included.
pub const ERROR_BUFFER_SIZE: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecState {
    Idle,
    Configuring,
    Executing,
    Completed,
    Failed,
}

/// Outcome of a successful execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    /// Protocol status code of the final response.
    pub status: u16,
    /// Accumulated body size plus one.
    pub body_length: usize,
}

fn timeout_option(secs: i32) -> Result<TransferOption, TransportError> {
    let secs = u64::try_from(secs).map_err(|_| {
        TransportError::with_detail(ErrorCode::BadFunctionArgument, format!("negative timeout: {secs}"))
    })?;
    Ok(TransferOption::Timeout(Duration::from_secs(secs)))
}

/// Longest prefix of `text` that fits in `max` bytes without splitting a
/// character.
fn truncate_at_boundary(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

pub struct Request<S: Session> {
    session: S,
    headers: HeaderList,
    sink: ResponseSink,
    debug_level: i32,
    error: String,
    state: ExecState,
    reset_on_execute: bool,
}

impl<S: Session> Request<S> {
    /// Initialize the transport library if this is the first handle in the
    /// process, then open a fresh session.
    pub fn create() -> Result<Self, TransportError> {
        TRANSPORT_INIT.ensure(S::global_init);
        Self::with_session(S::open()?)
    }

    pub fn with_session(mut session: S) -> Result<Self, TransportError> {
        session.set_option(TransferOption::NoProgress(true))?;
        Ok(Self {
            session,
            headers: HeaderList::new(),
            sink: ResponseSink::new(),
            debug_level: 0,
            error: String::new(),
            state: ExecState::Idle,
            reset_on_execute: false,
        })
    }

    pub fn set_url(&mut self, url: &str) -> Result<(), TransportError> {
        self.session.set_option(TransferOption::Url(url.to_string()))
    }

    pub fn set_timeout(&mut self, secs: i32) -> Result<(), TransportError> {
        let option = timeout_option(secs)?;
        self.session.set_option(option)
    }

    pub fn add_header(&mut self, line: impl AsRef<[u8]>) {
        self.headers.add(line.as_ref());
    }

    pub fn add_headers(&mut self, text: impl AsRef<[u8]>) {
        self.headers.add_multiline(text.as_ref());
    }

    pub fn headers(&self) -> &HeaderList {
        &self.headers
    }

    /// 0 disables tracing, 1 records event lines, 2 adds an ASCII payload
    /// dump, 3 and above a hex dump.
    pub fn set_debug_level(&mut self, level: i32) {
        self.debug_level = level;
    }

    pub fn debug_level(&self) -> i32 {
        self.debug_level
    }

    /// Clear the response sink at the start of every execution instead of
    /// appending to it.
    pub fn set_reset_on_execute(&mut self, reset: bool) {
        self.reset_on_execute = reset;
    }

    pub fn state(&self) -> ExecState {
        self.state
    }

    pub fn sink(&self) -> &ResponseSink {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut ResponseSink {
        &mut self.sink
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    /// Diagnostic captured by the last failed execution, empty if none.
    pub fn error_buffer(&self) -> &str {
        &self.error
    }

    /// Text for `code`: the captured diagnostic when there is one, the
    /// generic description otherwise.
    pub fn last_error(&self, code: i32) -> String {
        if self.error.is_empty() {
            error::describe(code).to_string()
        } else {
            self.error.clone()
        }
    }

    /// Configure the session for `method` and run one blocking transfer.
    pub fn execute(
        &mut self,
        method: Method,
        options: ExecuteOptions,
        body: Option<&[u8]>,
        timeout_secs: i32,
    ) -> Result<Completion, ExecuteError> {
        if method.requires_body() && body.is_none() {
            self.state = ExecState::Failed;
            return Err(ExecuteError::MissingBody(method));
        }

        self.state = ExecState::Configuring;
        self.error.clear();
        if self.reset_on_execute {
            self.sink.clear();
        }

        let result = self
            .configure(method, options, body, timeout_secs)
            .and_then(|()| self.perform());

        match result {
            Ok(done) => {
                self.state = ExecState::Completed;
                Ok(done)
            }
            Err(err) => {
                self.state = ExecState::Failed;
                if let Some(detail) = &err.detail {
                    self.error = truncate_at_boundary(detail, ERROR_BUFFER_SIZE - 1).to_string();
                }
                tracing::warn!(code = err.code.as_i32(), error = %err, %method, "request failed");
                Err(err.into())
            }
        }
    }

    fn configure(
        &mut self,
        method: Method,
        options: ExecuteOptions,
        body: Option<&[u8]>,
        timeout_secs: i32,
    ) -> Result<(), TransportError> {
        let debug = options.contains(ExecuteOptions::DEBUG) || self.debug_level != 0;

        self.session.set_option(TransferOption::NoProgress(true))?;
        self.session
            .set_option(TransferOption::FollowLocation(options.contains(ExecuteOptions::FOLLOW_REDIRECTS)))?;
        self.session
            .set_option(TransferOption::NoBody(options.contains(ExecuteOptions::NO_BODY)))?;
        self.session.set_option(TransferOption::Verbose(debug))?;

        let mut extra: Vec<&str> = Vec::new();
        let (transfer_method, payload) = match method {
            Method::Get => (TransferMethod::Get, None),
            Method::Post => {
                extra.push("Expect:");
                if body.is_none() {
                    extra.push("Content-Type:");
                }
                (TransferMethod::Post, body)
            }
            Method::PostJson => {
                extra.push("Content-Type: application/json");
                (TransferMethod::Post, body)
            }
            Method::PostForm => {
                extra.push("Content-Type: application/x-www-form-urlencoded");
                (TransferMethod::Post, body)
            }
            Method::Delete => (TransferMethod::Custom("DELETE".to_string()), None),
            Method::Put => (TransferMethod::Put, body),
        };
        self.session.set_option(TransferOption::Method(transfer_method))?;
        self.session
            .set_option(TransferOption::PostFields(payload.map(<[u8]>::to_vec)))?;

        self.prepare_headers(&extra)?;

        self.session.set_option(TransferOption::ConnectTimeout(CONNECT_TIMEOUT))?;
        self.session.set_option(timeout_option(timeout_secs)?)?;
        self.session.set_option(TransferOption::TcpKeepAlive(true))?;

        if self.debug_level > 1 {
            tracing::debug!("Method --> {method}");
        }
        Ok(())
    }

    fn prepare_headers(&mut self, extra: &[&str]) -> Result<(), TransportError> {
        let list = match self.headers.prepare(extra) {
            Some(list) => list.to_vec(),
            None => Vec::new(),
        };
        if self.debug_level != 0 {
            for line in &list {
                tracing::debug!("Header |{}| ({} bytes)", String::from_utf8_lossy(line), line.len());
            }
        }
        self.session.set_option(TransferOption::HttpHeaders(list))
    }

    fn perform(&mut self) -> Result<Completion, TransportError> {
        self.state = ExecState::Executing;
        let mut handler = SinkHandler::new(&mut self.sink, self.debug_level);
        self.session.perform(&mut handler)?;
        Ok(Completion {
            status: self.session.response_code(),
            body_length: self.sink.body_size() + 1,
        })
    }
}
