//! Request-handle core for the scripting-terminal HTTP bridge.
//!
//! # Overview
//! A `Request` bundles one transport session with the request headers it
//! will send and the `ResponseSink` that collects what comes back. Callers
//! configure it, run one blocking `execute`, then pull the body, response
//! headers, and optional trace text out of the sink.
//!
//! # Design
//! - The transport is reached only through the `Session` trait, so tests can
//!   replay canned transfers; `UreqSession` is the production binding.
//! - Transport callbacks (`TransferHandler`) are routed into the sink by
//!   `SinkHandler`.
//! - Global transport setup runs once per process behind `TRANSPORT_INIT`.
//! - `HandleRegistry` turns owned values into generation-checked tokens for
//!   the C boundary.
//! - Wide-text conversion lives in `encoding` so the boundary layer only
//!   adapts pointers.

pub mod encoding;
pub mod error;
pub mod headers;
pub mod http;
pub mod lifecycle;
pub mod registry;
pub mod request;
pub mod shim;
pub mod sink;
pub mod trace;
pub mod transport;
pub mod ureq_session;

pub use error::{ErrorCode, ExecuteError, TransportError};
pub use headers::HeaderList;
pub use http::{ExecuteOptions, InfoType, Method, TransferMethod, TransferOption};
pub use lifecycle::{InitGuard, TRANSPORT_INIT};
pub use registry::HandleRegistry;
pub use request::{Completion, ExecState, Request};
pub use sink::ResponseSink;
pub use transport::{Session, TransferHandler};
pub use ureq_session::UreqSession;

/// Request handle bound to the production transport.
pub type HttpRequest = Request<UreqSession>;
