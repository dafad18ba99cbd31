//! The seam between a request handle and the HTTP engine underneath it.
//!
//! # Design
//! A `Session` is driven the way a curl easy handle is: options are set one
//! call at a time, each of which may fail, then a single blocking `perform`
//! streams the response back through a `TransferHandler`. Tests substitute
//! a scripted session for the network.

use crate::error::TransportError;
use crate::http::{InfoType, TransferOption};

/// Receives everything a transfer produces, in arrival order.
pub trait TransferHandler {
    /// A chunk of response body. Returning less than `data.len()` aborts
    /// the transfer with a write error.
    fn write(&mut self, data: &[u8]) -> usize;

    /// One raw response header line including its terminator. Returning
    /// less than `line.len()` aborts the transfer with a write error.
    fn header(&mut self, line: &[u8]) -> usize;

    /// A trace event. Only delivered while the session is verbose.
    fn debug(&mut self, kind: InfoType, data: &[u8]);
}

/// One transport session, owned by exactly one request handle.
pub trait Session: Sized {
    /// Process-wide setup of the underlying library. Callers guarantee this
    /// runs once before the first `open`.
    fn global_init();

    fn open() -> Result<Self, TransportError>;

    fn set_option(&mut self, option: TransferOption) -> Result<(), TransportError>;

    /// Run the configured transfer to completion. This is the only call
    /// that blocks on the network.
    fn perform(&mut self, handler: &mut dyn TransferHandler) -> Result<(), TransportError>;

    /// Status code of the last completed response, `0` if none.
    fn response_code(&self) -> u16;
}
