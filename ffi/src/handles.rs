//! Process-wide table of live request handles.
//!
//! # Design
//! The C caller only ever sees the `usize` token handed out by
//! `HandleRegistry`. Entries are `Arc<Mutex<_>>` so a lookup clones the
//! `Arc` and drops the table lock before touching the request: a blocking
//! execute on one handle never stalls create/destroy on another.

use std::sync::Arc;

use mqlhttp_core::{HandleRegistry, HttpRequest};
use parking_lot::{const_mutex, Mutex};

type Entry = Arc<Mutex<HttpRequest>>;

static HANDLES: Mutex<HandleRegistry<Entry>> = const_mutex(HandleRegistry::new());

/// Register `request` and return its token, or `0` if the table is full.
pub(crate) fn insert(request: HttpRequest) -> usize {
    HANDLES
        .lock()
        .insert(Arc::new(Mutex::new(request)))
        .unwrap_or(0)
}

/// Drop the handle behind `token`. Returns `false` for unknown or stale
/// tokens.
pub(crate) fn remove(token: usize) -> bool {
    let entry = HANDLES.lock().remove(token);
    entry.is_some()
}

/// Run `f` against the request behind `token`, or return `None` if the
/// token is unknown or stale.
pub(crate) fn with<R>(token: usize, f: impl FnOnce(&mut HttpRequest) -> R) -> Option<R> {
    let entry = HANDLES.lock().get(token).cloned()?;
    let mut request = entry.lock();
    Some(f(&mut request))
}
