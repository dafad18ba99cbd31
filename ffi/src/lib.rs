//! C-ABI surface of the HTTP request bridge.
//!
//! # Overview
//! Exposes `mqlhttp-core` request handles to a scripting terminal through
//! flat `extern "system"` functions: create a handle, configure it, run one
//! blocking execute, then pull the body, response headers, and trace out of
//! it. Every function that takes text has a `_w` twin taking UTF-16.
//!
//! # Design
//! - Handles are opaque `usize` tokens from a generation-checked registry;
//!   `0` is never a valid handle. A stale or unknown token gets the
//!   invalid-handle sentinel and is never dereferenced.
//! - Every `extern` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary. A caught panic reports as an invalid
//!   handle.
//! - Negative returns are bridge sentinels (see `INVALID_HANDLE`,
//!   `MISSING_BODY`, `UNKNOWN_METHOD`); non-negative returns from setters
//!   and execute are transport result codes, `0` meaning success.
//! - The `_w` variants only convert at the boundary and share the narrow
//!   implementation.

mod handles;
pub mod logging;
mod text;

use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use mqlhttp_core::encoding::{self, WideChar};
use mqlhttp_core::{error, ExecuteError, ExecuteOptions, HttpRequest, Method};

use text::len_i32;

/// Unknown, stale, or null handle, or a required pointer argument was null.
pub const INVALID_HANDLE: i32 = -1;
/// `POST_JSON` or `POST_FORM` executed without a body.
pub const MISSING_BODY: i32 = -2;
/// Execute called with a method value outside the known set.
pub const UNKNOWN_METHOD: i32 = -3;

// ---------------------------------------------------------------------------
// Shared implementation
// ---------------------------------------------------------------------------

fn guard(body: impl FnOnce() -> i32) -> i32 {
    catch_unwind(AssertUnwindSafe(body)).unwrap_or(INVALID_HANDLE)
}

fn status_of(result: Result<(), mqlhttp_core::TransportError>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => e.code.as_i32(),
    }
}

fn set_url(handle: usize, url: Option<String>) -> i32 {
    let Some(url) = url else {
        return INVALID_HANDLE;
    };
    handles::with(handle, |req| status_of(req.set_url(&url))).unwrap_or(INVALID_HANDLE)
}

fn add_header(handle: usize, line: Option<impl AsRef<[u8]>>) -> i32 {
    let Some(line) = line else {
        return INVALID_HANDLE;
    };
    handles::with(handle, |req| {
        req.add_header(&line);
        0
    })
    .unwrap_or(INVALID_HANDLE)
}

fn add_headers(handle: usize, text: Option<impl AsRef<[u8]>>) -> i32 {
    let Some(text) = text else {
        return INVALID_HANDLE;
    };
    handles::with(handle, |req| {
        req.add_headers(&text);
        0
    })
    .unwrap_or(INVALID_HANDLE)
}

unsafe fn write_out(ptr: *mut i32, value: i32) {
    if !ptr.is_null() {
        unsafe { *ptr = value };
    }
}

unsafe fn execute(
    handle: usize,
    code: *mut i32,
    length: *mut i32,
    method: i32,
    options: u32,
    body: Option<&[u8]>,
    timeout_secs: i32,
) -> i32 {
    unsafe {
        write_out(code, 0);
        write_out(length, 0);
    }
    let Ok(method) = Method::try_from(method) else {
        return if handles::with(handle, |_| ()).is_some() {
            UNKNOWN_METHOD
        } else {
            INVALID_HANDLE
        };
    };
    let options = ExecuteOptions::from_bits(options);
    handles::with(handle, |req: &mut HttpRequest| {
        match req.execute(method, options, body, timeout_secs) {
            Ok(done) => {
                unsafe {
                    write_out(code, i32::from(done.status));
                    write_out(length, len_i32(done.body_length));
                }
                0
            }
            Err(ExecuteError::MissingBody(_)) => MISSING_BODY,
            Err(ExecuteError::Transport(e)) => e.code.as_i32(),
        }
    })
    .unwrap_or(INVALID_HANDLE)
}

fn error_text(handle: usize, code: i32) -> String {
    if handle == 0 {
        return error::describe(code).to_string();
    }
    handles::with(handle, |req| req.last_error(code))
        .unwrap_or_else(|| error::describe(code).to_string())
}

// ---------------------------------------------------------------------------
// Handle lifecycle
// ---------------------------------------------------------------------------

/// Create a request handle, initializing the transport on first use.
///
/// Returns `0` if the handle could not be created.
/// The caller must release the handle with `mqlhttp_finalize`.
#[unsafe(no_mangle)]
pub extern "system" fn mqlhttp_init() -> usize {
    catch_unwind(|| {
        logging::init();
        let request = match HttpRequest::create() {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "handle creation failed");
                return 0;
            }
        };
        let handle = handles::insert(request);
        tracing::debug!(handle, "handle created");
        handle
    })
    .unwrap_or(0)
}

/// Destroy a handle. Unknown, stale, and `0` handles are ignored.
#[unsafe(no_mangle)]
pub extern "system" fn mqlhttp_finalize(handle: usize) {
    let _ = catch_unwind(|| {
        if handles::remove(handle) {
            tracing::debug!(handle, "handle destroyed");
        } else if handle != 0 {
            tracing::debug!(handle, "finalize on unknown handle ignored");
        }
    });
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Set the request URL. Returns the transport's option result.
#[unsafe(no_mangle)]
pub extern "system" fn mqlhttp_set_url(handle: usize, url: *const c_char) -> i32 {
    guard(|| set_url(handle, unsafe { text::narrow_arg(url) }))
}

/// Set the overall transfer timeout. `0` means no limit; negative values
/// are rejected as a bad argument.
#[unsafe(no_mangle)]
pub extern "system" fn mqlhttp_set_timeout(handle: usize, timeout_secs: i32) -> i32 {
    guard(|| {
        handles::with(handle, |req| status_of(req.set_timeout(timeout_secs))).unwrap_or(INVALID_HANDLE)
    })
}

/// Append one raw request header line, e.g. `"Accept: text/plain"`. The
/// bytes are sent as given, so code-page text need not be UTF-8.
#[unsafe(no_mangle)]
pub extern "system" fn mqlhttp_add_header(handle: usize, header: *const c_char) -> i32 {
    guard(|| add_header(handle, unsafe { text::narrow_bytes(header) }))
}

/// Append request header lines separated by `\n`.
#[unsafe(no_mangle)]
pub extern "system" fn mqlhttp_add_headers(handle: usize, headers: *const c_char) -> i32 {
    guard(|| add_headers(handle, unsafe { text::narrow_bytes(headers) }))
}

/// `0` off, `1` trace event lines, `2` plus ASCII payload dump, `3` and
/// above plus hex dump.
#[unsafe(no_mangle)]
pub extern "system" fn mqlhttp_set_debug_level(handle: usize, level: i32) -> i32 {
    guard(|| {
        handles::with(handle, |req| {
            req.set_debug_level(level);
            0
        })
        .unwrap_or(INVALID_HANDLE)
    })
}

/// Nonzero: clear body, headers, and trace at the start of every execute.
/// Zero (the default): accumulate across executes.
#[unsafe(no_mangle)]
pub extern "system" fn mqlhttp_set_reset_on_execute(handle: usize, reset: i32) -> i32 {
    guard(|| {
        handles::with(handle, |req| {
            req.set_reset_on_execute(reset != 0);
            0
        })
        .unwrap_or(INVALID_HANDLE)
    })
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

/// Run one blocking request.
///
/// `method`: 0 GET, 1 POST, 2 POST_JSON, 3 POST_FORM, 4 DELETE, 5 PUT.
/// `options`: bitwise OR of 1 follow redirects, 2 no body, 4 debug.
/// `body` may be null except for POST_JSON and POST_FORM.
///
/// On success returns `0`, stores the response status in `*code` and the
/// accumulated body size plus one in `*length`. On any failure both are
/// set to `0`. `code` and `length` may be null.
#[unsafe(no_mangle)]
pub extern "system" fn mqlhttp_execute(
    handle: usize,
    code: *mut i32,
    length: *mut i32,
    method: i32,
    options: u32,
    body: *const c_char,
    timeout_secs: i32,
) -> i32 {
    guard(|| unsafe {
        let body = text::narrow_bytes(body);
        execute(handle, code, length, method, options, body, timeout_secs)
    })
}

// ---------------------------------------------------------------------------
// Response retrieval
// ---------------------------------------------------------------------------

/// Total body bytes accumulated, independent of how much has been read.
#[unsafe(no_mangle)]
pub extern "system" fn mqlhttp_body_size(handle: usize) -> i32 {
    guard(|| handles::with(handle, |req| len_i32(req.sink().body_size())).unwrap_or(INVALID_HANDLE))
}

/// Drain up to `size` unread body bytes into `buf`. Returns the number of
/// bytes copied, `0` once everything has been read. No terminator is
/// written.
#[unsafe(no_mangle)]
pub extern "system" fn mqlhttp_body(handle: usize, buf: *mut c_char, size: i32) -> i32 {
    guard(|| {
        if buf.is_null() {
            return INVALID_HANDLE;
        }
        handles::with(handle, |req| {
            let cap = usize::try_from(size).unwrap_or(0);
            let out = unsafe { std::slice::from_raw_parts_mut(buf.cast::<u8>(), cap) };
            len_i32(req.sink_mut().read_body(out))
        })
        .unwrap_or(INVALID_HANDLE)
    })
}

/// Number of captured response headers, or `-1` for a bad handle.
#[unsafe(no_mangle)]
pub extern "system" fn mqlhttp_header_count(handle: usize) -> i32 {
    guard(|| handles::with(handle, |req| len_i32(req.sink().header_count())).unwrap_or(INVALID_HANDLE))
}

/// Copy response header `index` into `buf` with a terminator.
///
/// Returns the header's length. If `size` is not larger than that length,
/// nothing is written and the caller should retry with a bigger buffer.
/// Returns `-1` for an out-of-range index.
#[unsafe(no_mangle)]
pub extern "system" fn mqlhttp_header(handle: usize, index: i32, buf: *mut c_char, size: i32) -> i32 {
    guard(|| {
        handles::with(handle, |req| {
            let line = req.sink().header(usize::try_from(index).ok()?)?;
            Some(unsafe { text::copy_if_fits(line.as_bytes(), buf.cast::<u8>(), size) })
        })
        .flatten()
        .unwrap_or(INVALID_HANDLE)
    })
}

/// Trace length in bytes, without a terminator. `-1` for a bad handle.
#[unsafe(no_mangle)]
pub extern "system" fn mqlhttp_trace_size(handle: usize) -> i32 {
    guard(|| handles::with(handle, |req| len_i32(req.sink().trace_size())).unwrap_or(INVALID_HANDLE))
}

/// Copy the whole trace into `buf`, same protocol as `mqlhttp_header`.
/// Does not consume the trace.
#[unsafe(no_mangle)]
pub extern "system" fn mqlhttp_trace(handle: usize, buf: *mut c_char, size: i32) -> i32 {
    guard(|| {
        handles::with(handle, |req| unsafe {
            text::copy_if_fits(req.sink().trace(), buf.cast::<u8>(), size)
        })
        .unwrap_or(INVALID_HANDLE)
    })
}

/// Message for `code`: the handle's captured diagnostic if it has one,
/// the generic description otherwise. `handle` may be `0`.
///
/// Writes at most `size - 1` bytes plus a terminator and returns the full
/// message length, like `snprintf`.
#[unsafe(no_mangle)]
pub extern "system" fn mqlhttp_last_error(code: i32, handle: usize, buf: *mut c_char, size: i32) -> i32 {
    guard(|| {
        let message = error_text(handle, code);
        unsafe { text::copy_truncated(message.as_bytes(), buf.cast::<u8>(), size) }
    })
}

// ---------------------------------------------------------------------------
// Wide-character variants
// ---------------------------------------------------------------------------

/// Wide twin of `mqlhttp_set_url`. `-1` for a bad handle or null `url`.
#[unsafe(no_mangle)]
pub extern "system" fn mqlhttp_set_url_w(handle: usize, url: *const WideChar) -> i32 {
    guard(|| set_url(handle, unsafe { text::wide_arg(url, -1) }))
}

/// Wide twin of `mqlhttp_add_header`; the line is stored as UTF-8.
/// `-1` for a bad handle or null `header`.
#[unsafe(no_mangle)]
pub extern "system" fn mqlhttp_add_header_w(handle: usize, header: *const WideChar) -> i32 {
    guard(|| add_header(handle, unsafe { text::wide_arg(header, -1) }))
}

/// Wide twin of `mqlhttp_add_headers`. `-1` for a bad handle or null
/// `headers`.
#[unsafe(no_mangle)]
pub extern "system" fn mqlhttp_add_headers_w(handle: usize, headers: *const WideChar) -> i32 {
    guard(|| add_headers(handle, unsafe { text::wide_arg(headers, -1) }))
}

/// Wide twin of `mqlhttp_execute`; the body is sent as UTF-8.
#[unsafe(no_mangle)]
pub extern "system" fn mqlhttp_execute_w(
    handle: usize,
    code: *mut i32,
    length: *mut i32,
    method: i32,
    options: u32,
    body: *const WideChar,
    timeout_secs: i32,
) -> i32 {
    guard(|| unsafe {
        let body = text::wide_arg(body, -1);
        execute(
            handle,
            code,
            length,
            method,
            options,
            body.as_deref().map(str::as_bytes),
            timeout_secs,
        )
    })
}

/// Drain unread body text into `buf` as UTF-16. `size` is the capacity in
/// UTF-16 units, not bytes.
///
/// Whole characters are copied until the next one would overflow `size`,
/// so a surrogate pair is never split between two calls. Returns the number
/// of units written, `0` once drained or when the next character needs two
/// units and `size` is `1`.
#[unsafe(no_mangle)]
pub extern "system" fn mqlhttp_body_w(handle: usize, buf: *mut WideChar, size: i32) -> i32 {
    guard(|| {
        if buf.is_null() {
            return INVALID_HANDLE;
        }
        handles::with(handle, |req| {
            let max = usize::try_from(size).unwrap_or(0);
            let chunk = req.sink_mut().read_body_text(max);
            let wide = encoding::to_wide(chunk.as_bytes());
            unsafe { text::copy_raw(&wide, buf, size) }
        })
        .unwrap_or(INVALID_HANDLE)
    })
}

/// Wide twin of `mqlhttp_header`. The fit check is made against the
/// narrow length, which is also what gets returned when the buffer is too
/// small; on success the number of wide units written is returned.
#[unsafe(no_mangle)]
pub extern "system" fn mqlhttp_header_w(handle: usize, index: i32, buf: *mut WideChar, size: i32) -> i32 {
    guard(|| {
        handles::with(handle, |req| {
            let line = req.sink().header(usize::try_from(index).ok()?)?;
            Some(unsafe { text::copy_wide_if_fits(line.as_bytes(), buf, size) })
        })
        .flatten()
        .unwrap_or(INVALID_HANDLE)
    })
}

/// Wide twin of `mqlhttp_trace`, with the fit check of `mqlhttp_header_w`:
/// too small a buffer gets the length in bytes, success the UTF-16 units
/// written. `-1` for a bad handle.
#[unsafe(no_mangle)]
pub extern "system" fn mqlhttp_trace_w(handle: usize, buf: *mut WideChar, size: i32) -> i32 {
    guard(|| {
        handles::with(handle, |req| unsafe { text::copy_wide_if_fits(req.sink().trace(), buf, size) })
            .unwrap_or(INVALID_HANDLE)
    })
}

/// Wide twin of `mqlhttp_last_error`; lengths are in UTF-16 units.
#[unsafe(no_mangle)]
pub extern "system" fn mqlhttp_last_error_w(
    code: i32,
    handle: usize,
    buf: *mut WideChar,
    size: i32,
) -> i32 {
    guard(|| {
        let message = encoding::to_wide(error_text(handle, code).as_bytes());
        unsafe { text::copy_truncated(&message, buf, size) }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    use mqlhttp_core::trace::DumpMode;
    use mqlhttp_core::InfoType;

    fn wide(s: &str) -> Vec<u16> {
        s.encode_utf16().chain(std::iter::once(0)).collect()
    }

    fn header_lines(handle: usize) -> Vec<String> {
        handles::with(handle, |req| {
            req.headers()
                .lines()
                .iter()
                .map(|l| String::from_utf8_lossy(l).into_owned())
                .collect()
        })
        .unwrap()
    }

    /// Push a canned response into a live handle's sink.
    fn feed(handle: usize, headers: &[&str], body: &[u8]) {
        handles::with(handle, |req| {
            let sink = req.sink_mut();
            sink.on_header_line(b"HTTP/1.1 200 OK\r\n");
            for h in headers {
                sink.on_header_line(format!("{h}\r\n").as_bytes());
            }
            sink.on_body_chunk(body);
            sink.on_trace_event(InfoType::Text, b"canned\n", DumpMode::None);
        })
        .unwrap();
    }

    #[test]
    fn init_returns_nonzero_handle() {
        let h = mqlhttp_init();
        assert_ne!(h, 0);
        assert_eq!(mqlhttp_body_size(h), 0);
        assert_eq!(mqlhttp_header_count(h), 0);
        assert_eq!(mqlhttp_trace_size(h), 0);
        mqlhttp_finalize(h);
    }

    #[test]
    fn finalized_handle_is_rejected() {
        let h = mqlhttp_init();
        mqlhttp_finalize(h);
        let url = CString::new("http://example.test/").unwrap();
        assert_eq!(mqlhttp_set_url(h, url.as_ptr()), INVALID_HANDLE);
        assert_eq!(mqlhttp_body_size(h), INVALID_HANDLE);
        mqlhttp_finalize(h);
    }

    #[test]
    fn finalize_zero_is_safe() {
        mqlhttp_finalize(0);
    }

    #[test]
    fn handles_are_not_reused_verbatim() {
        let a = mqlhttp_init();
        mqlhttp_finalize(a);
        let b = mqlhttp_init();
        assert_ne!(a, b);
        assert_eq!(mqlhttp_header_count(a), INVALID_HANDLE);
        assert_eq!(mqlhttp_header_count(b), 0);
        mqlhttp_finalize(b);
    }

    #[test]
    fn null_handle_sentinels() {
        let url = CString::new("http://example.test/").unwrap();
        let mut buf = [0 as c_char; 8];
        let mut code = 7;
        let mut len = 7;
        assert_eq!(mqlhttp_set_url(0, url.as_ptr()), INVALID_HANDLE);
        assert_eq!(mqlhttp_set_timeout(0, 5), INVALID_HANDLE);
        assert_eq!(mqlhttp_add_header(0, url.as_ptr()), INVALID_HANDLE);
        assert_eq!(mqlhttp_add_headers(0, url.as_ptr()), INVALID_HANDLE);
        assert_eq!(mqlhttp_set_debug_level(0, 1), INVALID_HANDLE);
        assert_eq!(mqlhttp_set_reset_on_execute(0, 1), INVALID_HANDLE);
        assert_eq!(
            mqlhttp_execute(0, &mut code, &mut len, 0, 0, std::ptr::null(), 5),
            INVALID_HANDLE
        );
        assert_eq!((code, len), (0, 0));
        assert_eq!(mqlhttp_body(0, buf.as_mut_ptr(), 8), INVALID_HANDLE);
        assert_eq!(mqlhttp_header(0, 0, buf.as_mut_ptr(), 8), INVALID_HANDLE);
        assert_eq!(mqlhttp_trace(0, buf.as_mut_ptr(), 8), INVALID_HANDLE);
    }

    #[test]
    fn null_text_arguments_are_rejected() {
        let h = mqlhttp_init();
        assert_eq!(mqlhttp_set_url(h, std::ptr::null()), INVALID_HANDLE);
        assert_eq!(mqlhttp_add_header(h, std::ptr::null()), INVALID_HANDLE);
        assert_eq!(mqlhttp_add_header_w(h, std::ptr::null()), INVALID_HANDLE);
        assert_eq!(mqlhttp_body(h, std::ptr::null_mut(), 8), INVALID_HANDLE);
        mqlhttp_finalize(h);
    }

    #[test]
    fn setters_report_transport_status() {
        let h = mqlhttp_init();
        let url = CString::new("http://example.test/x").unwrap();
        let header = CString::new("X-Test: 1").unwrap();
        let many = CString::new("X-A: 1\nX-B: 2").unwrap();
        assert_eq!(mqlhttp_set_url(h, url.as_ptr()), 0);
        assert_eq!(mqlhttp_set_timeout(h, 10), 0);
        assert_eq!(mqlhttp_set_timeout(h, -1), 43);
        assert_eq!(mqlhttp_add_header(h, header.as_ptr()), 0);
        assert_eq!(mqlhttp_add_headers(h, many.as_ptr()), 0);
        assert_eq!(mqlhttp_set_debug_level(h, 2), 0);

        let lines = header_lines(h);
        assert_eq!(lines, ["X-Test: 1", "X-A: 1", "X-B: 2"]);
        mqlhttp_finalize(h);
    }

    #[test]
    fn narrow_header_keeps_code_page_bytes() {
        let h = mqlhttp_init();
        let header = CString::new(b"X-Name: caf\xE9".to_vec()).unwrap();
        let many = CString::new(b"X-A: \xE9\nX-B: 2".to_vec()).unwrap();
        assert_eq!(mqlhttp_add_header(h, header.as_ptr()), 0);
        assert_eq!(mqlhttp_add_headers(h, many.as_ptr()), 0);

        let lines = handles::with(h, |req| req.headers().lines().to_vec()).unwrap();
        assert_eq!(lines[0], b"X-Name: caf\xE9");
        assert_eq!(lines[1], b"X-A: \xE9");
        assert_eq!(lines[2], b"X-B: 2");
        mqlhttp_finalize(h);
    }

    #[test]
    fn wide_header_setters_convert() {
        let h = mqlhttp_init();
        assert_eq!(mqlhttp_add_header_w(h, wide("X-Name: é").as_ptr()), 0);
        assert_eq!(mqlhttp_add_headers_w(h, wide("X-A: 1\nX-B: 2").as_ptr()), 0);
        assert_eq!(mqlhttp_set_url_w(h, wide("http://example.test/").as_ptr()), 0);

        let lines = header_lines(h);
        assert_eq!(lines, ["X-Name: é", "X-A: 1", "X-B: 2"]);
        mqlhttp_finalize(h);
    }

    #[test]
    fn post_json_without_body_is_missing_body() {
        let h = mqlhttp_init();
        let mut code = 1;
        let mut len = 1;
        let rc = mqlhttp_execute(h, &mut code, &mut len, 2, 0, std::ptr::null(), 5);
        assert_eq!(rc, MISSING_BODY);
        assert_eq!((code, len), (0, 0));
        assert_eq!(mqlhttp_execute_w(h, &mut code, &mut len, 3, 0, std::ptr::null(), 5), MISSING_BODY);
        mqlhttp_finalize(h);
    }

    #[test]
    fn unknown_method_is_rejected() {
        let h = mqlhttp_init();
        let rc = mqlhttp_execute(h, std::ptr::null_mut(), std::ptr::null_mut(), 42, 0, std::ptr::null(), 5);
        assert_eq!(rc, UNKNOWN_METHOD);
        mqlhttp_finalize(h);
    }

    #[test]
    fn execute_without_url_reports_transport_code() {
        let h = mqlhttp_init();
        let mut code = 1;
        let mut len = 1;
        let rc = mqlhttp_execute(h, &mut code, &mut len, 0, 0, std::ptr::null(), 5);
        assert_eq!(rc, 3);
        assert_eq!((code, len), (0, 0));

        let mut buf = [0 as c_char; 64];
        let n = mqlhttp_last_error(rc, h, buf.as_mut_ptr(), 64);
        let text = unsafe { std::ffi::CStr::from_ptr(buf.as_ptr()) }.to_str().unwrap();
        assert_eq!(text, "No URL set");
        assert_eq!(n, 10);
        mqlhttp_finalize(h);
    }

    #[test]
    fn last_error_without_handle_is_generic() {
        let mut buf = [0 as c_char; 64];
        let n = mqlhttp_last_error(28, 0, buf.as_mut_ptr(), 64);
        let text = unsafe { std::ffi::CStr::from_ptr(buf.as_ptr()) }.to_str().unwrap();
        assert_eq!(text, "Timeout was reached");
        assert_eq!(n, len_i32(text.len()));

        let n = mqlhttp_last_error(9999, 0, buf.as_mut_ptr(), 64);
        assert_eq!(n, len_i32("Unknown error".len()));
    }

    #[test]
    fn last_error_truncates_like_snprintf() {
        let mut buf = [0x7f as c_char; 8];
        let n = mqlhttp_last_error(28, 0, buf.as_mut_ptr(), 8);
        assert_eq!(n, 19);
        let text = unsafe { std::ffi::CStr::from_ptr(buf.as_ptr()) }.to_str().unwrap();
        assert_eq!(text, "Timeout");

        assert_eq!(mqlhttp_last_error(28, 0, std::ptr::null_mut(), 0), 19);
    }

    #[test]
    fn last_error_wide_counts_units() {
        let mut buf = [0u16; 64];
        let n = mqlhttp_last_error_w(28, 0, buf.as_mut_ptr(), 64);
        assert_eq!(n, 19);
        assert_eq!(String::from_utf16_lossy(&buf[..19]), "Timeout was reached");
        assert_eq!(buf[19], 0);
    }

    #[test]
    fn body_drains_while_size_stays() {
        let h = mqlhttp_init();
        feed(h, &[], b"hello world");

        let mut buf = [0 as c_char; 4];
        let mut out = Vec::new();
        loop {
            let n = mqlhttp_body(h, buf.as_mut_ptr(), 4);
            if n == 0 {
                break;
            }
            assert!(n <= 4);
            out.extend(buf[..n as usize].iter().map(|&c| c as u8));
            assert_eq!(mqlhttp_body_size(h), 11);
        }
        assert_eq!(out, b"hello world");
        assert_eq!(mqlhttp_body(h, buf.as_mut_ptr(), 4), 0);
        mqlhttp_finalize(h);
    }

    #[test]
    fn wide_body_fills_buffer_in_utf16_units() {
        let h = mqlhttp_init();
        feed(h, &[], "aé€".as_bytes());

        let mut buf = [0u16; 8];
        assert_eq!(mqlhttp_body_w(h, buf.as_mut_ptr(), 2), 2);
        assert_eq!(String::from_utf16_lossy(&buf[..2]), "aé");
        assert_eq!(mqlhttp_body_w(h, buf.as_mut_ptr(), 8), 1);
        assert_eq!(String::from_utf16_lossy(&buf[..1]), "€");
        assert_eq!(mqlhttp_body_w(h, buf.as_mut_ptr(), 8), 0);
        mqlhttp_finalize(h);
    }

    #[test]
    fn wide_body_drains_multibyte_text_one_unit_at_a_time() {
        let h = mqlhttp_init();
        feed(h, &[], "€€".as_bytes());

        let mut buf = [0u16; 1];
        assert_eq!(mqlhttp_body_w(h, buf.as_mut_ptr(), 1), 1);
        assert_eq!(buf[0], 0x20AC);
        assert_eq!(mqlhttp_body_w(h, buf.as_mut_ptr(), 1), 1);
        assert_eq!(buf[0], 0x20AC);
        assert_eq!(mqlhttp_body_w(h, buf.as_mut_ptr(), 1), 0);
        mqlhttp_finalize(h);
    }

    #[test]
    fn wide_body_keeps_surrogate_pair_for_larger_buffer() {
        let h = mqlhttp_init();
        feed(h, &[], "😀".as_bytes());

        let mut buf = [0u16; 2];
        assert_eq!(mqlhttp_body_w(h, buf.as_mut_ptr(), 1), 0);
        assert_eq!(mqlhttp_body_w(h, buf.as_mut_ptr(), 2), 2);
        assert_eq!(String::from_utf16(&buf).unwrap(), "😀");
        mqlhttp_finalize(h);
    }

    #[test]
    fn header_query_protocol() {
        let h = mqlhttp_init();
        feed(h, &["Content-Type: text/plain", "X-Id: 7"], b"");
        assert_eq!(mqlhttp_header_count(h), 2);

        let mut small = [0x7f as c_char; 24];
        assert_eq!(mqlhttp_header(h, 0, small.as_mut_ptr(), 24), 24);
        assert!(small.iter().all(|&c| c == 0x7f));

        let mut buf = [0 as c_char; 25];
        assert_eq!(mqlhttp_header(h, 0, buf.as_mut_ptr(), 25), 24);
        let text = unsafe { std::ffi::CStr::from_ptr(buf.as_ptr()) }.to_str().unwrap();
        assert_eq!(text, "Content-Type: text/plain");

        assert_eq!(mqlhttp_header(h, 2, buf.as_mut_ptr(), 25), INVALID_HANDLE);
        assert_eq!(mqlhttp_header(h, -1, buf.as_mut_ptr(), 25), INVALID_HANDLE);
        mqlhttp_finalize(h);
    }

    #[test]
    fn wide_header_query_protocol() {
        let h = mqlhttp_init();
        feed(h, &["X-Id: 7"], b"");

        let mut buf = [0u16; 16];
        assert_eq!(mqlhttp_header_w(h, 0, buf.as_mut_ptr(), 7), 7);
        assert_eq!(buf, [0u16; 16]);
        assert_eq!(mqlhttp_header_w(h, 0, buf.as_mut_ptr(), 16), 7);
        assert_eq!(String::from_utf16_lossy(&buf[..7]), "X-Id: 7");
        mqlhttp_finalize(h);
    }

    #[test]
    fn trace_query_protocol() {
        let h = mqlhttp_init();
        feed(h, &[], b"");
        let expected = "= Info.........: canned\n";
        assert_eq!(mqlhttp_trace_size(h), len_i32(expected.len()));

        let mut small = [0 as c_char; 4];
        assert_eq!(mqlhttp_trace(h, small.as_mut_ptr(), 4), len_i32(expected.len()));
        assert_eq!(small, [0; 4]);

        let mut buf = [0 as c_char; 64];
        assert_eq!(mqlhttp_trace(h, buf.as_mut_ptr(), 64), len_i32(expected.len()));
        let text = unsafe { std::ffi::CStr::from_ptr(buf.as_ptr()) }.to_str().unwrap();
        assert_eq!(text, expected);

        let mut wbuf = [0u16; 64];
        assert_eq!(mqlhttp_trace_w(h, wbuf.as_mut_ptr(), 64), len_i32(expected.len()));
        assert_eq!(String::from_utf16_lossy(&wbuf[..expected.len()]), expected);

        // Not consumed by reading.
        assert_eq!(mqlhttp_trace_size(h), len_i32(expected.len()));
        mqlhttp_finalize(h);
    }
}
