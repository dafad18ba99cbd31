//! Pointer-level string marshalling for the entry points.
//!
//! Inputs arrive as NUL-terminated narrow (`char`) or wide (`wchar_t`,
//! UTF-16) strings. Outputs follow one of two protocols:
//!
//! - *fit-or-report*: if the buffer cannot hold the text plus a terminator,
//!   nothing is written and the text length is returned so the caller can
//!   retry with a larger buffer;
//! - *truncate*: like `snprintf`, write as much as fits, always terminate,
//!   and return the full length.

use std::ffi::CStr;
use std::os::raw::c_char;

use mqlhttp_core::encoding::{self, WideChar};

pub(crate) fn len_i32(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

fn capacity(cap: i32) -> usize {
    usize::try_from(cap).unwrap_or(0)
}

/// Read a narrow string argument. `None` for a null pointer.
///
/// Bytes that are not UTF-8 become U+FFFD. Only the URL goes through here,
/// and a URL outside ASCII is rejected by the transport either way; header
/// lines are read with [`narrow_bytes`] instead.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string.
pub(crate) unsafe fn narrow_arg(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
}

/// Read a narrow argument as raw bytes, without the terminator.
///
/// # Safety
/// Same as [`narrow_arg`].
pub(crate) unsafe fn narrow_bytes<'a>(ptr: *const c_char) -> Option<&'a [u8]> {
    if ptr.is_null() {
        return None;
    }
    Some(unsafe { CStr::from_ptr(ptr) }.to_bytes())
}

/// Read `len` wide units from `ptr`, or up to the terminator when `len` is
/// negative. `None` for a null pointer.
///
/// # Safety
/// `ptr` must be null, point to `len` readable units, or (for negative
/// `len`) point to a NUL-terminated wide string.
pub(crate) unsafe fn wide_arg(ptr: *const WideChar, len: i32) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    let len = match usize::try_from(len) {
        Ok(n) => n,
        Err(_) => {
            let mut n = 0;
            while unsafe { *ptr.add(n) } != 0 {
                n += 1;
            }
            n
        }
    };
    let units = unsafe { std::slice::from_raw_parts(ptr, len) };
    Some(encoding::to_narrow(units))
}

/// Copy `src` into `buf` without a terminator. Returns the number of units
/// copied.
///
/// # Safety
/// `buf` must be valid for `cap` writes of `T`.
pub(crate) unsafe fn copy_raw<T: Copy>(src: &[T], buf: *mut T, cap: i32) -> i32 {
    let n = src.len().min(capacity(cap));
    if n > 0 {
        unsafe { std::ptr::copy_nonoverlapping(src.as_ptr(), buf, n) };
    }
    len_i32(n)
}

/// Copy `src` plus a terminator if it fits. Returns `src.len()` either way.
///
/// # Safety
/// `buf` must be null or valid for `cap` writes of `T`.
pub(crate) unsafe fn copy_if_fits<T: Copy + Default>(src: &[T], buf: *mut T, cap: i32) -> i32 {
    if !buf.is_null() && capacity(cap) > src.len() {
        unsafe {
            std::ptr::copy_nonoverlapping(src.as_ptr(), buf, src.len());
            *buf.add(src.len()) = T::default();
        }
    }
    len_i32(src.len())
}

/// Copy the longest prefix of `src` that leaves room for a terminator, then
/// terminate. Returns `src.len()`.
///
/// # Safety
/// `buf` must be null or valid for `cap` writes of `T`.
pub(crate) unsafe fn copy_truncated<T: Copy + Default>(src: &[T], buf: *mut T, cap: i32) -> i32 {
    let cap = capacity(cap);
    if !buf.is_null() && cap > 0 {
        let n = src.len().min(cap - 1);
        unsafe {
            std::ptr::copy_nonoverlapping(src.as_ptr(), buf, n);
            *buf.add(n) = T::default();
        }
    }
    len_i32(src.len())
}

/// Fit-or-report for a wide buffer, measured against the narrow text.
///
/// When `cap` does not exceed the narrow length, returns that length and
/// writes nothing. Otherwise writes the wide conversion plus a terminator
/// and returns the number of wide units written.
///
/// # Safety
/// `buf` must be null or valid for `cap` writes.
pub(crate) unsafe fn copy_wide_if_fits(narrow: &[u8], buf: *mut WideChar, cap: i32) -> i32 {
    if buf.is_null() || capacity(cap) <= narrow.len() {
        return len_i32(narrow.len());
    }
    let wide = encoding::to_wide(narrow);
    unsafe { copy_if_fits(&wide, buf, cap) }
}
