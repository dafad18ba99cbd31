//! Conversion between narrow (UTF-8 bytes) and wide (UTF-16 units) text.
//!
//! Wide strings are UTF-16 because that is what `wchar_t` is on the platform
//! the scripting terminal runs on. Invalid input never fails a conversion; it
//! is replaced with U+FFFD, and every replacement occupies at most as many
//! output units as the input it replaces.

/// A single wide character unit.
pub type WideChar = u16;

/// Convert narrow bytes to wide units. Empty input yields an empty result.
pub fn to_wide(narrow: &[u8]) -> Vec<WideChar> {
    if narrow.is_empty() {
        return Vec::new();
    }
    let text = String::from_utf8_lossy(narrow);
    let mut wide = Vec::with_capacity(text.encode_utf16().count());
    wide.extend(text.encode_utf16());
    wide
}

/// Convert wide units to a narrow string.
pub fn to_narrow(wide: &[WideChar]) -> String {
    String::from_utf16_lossy(wide)
}

/// Decode the first character of `bytes` and report how many bytes it
/// spans.
///
/// An invalid or truncated sequence decodes as U+FFFD covering the bytes
/// the decoder rejected. Returns `None` for empty input.
pub fn decode_char(bytes: &[u8]) -> Option<(char, usize)> {
    let window = &bytes[..bytes.len().min(4)];
    let valid = match std::str::from_utf8(window) {
        Ok(s) => s,
        Err(e) if e.valid_up_to() > 0 => std::str::from_utf8(&window[..e.valid_up_to()]).ok()?,
        Err(e) => return Some((char::REPLACEMENT_CHARACTER, e.error_len().unwrap_or(window.len()))),
    };
    let ch = valid.chars().next()?;
    Some((ch, ch.len_utf8()))
}
