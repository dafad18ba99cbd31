//! Accumulation of everything a transfer streams back.
//!
//! # Design
//! The body is consumed with pull semantics: the caller drains it through a
//! read cursor in pieces no larger than its buffer, while `body_size` keeps
//! reporting the total accumulated so far regardless of the cursor. Response
//! headers and trace text are read by snapshot instead and never consumed.
//!
//! Nothing here is cleared between transfers unless the owner asks for it;
//! a second transfer on the same handle appends.

use crate::encoding;
use crate::http::InfoType;
use crate::trace::{self, DumpMode};

#[derive(Debug, Clone, Default)]
pub struct ResponseSink {
    body: Vec<u8>,
    cursor: usize,
    headers: Vec<String>,
    trace: Vec<u8>,
}

impl ResponseSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a body chunk. Always accepts the whole chunk.
    pub fn on_body_chunk(&mut self, chunk: &[u8]) -> usize {
        self.body.extend_from_slice(chunk);
        chunk.len()
    }

    /// Capture one raw response header line.
    ///
    /// Lines without a colon (status line, blank separator) are ignored.
    /// Trailing CR/LF bytes are stripped from captured lines. Returns the
    /// full input length in every case.
    pub fn on_header_line(&mut self, line: &[u8]) -> usize {
        if line.contains(&b':') {
            let end = line
                .iter()
                .rposition(|&b| b != b'\r' && b != b'\n')
                .map_or(0, |last| last + 1);
            if end > 0 {
                self.headers
                    .push(String::from_utf8_lossy(&line[..end]).into_owned());
            }
        }
        line.len()
    }

    /// Render one trace event into the trace buffer.
    pub fn on_trace_event(&mut self, kind: InfoType, data: &[u8], mode: DumpMode) {
        let Some(line) = trace::event_line(kind, data) else {
            return;
        };
        self.trace.extend_from_slice(line.as_bytes());
        if kind != InfoType::Text {
            trace::dump(&mut self.trace, data, mode);
        }
    }

    /// Drain up to `buf.len()` unread body bytes into `buf`.
    pub fn read_body(&mut self, buf: &mut [u8]) -> usize {
        let unread = &self.body[self.cursor..];
        let n = unread.len().min(buf.len());
        buf[..n].copy_from_slice(&unread[..n]);
        self.cursor += n;
        n
    }

    /// Drain whole characters of unread body text whose UTF-16 length
    /// totals at most `max_units`.
    ///
    /// The cursor advances only past the bytes actually decoded. Returns an
    /// empty string without draining when the next character alone needs
    /// more than `max_units`.
    pub fn read_body_text(&mut self, max_units: usize) -> String {
        let mut text = String::new();
        let mut units = 0;
        while let Some((ch, len)) = encoding::decode_char(&self.body[self.cursor..]) {
            if units + ch.len_utf16() > max_units {
                break;
            }
            units += ch.len_utf16();
            text.push(ch);
            self.cursor += len;
        }
        text
    }

    /// Total body bytes accumulated, independent of how much was drained.
    pub fn body_size(&self) -> usize {
        self.body.len()
    }

    pub fn unread_body(&self) -> usize {
        self.body.len() - self.cursor
    }

    /// The whole accumulated body, ignoring the read cursor.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn header_count(&self) -> usize {
        self.headers.len()
    }

    pub fn header(&self, index: usize) -> Option<&str> {
        self.headers.get(index).map(String::as_str)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn trace_size(&self) -> usize {
        self.trace.len()
    }

    pub fn trace(&self) -> &[u8] {
        &self.trace
    }

    pub fn clear(&mut self) {
        self.body.clear();
        self.cursor = 0;
        self.headers.clear();
        self.trace.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sink_with_body(body: &[u8]) -> ResponseSink {
        let mut sink = ResponseSink::new();
        assert_eq!(sink.on_body_chunk(body), body.len());
        sink
    }

    #[test]
    fn body_chunks_append_including_empty() {
        let mut sink = ResponseSink::new();
        assert_eq!(sink.on_body_chunk(b"he"), 2);
        assert_eq!(sink.on_body_chunk(b""), 0);
        assert_eq!(sink.on_body_chunk(b"llo"), 3);
        assert_eq!(sink.body(), b"hello");
    }

    #[test]
    fn read_body_drains_in_capacity_sized_pieces() {
        let mut sink = sink_with_body(b"0123456789");
        let mut buf = [0u8; 4];
        let mut collected = Vec::new();
        let mut sizes = Vec::new();
        loop {
            let n = sink.read_body(&mut buf);
            if n == 0 {
                break;
            }
            sizes.push(n);
            collected.extend_from_slice(&buf[..n]);
        }
        assert_eq!(sizes, vec![4, 4, 2]);
        assert_eq!(collected, b"0123456789");
        assert_eq!(sink.read_body(&mut buf), 0);
    }

    #[test]
    fn body_size_ignores_read_cursor() {
        let mut sink = sink_with_body(b"abcdef");
        let mut buf = [0u8; 4];
        sink.read_body(&mut buf);
        assert_eq!(sink.body_size(), 6);
        assert_eq!(sink.unread_body(), 2);
    }

    #[test]
    fn read_body_text_counts_utf16_units() {
        let mut sink = sink_with_body("a€b".as_bytes());
        assert_eq!(sink.read_body_text(2), "a€");
        assert_eq!(sink.read_body_text(10), "b");
        assert_eq!(sink.read_body_text(10), "");
    }

    #[test]
    fn read_body_text_fills_small_buffers_completely() {
        let mut sink = sink_with_body("€€".as_bytes());
        assert_eq!(sink.read_body_text(2), "€€");
        assert_eq!(sink.read_body_text(2), "");

        let mut sink = sink_with_body("€€".as_bytes());
        assert_eq!(sink.read_body_text(1), "€");
        assert_eq!(sink.read_body_text(1), "€");
        assert_eq!(sink.read_body_text(1), "");
    }

    #[test]
    fn read_body_text_leaves_oversized_character_unread() {
        let mut sink = sink_with_body("😀x".as_bytes());
        assert_eq!(sink.read_body_text(1), "");
        assert_eq!(sink.unread_body(), 5);
        assert_eq!(sink.read_body_text(2), "😀");
        assert_eq!(sink.read_body_text(0), "");
        assert_eq!(sink.read_body_text(1), "x");
    }

    #[test]
    fn read_body_text_replaces_invalid_bytes() {
        let mut sink = sink_with_body(&[b'a', 0xFF, 0xE2, 0x82]);
        assert_eq!(sink.read_body_text(10), "a\u{FFFD}\u{FFFD}");
        assert_eq!(sink.unread_body(), 0);
    }

    #[test]
    fn header_line_is_trimmed_and_captured() {
        let mut sink = ResponseSink::new();
        let line = b"Content-Type: text/plain\r\n";
        assert_eq!(sink.on_header_line(line), line.len());
        assert_eq!(sink.header(0), Some("Content-Type: text/plain"));
    }

    #[test]
    fn header_line_without_colon_is_ignored() {
        let mut sink = ResponseSink::new();
        sink.on_header_line(b"HTTP/1.1 200 OK\r\n");
        sink.on_header_line(b"\r\n");
        assert_eq!(sink.header_count(), 0);
    }

    #[test]
    fn header_line_with_bare_colon_is_kept() {
        let mut sink = ResponseSink::new();
        sink.on_header_line(b"X-Empty:\r\n");
        sink.on_header_line(b":\n");
        assert_eq!(sink.headers(), ["X-Empty:", ":"]);
    }

    #[test]
    fn header_out_of_range_is_none() {
        let sink = ResponseSink::new();
        assert!(sink.header(0).is_none());
    }

    #[test]
    fn trace_text_has_no_dump() {
        let mut sink = ResponseSink::new();
        sink.on_trace_event(InfoType::Text, b"hello\n", DumpMode::Hex);
        assert_eq!(sink.trace(), b"= Info.........: hello\n");
    }

    #[test]
    fn trace_data_is_dumped_when_requested() {
        let mut sink = ResponseSink::new();
        sink.on_trace_event(InfoType::DataIn, b"ok", DumpMode::Ascii);
        assert_eq!(sink.trace(), b"< Recv data....: (2 bytes)\n0000: ok\n");
    }

    #[test]
    fn unknown_trace_kind_is_ignored() {
        let mut sink = ResponseSink::new();
        sink.on_trace_event(InfoType::Other, b"ok", DumpMode::Hex);
        assert_eq!(sink.trace_size(), 0);
    }

    #[test]
    fn clear_resets_everything() {
        let mut sink = sink_with_body(b"abc");
        sink.on_header_line(b"A: b\r\n");
        sink.on_trace_event(InfoType::Text, b"x", DumpMode::None);
        let mut buf = [0u8; 1];
        sink.read_body(&mut buf);
        sink.clear();
        assert_eq!(sink.body_size(), 0);
        assert_eq!(sink.unread_body(), 0);
        assert_eq!(sink.header_count(), 0);
        assert_eq!(sink.trace_size(), 0);
    }
}
