//! Request header accumulation.
//!
//! Lines are kept as raw bytes. A narrow caller may pass code-page text
//! that is not UTF-8, and those bytes reach the wire unchanged.

/// Split `text` on `delimiter`, always yielding at least one segment and
/// keeping the (possibly empty) segment after the final delimiter.
///
/// `"a\nb\n"` splits into `["a", "b", ""]` and `""` into `[""]`.
pub fn split_lines(text: &[u8], delimiter: u8) -> Vec<Vec<u8>> {
    text.split(|&b| b == delimiter).map(<[u8]>::to_vec).collect()
}

/// Ordered request header lines plus the list prepared for the transport.
///
/// Lines are stored exactly as given; duplicates are kept and syntax is not
/// checked. Empty lines survive until `prepare`, which skips them.
#[derive(Debug, Clone, Default)]
pub struct HeaderList {
    lines: Vec<Vec<u8>>,
    prepared: Option<Vec<Vec<u8>>>,
}

impl HeaderList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, line: impl Into<Vec<u8>>) {
        self.lines.push(line.into());
    }

    /// Split multi-line text on `\n` and add every segment.
    pub fn add_multiline(&mut self, text: &[u8]) {
        self.lines.extend(split_lines(text, b'\n'));
    }

    pub fn lines(&self) -> &[Vec<u8>] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Build the list handed to the transport: the stored lines followed by
    /// `extra`, skipping empty entries.
    ///
    /// Returns `None` when there is nothing to send. Any list prepared by an
    /// earlier execution is released first, so each execution builds its own.
    pub fn prepare(&mut self, extra: &[&str]) -> Option<&[Vec<u8>]> {
        self.prepared = None;
        if self.lines.is_empty() && extra.is_empty() {
            return None;
        }
        let list: Vec<Vec<u8>> = self
            .lines
            .iter()
            .map(Vec::as_slice)
            .chain(extra.iter().map(|line| line.as_bytes()))
            .filter(|line| !line.is_empty())
            .map(<[u8]>::to_vec)
            .collect();
        self.prepared = Some(list);
        self.prepared.as_deref()
    }

    /// The list built by the most recent `prepare`, if any.
    pub fn prepared(&self) -> Option<&[Vec<u8>]> {
        self.prepared.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(lines: &[Vec<u8>]) -> Vec<String> {
        lines.iter().map(|l| String::from_utf8_lossy(l).into_owned()).collect()
    }

    #[test]
    fn split_keeps_trailing_empty_segment() {
        assert_eq!(text(&split_lines(b"a\nb\n", b'\n')), ["a", "b", ""]);
    }

    #[test]
    fn split_empty_yields_one_empty_segment() {
        assert_eq!(text(&split_lines(b"", b'\n')), [""]);
    }

    #[test]
    fn split_without_delimiter_is_single_segment() {
        assert_eq!(text(&split_lines(b"X-One: 1", b'\n')), ["X-One: 1"]);
    }

    #[test]
    fn prepare_with_nothing_added_is_noop() {
        let mut headers = HeaderList::new();
        assert!(headers.prepare(&[]).is_none());
        assert!(headers.prepared().is_none());
    }

    #[test]
    fn prepare_preserves_order_and_duplicates_and_skips_empty() {
        let mut headers = HeaderList::new();
        headers.add("X-A: 1");
        headers.add_multiline(b"X-B: 2\n\nX-A: 1\n");
        assert_eq!(headers.lines().len(), 5);

        let prepared = headers.prepare(&["Expect:"]).unwrap();
        assert_eq!(text(prepared), ["X-A: 1", "X-B: 2", "X-A: 1", "Expect:"]);
    }

    #[test]
    fn extra_lines_do_not_accumulate_across_prepares() {
        let mut headers = HeaderList::new();
        headers.add("X-A: 1");
        headers.prepare(&["Expect:"]);
        let prepared = headers.prepare(&[]).unwrap();
        assert_eq!(text(prepared), ["X-A: 1"]);
    }

    #[test]
    fn code_page_bytes_are_kept_verbatim() {
        let mut headers = HeaderList::new();
        headers.add(b"X-Name: caf\xE9".as_slice());
        headers.add_multiline(b"X-A: \xE9\nX-B: 2");
        let prepared = headers.prepare(&[]).unwrap();
        assert_eq!(prepared[0], b"X-Name: caf\xE9");
        assert_eq!(prepared[1], b"X-A: \xE9");
        assert_eq!(prepared.len(), 3);
    }
}
