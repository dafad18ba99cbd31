//! Rendering of transport trace events into text.

use crate::http::InfoType;

/// Bytes per row of the hex-and-ASCII dump.
pub const HEX_WIDTH: usize = 32;
/// Bytes per row of the ASCII-only dump.
pub const ASCII_WIDTH: usize = 120;

/// Payload rendering selected by the handle's debug level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpMode {
    /// Event prefixes only.
    None,
    /// ASCII rendering, rows broken at CRLF.
    Ascii,
    /// Hex bytes followed by their ASCII rendering.
    Hex,
}

impl DumpMode {
    pub fn for_level(level: i32) -> Self {
        match level {
            i32::MIN..=1 => DumpMode::None,
            2 => DumpMode::Ascii,
            _ => DumpMode::Hex,
        }
    }
}

/// One-line prefix for an event, or `None` for kinds that are not rendered.
///
/// Informational text is emitted verbatim after its prefix; all other kinds
/// report only the byte count.
pub fn event_line(kind: InfoType, data: &[u8]) -> Option<String> {
    let label = match kind {
        InfoType::Text => {
            return Some(format!("= Info.........: {}", String::from_utf8_lossy(data)));
        }
        InfoType::HeaderOut => "> Send header..",
        InfoType::DataOut => "> Send data....",
        InfoType::SslDataOut => "> Send SSL data",
        InfoType::HeaderIn => "< Recv header..",
        InfoType::DataIn => "< Recv data....",
        InfoType::SslDataIn => "< Recv SSL data",
        InfoType::Other => return None,
    };
    Some(format!("{label}: ({} bytes)\n", data.len()))
}

fn printable(byte: u8) -> char {
    if (0x20..0x80).contains(&byte) {
        byte as char
    } else {
        '.'
    }
}

/// Append a dump of `data` to `out`, each row prefixed with its offset.
pub fn dump(out: &mut Vec<u8>, data: &[u8], mode: DumpMode) {
    let nohex = match mode {
        DumpMode::None => return,
        DumpMode::Ascii => true,
        DumpMode::Hex => false,
    };
    let width = if nohex { ASCII_WIDTH } else { HEX_WIDTH };
    let size = data.len();
    let is_crlf = |at: usize| at + 1 < size && data[at] == b'\r' && data[at + 1] == b'\n';

    let mut i = 0;
    while i < size {
        out.extend_from_slice(format!("{i:04x}: ").as_bytes());

        if !nohex {
            for c in 0..width {
                match data.get(i + c) {
                    Some(byte) => out.extend_from_slice(format!("{byte:02x} ").as_bytes()),
                    None => out.extend_from_slice(b"   "),
                }
            }
        }

        let mut next = i + width;
        let mut c = 0;
        while c < width && i + c < size {
            if nohex && is_crlf(i + c) {
                next = i + c + 2;
                break;
            }
            out.push(printable(data[i + c]) as u8);
            // A CRLF right after this byte ends the row without an extra blank line.
            if nohex && is_crlf(i + c + 1) {
                next = i + c + 3;
                break;
            }
            c += 1;
        }
        out.push(b'\n');
        i = next;
    }
}
