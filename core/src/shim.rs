//! Callback adapters that route transport callbacks into a response sink.

use crate::http::InfoType;
use crate::sink::ResponseSink;
use crate::trace::DumpMode;
use crate::transport::TransferHandler;

/// Borrowed view of a handle's sink for the duration of one transfer.
pub struct SinkHandler<'a> {
    sink: &'a mut ResponseSink,
    dump: DumpMode,
}

impl<'a> SinkHandler<'a> {
    pub fn new(sink: &'a mut ResponseSink, debug_level: i32) -> Self {
        Self {
            sink,
            dump: DumpMode::for_level(debug_level),
        }
    }
}

impl TransferHandler for SinkHandler<'_> {
    fn write(&mut self, data: &[u8]) -> usize {
        self.sink.on_body_chunk(data)
    }

    fn header(&mut self, line: &[u8]) -> usize {
        self.sink.on_header_line(line)
    }

    fn debug(&mut self, kind: InfoType, data: &[u8]) {
        self.sink.on_trace_event(kind, data, self.dump);
    }
}
