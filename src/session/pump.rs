use crate::mi::framer::LineFramer;
use std::io::{ErrorKind, Read};
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};

/// Process that produced a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSource {
    /// The debugger speaking the machine interface.
    Debugger,
    /// The debug probe server, mostly free-form diagnostics.
    Server,
}

impl LineSource {
    pub fn name(self) -> &'static str {
        match self {
            LineSource::Debugger => "debugger",
            LineSource::Server => "server",
        }
    }
}

/// Message from a reader thread to the dispatch loop.
#[derive(Debug, PartialEq)]
pub enum Input {
    Line(LineSource, String),
    /// The stream reached its end or failed.
    Closed(LineSource),
}

const READ_CHUNK: usize = 4096;

/// Read a stream until its end and send complete lines to `tx`.
/// Each stream has its own framer.
pub fn pump<R: Read>(source: LineSource, mut reader: R, tx: &Sender<Input>) {
    let mut framer = LineFramer::new();
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let n = match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                crate::mib_warn!(target: "session", "{} stream read error: {e}", source.name());
                break;
            }
        };

        for line in framer.feed(&chunk[..n]) {
            if tx.send(Input::Line(source, line)).is_err() {
                // dispatch loop is gone
                return;
            }
        }
    }

    if let Some(rest) = framer.finish() {
        _ = tx.send(Input::Line(source, rest));
    }
    _ = tx.send(Input::Closed(source));
}

/// Run [`pump`] in a dedicated thread.
pub fn spawn_reader<R>(
    source: LineSource,
    reader: R,
    tx: Sender<Input>,
) -> std::io::Result<JoinHandle<()>>
where
    R: Read + Send + 'static,
{
    thread::Builder::new()
        .name(format!("{}-reader", source.name()))
        .spawn(move || pump(source, reader, &tx))
}
