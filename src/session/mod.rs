//! Multiplexer between issued commands and the backend output.
//!
//! Lines from both processes are handled one at a time by a single dispatch
//! loop ([`Session::run`]). Result records complete pending commands, async and
//! stream records go to the [`EventHook`].

pub mod correlator;
pub mod pump;
pub mod router;

use crate::config::Config;
use crate::error::Error;
use crate::log::{trace_line, Direction};
use crate::mi::parser;
use crate::mi::record::{Record, ResultRecord};
use correlator::{Correlator, PendingResult};
use pump::{Input, LineSource};
use router::{EventHook, Router};
use std::io::Write;
use std::sync::mpsc::Receiver;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Something that runs a machine interface command and returns its result record.
pub trait Executor {
    fn execute(&self, command: &str) -> Result<ResultRecord, Error>;
}

pub struct Session<H: EventHook> {
    correlator: Mutex<Correlator>,
    writer: Mutex<Box<dyn Write + Send>>,
    router: Router<H>,
    timeout: Option<Duration>,
    trace: bool,
}

impl<H: EventHook> Session<H> {
    /// Create a session. Commands are written into `writer` (usually the
    /// debugger stdin).
    pub fn new(writer: impl Write + Send + 'static, hook: H) -> Self {
        Self {
            correlator: Mutex::new(Correlator::new()),
            writer: Mutex::new(Box::new(writer)),
            router: Router::new(hook),
            timeout: None,
            trace: false,
        }
    }

    pub fn with_config(writer: impl Write + Send + 'static, hook: H, config: &Config) -> Self {
        let mut session = Self::new(writer, hook);
        session.timeout = config.command_timeout();
        session.trace = config.trace_protocol;
        session
    }

    pub fn hook(&self) -> &H {
        self.router.hook()
    }

    /// Issue a command. The written line is `<token><text>\n`.
    pub fn issue_command(&self, text: &str) -> Result<PendingResult, Error> {
        let pending = self.correlator.lock().unwrap().issue()?;
        let line = format!("{}{}", pending.token(), text.trim_end());

        if self.trace {
            trace_line(Direction::Out, LineSource::Debugger.name(), &line);
        }

        let write_result = {
            let mut writer = self.writer.lock().unwrap();
            writeln!(writer, "{line}").and_then(|_| writer.flush())
        };
        if let Err(e) = write_result {
            self.correlator.lock().unwrap().cancel(pending.token());
            return Err(e.into());
        }

        Ok(pending)
    }

    /// Parse a line of debugger output and dispatch the record.
    pub fn submit_line(&self, line: &str) -> Option<Record> {
        self.submit(LineSource::Debugger, line)
    }

    /// Parse a line of `source` output and dispatch the record.
    /// Server lines that are not records are forwarded as server output.
    pub fn submit(&self, source: LineSource, line: &str) -> Option<Record> {
        if self.trace {
            trace_line(Direction::In, source.name(), line);
        }

        let Some((record, rest)) = parser::parse_prefix(line) else {
            match source {
                LineSource::Debugger => {
                    crate::mib_debug!(target: "mi", "not a record: {line}");
                }
                LineSource::Server => self.router.route_server_text(line),
            }
            return None;
        };
        if !rest.is_empty() {
            crate::mib_debug!(target: "mi", "unparsed rest of line: {rest}");
        }

        self.dispatch(&record);
        Some(record)
    }

    fn dispatch(&self, record: &Record) {
        match record {
            Record::Result(result) => match result.token {
                Some(token) => {
                    self.correlator
                        .lock()
                        .unwrap()
                        .complete(token, result.clone());
                }
                None => {
                    crate::mib_debug!(target: "session", "result record without token: {record}");
                }
            },
            Record::Async(r) => self.router.route_async(r),
            Record::Stream(r) => self.router.route_stream(r),
        }
    }

    /// Dispatch loop. Runs until the debugger stream is closed or all senders
    /// are dropped, then rejects commands that are still pending. Pending
    /// commands are rejected as well if a hook panics.
    pub fn run(&self, inputs: Receiver<Input>) {
        let _guard = CloseGuard(&self.correlator);
        for input in inputs {
            match input {
                Input::Line(source, line) => {
                    self.submit(source, &line);
                }
                Input::Closed(LineSource::Debugger) => {
                    crate::mib_info!(target: "session", "debugger stream closed");
                    break;
                }
                Input::Closed(LineSource::Server) => {
                    crate::mib_info!(target: "session", "server stream closed");
                }
            }
        }
    }

    pub fn close(&self) {
        self.correlator.lock().unwrap().close();
    }

    pub fn is_closed(&self) -> bool {
        self.correlator.lock().unwrap().is_closed()
    }

    pub fn pending_count(&self) -> usize {
        self.correlator.lock().unwrap().pending_count()
    }
}

/// Close the correlator when the dispatch loop ends, by return or by unwind.
struct CloseGuard<'a>(&'a Mutex<Correlator>);

impl Drop for CloseGuard<'_> {
    fn drop(&mut self) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .close();
    }
}

impl<H: EventHook> Executor for Session<H> {
    /// Issue a command and block until its result arrives. Must not be called
    /// from the dispatch loop thread.
    fn execute(&self, command: &str) -> Result<ResultRecord, Error> {
        let pending = self.issue_command(command)?;
        match self.timeout {
            Some(timeout) => pending.wait_timeout(timeout),
            None => pending.wait(),
        }
    }
}
