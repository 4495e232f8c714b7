use crate::mi::record::{AsyncKind, AsyncRecord, StreamKind, StreamRecord};

pub const STOP_REASON_STEP: &str = "step";
pub const STOP_REASON_BREAKPOINT: &str = "breakpoint";
pub const STOP_REASON_STEP_OUT: &str = "step-out";
pub const STOP_REASON_USER_REQUEST: &str = "user-request";
pub const STOP_REASON_UNKNOWN: &str = "unknown";

/// Translate a backend stop reason into the front end vocabulary.
/// Unknown reasons pass through unchanged.
pub fn stop_reason(backend_reason: &str) -> &str {
    match backend_reason {
        "end-stepping-range" => STOP_REASON_STEP,
        "breakpoint-hit" => STOP_REASON_BREAKPOINT,
        "function-finished" => STOP_REASON_STEP_OUT,
        "signal-received" => STOP_REASON_USER_REQUEST,
        other => other,
    }
}

/// Channel of a forwarded output text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Console,
    Target,
    Log,
    /// Raw text of the probe server process.
    Server,
}

impl From<StreamKind> for OutputKind {
    fn from(kind: StreamKind) -> Self {
        match kind {
            StreamKind::Console => OutputKind::Console,
            StreamKind::Target => OutputKind::Target,
            StreamKind::Log => OutputKind::Log,
        }
    }
}

/// Download progress of a `+download` status record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub sent: u64,
    pub total: u64,
}

impl Progress {
    pub fn percentage(&self) -> u8 {
        let sent = self.sent.min(self.total) as u128;
        (sent * 100 / self.total.max(1) as u128) as u8
    }
}

/// Callbacks for unsolicited backend events.
///
/// Hooks are called from the dispatch loop, they must not block. Issuing a new
/// command from a hook is fine, waiting for its result is not.
pub trait EventHook: Send + Sync {
    /// Execution stopped. `thread_id` is `None` if the backend doesn't name a thread.
    fn on_stopped(&self, reason: &str, thread_id: Option<u32>);

    /// Execution resumed. `thread_id` is `None` when all threads run.
    fn on_running(&self, thread_id: Option<u32>);

    fn on_progress(&self, progress: Progress);

    /// Stream text, escape sequences are not decoded.
    fn on_output(&self, kind: OutputKind, text: &str);

    /// Notify records (`=...`), ignored by default.
    fn on_notify(&self, _record: &AsyncRecord) {}
}

/// Dispatch of async and stream records to an [`EventHook`].
pub struct Router<H: EventHook> {
    hook: H,
}

impl<H: EventHook> Router<H> {
    pub fn new(hook: H) -> Self {
        Self { hook }
    }

    pub fn hook(&self) -> &H {
        &self.hook
    }

    pub fn route_async(&self, record: &AsyncRecord) {
        let thread_id = || {
            record
                .results
                .get_str("thread-id")
                .and_then(|id| id.parse::<u32>().ok())
        };

        match (record.kind, record.class.as_str()) {
            (AsyncKind::Exec, "stopped") => {
                let reason = record
                    .results
                    .get_str("reason")
                    .map(stop_reason)
                    .unwrap_or(STOP_REASON_UNKNOWN);
                self.hook.on_stopped(reason, thread_id());
            }
            (AsyncKind::Exec, "running") => self.hook.on_running(thread_id()),
            (AsyncKind::Status, "download") => {
                let field = |name| {
                    record
                        .results
                        .get_str(name)
                        .and_then(|v| v.parse::<u64>().ok())
                        .filter(|v| *v != 0)
                };
                if let (Some(sent), Some(total)) = (field("total-sent"), field("total-size")) {
                    self.hook.on_progress(Progress { sent, total });
                }
            }
            (AsyncKind::Notify, _) => self.hook.on_notify(record),
            (kind, class) => {
                crate::mib_debug!(target: "session", "unhandled async record {kind:?} {class}");
            }
        }
    }

    pub fn route_stream(&self, record: &StreamRecord) {
        self.hook.on_output(record.kind.into(), &record.content);
    }

    pub fn route_server_text(&self, line: &str) {
        self.hook.on_output(OutputKind::Server, line);
    }
}
