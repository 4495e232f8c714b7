use crate::console::print::ExternalPrinter;
use crate::mi::escape::unescape;
use crate::session::router::{EventHook, OutputKind, Progress};
use crossterm::style::Stylize;

/// Prints backend events above the prompt.
pub struct ConsoleHook {
    printer: ExternalPrinter,
}

impl ConsoleHook {
    pub fn new(printer: ExternalPrinter) -> Self {
        Self { printer }
    }
}

fn thread_suffix(thread_id: Option<u32>) -> String {
    thread_id
        .map(|id| format!(" (thread {id})"))
        .unwrap_or_default()
}

fn stopped_message(reason: &str, thread_id: Option<u32>) -> String {
    format!(
        "{} {reason}{}",
        "stopped:".yellow(),
        thread_suffix(thread_id)
    )
}

fn running_message(thread_id: Option<u32>) -> String {
    match thread_id {
        None => "running all threads".green().to_string(),
        Some(id) => format!("{}{}", "running".green(), thread_suffix(Some(id))),
    }
}

/// Text to print for a stream record, `None` if nothing is left to show.
fn output_message(kind: OutputKind, text: &str) -> Option<String> {
    let text = match kind {
        OutputKind::Server => text.to_string(),
        _ => unescape(text),
    };
    let text = text.trim_end_matches(['\n', '\r']);
    if text.is_empty() {
        return None;
    }

    Some(match kind {
        OutputKind::Console => text.to_string(),
        OutputKind::Target => text.cyan().to_string(),
        OutputKind::Log => text.dark_grey().to_string(),
        OutputKind::Server => format!("{} {text}", "server:".magenta()),
    })
}

impl EventHook for ConsoleHook {
    fn on_stopped(&self, reason: &str, thread_id: Option<u32>) {
        self.printer.print(stopped_message(reason, thread_id));
    }

    fn on_running(&self, thread_id: Option<u32>) {
        self.printer.print(running_message(thread_id));
    }

    fn on_progress(&self, progress: Progress) {
        self.printer
            .print(format!("download {}%", progress.percentage()));
    }

    fn on_output(&self, kind: OutputKind, text: &str) {
        if let Some(msg) = output_message(kind, text) {
            self.printer.print(msg);
        }
    }
}
