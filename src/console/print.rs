use rustyline::history::History;
use rustyline::{Editor, ExternalPrinter as RLExternalPrinter, Helper};
use std::sync::Mutex;

/// [`ExternalPrinter`] prints messages to stdout without breaking the prompt.
pub struct ExternalPrinter {
    printer: Mutex<Box<dyn RLExternalPrinter>>,
}

// the rustyline printer is only reached through the mutex
unsafe impl Send for ExternalPrinter {}
unsafe impl Sync for ExternalPrinter {}

impl ExternalPrinter {
    pub fn new<H: Helper, I: History>(editor: &mut Editor<H, I>) -> rustyline::Result<Self> {
        let external_p = editor.create_external_printer()?;
        Ok(Self {
            printer: Mutex::new(Box::new(external_p)),
        })
    }

    pub fn print(&self, msg: impl Into<String>) {
        let mut printer = self.printer.lock().unwrap();
        if let Err(e) = printer.print(msg.into()) {
            eprintln!("external printer error: {e:#}");
        }
    }
}
