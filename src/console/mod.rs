use crate::config::Config;
use crate::console::command::Command;
use crate::console::help::HELP;
use crate::console::hook::ConsoleHook;
use crate::console::print::ExternalPrinter;
use crate::mi::record::Record;
use crate::session::pump::{spawn_reader, LineSource};
use crate::session::{Executor, Session};
use crate::varobj::handle::{VarHandle, VarScope};
use crate::varobj::VarCache;
use crossterm::style::Stylize;
use rustyline::error::ReadlineError;
use rustyline::history::MemHistory;
use rustyline::{Config as EditorConfig, Editor};
use std::io::{Read, Write};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::Arc;
use std::thread;

pub mod command;
mod help;
pub mod hook;
pub mod print;

const WELCOME_TEXT: &str = r#"
mib: machine interface bridge, type help for list of commands
"#;
const PROMT: &str = "(mib) ";

type MibEditor = Editor<(), MemHistory>;

fn create_editor() -> rustyline::Result<MibEditor> {
    let config = EditorConfig::builder().auto_add_history(false).build();
    Editor::with_history(config, MemHistory::new())
}

pub struct AppBuilder {
    config: Config,
    server_out: Option<Box<dyn Read + Send>>,
    keep_logs: bool,
}

impl AppBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            server_out: None,
            keep_logs: true,
        }
    }

    /// Show output of a probe server next to the debugger output.
    pub fn with_server(self, server_out: impl Read + Send + 'static) -> Self {
        Self {
            server_out: Some(Box::new(server_out)),
            ..self
        }
    }

    /// Silence logs while the prompt is active.
    pub fn quiet(self) -> Self {
        Self {
            keep_logs: false,
            ..self
        }
    }

    /// Wire debugger streams into a session and start the dispatch loop.
    pub fn build(
        self,
        debugger_in: impl Write + Send + 'static,
        debugger_out: impl Read + Send + 'static,
    ) -> anyhow::Result<TerminalApplication> {
        let (control_tx, control_rx) = mpsc::sync_channel::<Control>(0);
        let mut editor = create_editor()?;

        let hook = ConsoleHook::new(ExternalPrinter::new(&mut editor)?);
        let session = Arc::new(Session::with_config(debugger_in, hook, &self.config));

        let (input_tx, input_rx) = mpsc::channel();
        spawn_reader(LineSource::Debugger, debugger_out, input_tx.clone())?;
        if let Some(server_out) = self.server_out {
            spawn_reader(LineSource::Server, server_out, input_tx)?;
        }

        {
            let session = Arc::clone(&session);
            thread::Builder::new()
                .name("dispatch".to_string())
                .spawn(move || session.run(input_rx))?;
        }

        Ok(TerminalApplication {
            session,
            cache: VarCache::new(self.config.reference_base),
            editor,
            keep_logs: self.keep_logs,
            control_tx,
            control_rx,
        })
    }
}

enum Control {
    Cmd(String),
    Terminate,
}

pub struct TerminalApplication {
    session: Arc<Session<ConsoleHook>>,
    cache: VarCache,
    editor: MibEditor,
    keep_logs: bool,
    control_tx: SyncSender<Control>,
    control_rx: Receiver<Control>,
}

impl TerminalApplication {
    pub fn run(mut self) -> anyhow::Result<()> {
        if !self.keep_logs {
            crate::log::disable();
        }

        let app_loop = AppLoop {
            session: self.session,
            cache: self.cache,
            control_rx: self.control_rx,
            printer: ExternalPrinter::new(&mut self.editor)?,
        };

        let mut editor = self.editor;
        {
            let control_tx = self.control_tx;
            thread::spawn(move || {
                println!("{WELCOME_TEXT}");
                loop {
                    let line = editor.readline(PROMT);
                    match line {
                        Ok(input) => {
                            if input == "q" || input == "quit" {
                                _ = control_tx.send(Control::Terminate);
                                break;
                            } else {
                                _ = editor.add_history_entry(&input);
                                _ = control_tx.send(Control::Cmd(input));
                            }
                        }
                        Err(ReadlineError::Eof | ReadlineError::Interrupted) => {
                            _ = control_tx.send(Control::Terminate);
                            break;
                        }
                        Err(err) => {
                            println!("error: {:#}", err);
                            _ = control_tx.send(Control::Terminate);
                            break;
                        }
                    }
                }
            });
        }

        app_loop.run();
        crate::log::enable();

        Ok(())
    }
}

struct AppLoop {
    session: Arc<Session<ConsoleHook>>,
    cache: VarCache,
    control_rx: Receiver<Control>,
    printer: ExternalPrinter,
}

fn render_handle(handle: &VarHandle) -> String {
    let reference = if handle.has_children() {
        format!(" [{} children, ref {}]", handle.child_count, handle.reference_number())
    } else {
        String::new()
    };
    format!(
        "{} {} = {} ({}){reference}",
        handle.name.clone().dark_grey(),
        handle.display_name.clone().bold(),
        handle.value,
        handle.type_name.clone().green(),
    )
}

impl AppLoop {
    fn handle_command(&mut self, cmd: &str) -> anyhow::Result<()> {
        match Command::parse(cmd)? {
            Command::Mi(text) => {
                let result = self.session.execute(&text)?;
                self.printer.print(Record::Result(result).to_string());
            }
            Command::CreateVar { name, expression } => {
                let handle =
                    self.cache
                        .create(&*self.session, &name, &expression, VarScope::default())?;
                self.printer.print(render_handle(&handle));
            }
            Command::Children(name) => {
                let children = self.cache.list_children(&*self.session, &name)?;
                if children.is_empty() {
                    self.printer.print("no children");
                }
                children
                    .iter()
                    .for_each(|child| self.printer.print(format!("  {}", render_handle(child))));
            }
            Command::SetFormat { name, format } => {
                let value = self.cache.set_format(&*self.session, &name, format)?;
                self.printer.print(format!("{name} = {value}"));
            }
            Command::Assign { name, expression } => {
                let value = self.cache.assign(&*self.session, &name, &expression)?;
                self.printer.print(format!("{name} = {value}"));
            }
            Command::Update => {
                for change in self.cache.bulk_update(&*self.session)? {
                    let mut line = match change.value {
                        Some(value) => format!("{} = {value}", change.name),
                        None => change.name,
                    };
                    if !change.in_scope {
                        line.push_str(&" (out of scope)".yellow().to_string());
                    }
                    if change.type_changed {
                        line.push_str(&" (type changed)".yellow().to_string());
                    }
                    self.printer.print(line);
                }
            }
            Command::Help => self.printer.print(HELP),
            Command::SkipInput => {}
        }

        Ok(())
    }

    fn run(mut self) {
        loop {
            let Ok(action) = self.control_rx.recv() else {
                break;
            };

            match action {
                Control::Cmd(command) => {
                    if let Err(e) = self.handle_command(&command) {
                        self.printer.print(format!("error: {:#}", e));
                    }
                }
                Control::Terminate => {
                    _ = self.session.issue_command("-gdb-exit");
                    break;
                }
            }
        }
    }
}
