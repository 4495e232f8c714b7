use mibridge::config::Config;
use mibridge::mi::record::AsyncRecord;
use mibridge::session::pump::{Input, LineSource};
use mibridge::session::router::{EventHook, OutputKind, Progress};
use mibridge::session::Session;
use std::io::Write;
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Stopped(String, Option<u32>),
    Running(Option<u32>),
    Progress(u8),
    Output(OutputKind, String),
    Notify(String),
}

#[derive(Default)]
pub struct TestHook {
    events: Mutex<Vec<Event>>,
}

impl TestHook {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl EventHook for TestHook {
    fn on_stopped(&self, reason: &str, thread_id: Option<u32>) {
        self.push(Event::Stopped(reason.to_string(), thread_id));
    }

    fn on_running(&self, thread_id: Option<u32>) {
        self.push(Event::Running(thread_id));
    }

    fn on_progress(&self, progress: Progress) {
        self.push(Event::Progress(progress.percentage()));
    }

    fn on_output(&self, kind: OutputKind, text: &str) {
        self.push(Event::Output(kind, text.to_string()));
    }

    fn on_notify(&self, record: &AsyncRecord) {
        self.push(Event::Notify(record.class.clone()));
    }
}

/// Command text (without token) and the lines the fake debugger answers with.
/// Result records in a reply get the command token in front.
pub type Script = Vec<(&'static str, Vec<&'static str>)>;

/// Debugger stdin: complete lines go to the fake debugger thread.
struct LineWriter {
    buf: Vec<u8>,
    tx: Sender<String>,
}

impl Write for LineWriter {
    fn write(&mut self, bytes: &[u8]) -> std::io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line[..pos]).to_string();
            self.tx
                .send(line)
                .map_err(|_| std::io::Error::from(std::io::ErrorKind::BrokenPipe))?;
        }
        Ok(bytes.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// A session connected to a scripted debugger, with a running dispatch loop.
pub struct Bridge {
    pub session: Arc<Session<TestHook>>,
    /// Lines written to the debugger, tokens included.
    commands: Arc<Mutex<Vec<String>>>,
    inputs: Sender<Input>,
    dispatch: JoinHandle<()>,
}

impl Bridge {
    pub fn start(script: Script) -> Self {
        Self::start_with_config(script, &Config::default())
    }

    /// Commands missing from the script make the fake debugger close its
    /// output stream, like a crashed process.
    pub fn start_with_config(script: Script, config: &Config) -> Self {
        let (command_tx, command_rx) = mpsc::channel::<String>();
        let (input_tx, input_rx) = mpsc::channel();

        let writer = LineWriter {
            buf: vec![],
            tx: command_tx,
        };
        let session = Arc::new(Session::with_config(writer, TestHook::default(), config));
        let commands = Arc::new(Mutex::new(vec![]));

        {
            let commands = commands.clone();
            let inputs = input_tx.clone();
            let mut script = script;
            thread::spawn(move || {
                for line in command_rx {
                    commands.lock().unwrap().push(line.clone());

                    let digits = line.chars().take_while(char::is_ascii_digit).count();
                    let (token, command) = line.split_at(digits);
                    let Some(pos) = script.iter().position(|(c, _)| *c == command) else {
                        _ = inputs.send(Input::Closed(LineSource::Debugger));
                        return;
                    };
                    let (_, replies) = script.remove(pos);
                    for reply in replies {
                        let reply = if reply.starts_with('^') {
                            format!("{token}{reply}")
                        } else {
                            reply.to_string()
                        };
                        _ = inputs.send(Input::Line(LineSource::Debugger, reply));
                    }
                }
            });
        }

        let dispatch = {
            let session = session.clone();
            thread::spawn(move || session.run(input_rx))
        };

        Self {
            session,
            commands,
            inputs: input_tx,
            dispatch,
        }
    }

    /// Feed a line as if the given process printed it.
    pub fn emit(&self, source: LineSource, line: &str) {
        self.inputs
            .send(Input::Line(source, line.to_string()))
            .unwrap();
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    /// Close the debugger stream and wait for the dispatch loop to finish.
    pub fn shutdown(self) -> Arc<Session<TestHook>> {
        _ = self.inputs.send(Input::Closed(LineSource::Debugger));
        self.dispatch.join().unwrap();
        self.session
    }
}
