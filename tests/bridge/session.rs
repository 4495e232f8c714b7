use crate::common::{Bridge, Event, TestHook};
use mibridge::config::Config;
use mibridge::error::Error;
use mibridge::mi::record::{Record, ResultClass, Token};
use mibridge::session::pump::{Input, LineSource};
use mibridge::session::router::{EventHook, OutputKind, Progress};
use mibridge::session::{Executor, Session};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

#[test]
fn test_execute_round_trip() {
    let bridge = Bridge::start(vec![(
        "-break-insert main",
        vec![
            r#"=breakpoint-created,bkpt={number="1"}"#,
            r#"^done,bkpt={number="1",type="breakpoint",func="main"}"#,
        ],
    )]);

    let record = bridge.session.execute("-break-insert main").unwrap();
    assert_eq!(record.token, Some(Token(1)));
    assert_eq!(record.class, ResultClass::Done);
    let bkpt = record.results.get("bkpt").unwrap().as_tuple().unwrap();
    assert_eq!(bkpt.get_str("func"), Some("main"));

    assert_eq!(bridge.commands(), vec!["1-break-insert main"]);
    assert_eq!(
        bridge.session.hook().events(),
        vec![Event::Notify("breakpoint-created".to_string())]
    );

    let session = bridge.shutdown();
    assert!(session.is_closed());
}

#[test]
fn test_execution_events() {
    let bridge = Bridge::start(vec![
        (
            "-exec-run",
            vec![
                "^running",
                r#"*running,thread-id="all""#,
                r#"~"Starting program\n""#,
                "(gdb) ",
                r#"*stopped,reason="breakpoint-hit",disp="keep",bkptno="1",thread-id="1",frame={func="main"}"#,
            ],
        ),
        ("-thread-info", vec!["^done,threads=[]"]),
    ]);

    let record = bridge.session.execute("-exec-run").unwrap();
    assert_eq!(record.class, ResultClass::Running);

    // the dispatch loop handles lines in order, events before this result are delivered
    bridge.session.execute("-thread-info").unwrap();

    assert_eq!(
        bridge.session.hook().events(),
        vec![
            Event::Running(None),
            Event::Output(OutputKind::Console, r"Starting program\n".to_string()),
            Event::Stopped("breakpoint".to_string(), Some(1)),
        ]
    );
    assert_eq!(bridge.commands(), vec!["1-exec-run", "2-thread-info"]);
}

#[test]
fn test_backend_error() {
    let bridge = Bridge::start(vec![(
        "-break-insert nowhere",
        vec![r#"^error,msg="Function \"nowhere\" not defined.""#],
    )]);

    let err = bridge
        .session
        .execute("-break-insert nowhere")
        .unwrap_err();
    assert!(!err.is_fatal());
    assert!(matches!(err, Error::Backend(msg) if msg == r#"Function \"nowhere\" not defined."#));
    assert_eq!(bridge.session.pending_count(), 0);
}

#[test]
fn test_stream_closed() {
    let bridge = Bridge::start(vec![]);

    let err = bridge.session.execute("-exec-continue").unwrap_err();
    assert!(matches!(err, Error::SessionClosed));
    assert!(err.is_fatal());

    assert!(bridge.session.is_closed());
    assert!(matches!(
        bridge.session.issue_command("-exec-next"),
        Err(Error::SessionClosed)
    ));
}

#[test]
fn test_command_timeout() {
    let config = Config {
        command_timeout_ms: Some(300),
        ..Config::default()
    };
    let bridge = Bridge::start_with_config(
        vec![
            ("-target-download", vec![]),
            ("-data-evaluate-expression 1", vec![r#"^done,value="1""#]),
        ],
        &config,
    );

    let err = bridge.session.execute("-target-download").unwrap_err();
    assert!(matches!(err, Error::Timeout(Token(1))));
    assert_eq!(bridge.session.pending_count(), 0);

    // a late result for a timed out command is dropped
    bridge.emit(LineSource::Debugger, "1^done");

    let record = bridge
        .session
        .execute("-data-evaluate-expression 1")
        .unwrap();
    assert_eq!(record.token, Some(Token(2)));
    assert_eq!(record.results.get_str("value"), Some("1"));
}

#[test]
fn test_server_output_and_progress() {
    let bridge = Bridge::start(vec![("-target-select extended-remote :3333", vec!["^connected"])]);

    bridge.emit(
        LineSource::Server,
        "Info : Listening on port 3333 for gdb connections",
    );
    bridge.emit(
        LineSource::Debugger,
        r#"+download,{section=".text",section-sent="512",section-size="1024",total-sent="512",total-size="2048"}"#,
    );

    let record = bridge
        .session
        .execute("-target-select extended-remote :3333")
        .unwrap();
    assert_eq!(record.class, ResultClass::Connected);

    assert_eq!(
        bridge.session.hook().events(),
        vec![
            Event::Output(
                OutputKind::Server,
                "Info : Listening on port 3333 for gdb connections".to_string()
            ),
            Event::Progress(25),
        ]
    );
}

#[test]
fn test_out_of_order_results() {
    let session = Session::new(std::io::sink(), TestHook::default());

    let first = session.issue_command("-stack-list-frames").unwrap();
    let second = session.issue_command("-thread-info").unwrap();
    let third = session.issue_command("-bogus").unwrap();
    assert_eq!(
        (first.token(), second.token(), third.token()),
        (Token(1), Token(2), Token(3))
    );
    assert_eq!(session.pending_count(), 3);

    assert!(session.submit_line("(gdb) ").is_none());
    assert!(matches!(
        session.submit_line(r#"3^error,msg="Undefined MI command: bogus""#),
        Some(Record::Result(_))
    ));
    session.submit_line("2^done,threads=[]");
    session.submit_line(r#"1^done,stack=[frame={level="0",func="main"}]"#);
    session.submit_line("7^done");

    assert!(matches!(third.try_take(), Some(Err(Error::Backend(_)))));
    assert!(second.try_take().unwrap().is_ok());
    let stack = first.wait().unwrap();
    assert_eq!(stack.results.get("stack").unwrap().as_list().unwrap().len(), 1);
    assert_eq!(session.pending_count(), 0);
}

struct FaultyHook;

impl EventHook for FaultyHook {
    fn on_stopped(&self, _: &str, _: Option<u32>) {}

    fn on_running(&self, _: Option<u32>) {}

    fn on_progress(&self, _: Progress) {
        panic!("hook failure");
    }

    fn on_output(&self, _: OutputKind, _: &str) {}
}

#[test]
fn test_hook_panic_rejects_pending() {
    let session = Arc::new(Session::new(std::io::sink(), FaultyHook));
    let (input_tx, input_rx) = mpsc::channel();
    let dispatch = {
        let session = session.clone();
        thread::spawn(move || session.run(input_rx))
    };

    let pending = session.issue_command("-target-download").unwrap();
    input_tx
        .send(Input::Line(
            LineSource::Debugger,
            r#"+download,{total-sent="512",total-size="2048"}"#.to_string(),
        ))
        .unwrap();

    assert!(matches!(pending.wait(), Err(Error::SessionClosed)));
    assert!(dispatch.join().is_err());
    assert!(session.is_closed());
}
