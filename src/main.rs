use anyhow::Context;
use clap::Parser;
use mibridge::config::Config;
use mibridge::console::AppBuilder;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file, `~/.config/mib/config.toml` by default
    #[arg(long)]
    config: Option<String>,

    /// Debugger executable, overrides the configuration file
    #[arg(long, env = "MIB_GDB")]
    gdb: Option<PathBuf>,

    /// Probe server command line, like "openocd -f board.cfg"
    #[arg(long, value_name = "CMD")]
    server: Option<String>,

    /// Don't print logs while the prompt is active
    #[arg(short, long, default_value_t = false)]
    quiet: bool,

    /// Program to debug
    program: Option<String>,
}

fn spawn_server(command_line: &str) -> anyhow::Result<Child> {
    let mut words = command_line.split_whitespace();
    let program = words.next().context("empty server command")?;
    Command::new(program)
        .args(words)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .spawn()
        .with_context(|| format!("spawn server `{program}`"))
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    env_logger::init();

    let mut config = Config::load(args.config.as_deref());
    if let Some(gdb) = args.gdb {
        config.gdb_path = Some(gdb);
    }
    let gdb_path = config
        .gdb_executable()
        .context("debugger executable not found")?;

    let mut server = args.server.as_deref().map(spawn_server).transpose()?;

    let mut gdb = Command::new(&gdb_path)
        .args(&config.gdb_args)
        .args(args.program.iter())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .with_context(|| format!("spawn debugger `{}`", gdb_path.display()))?;
    let gdb_in = gdb.stdin.take().context("debugger stdin is not captured")?;
    let gdb_out = gdb.stdout.take().context("debugger stdout is not captured")?;

    let mut builder = AppBuilder::new(config);
    if let Some(server_out) = server.as_mut().and_then(|s| s.stdout.take()) {
        builder = builder.with_server(server_out);
    }
    if args.quiet {
        builder = builder.quiet();
    }

    let result = builder.build(gdb_in, gdb_out).and_then(|app| app.run());

    _ = gdb.kill();
    _ = gdb.wait();
    if let Some(mut server) = server {
        _ = server.kill();
        _ = server.wait();
    }

    result
}
