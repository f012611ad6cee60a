//! `splink`: inspect and canonicalize connection geometry records.
//!
//! ```text
//! splink inspect <file> [--strict] [--config <engine.json>]
//! splink format  <file> [--strict] [--config <engine.json>]
//! ```
//!
//! Set `RUST_LOG=debug` to see skipped fields and lifecycle traces.

use clap::{Args, Parser, Subcommand};
use splink_core::{
    Connection, ConnectionId, ConnectionKind, DecodeMode, EngineConfig, Side, decode_geometry,
    format_geometry,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "splink", version)]
#[command(about = "Inspect and canonicalize connection geometry records")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print waypoints, control points, label, and factors
    Inspect(Input),
    /// Print the canonical form of the record
    Format(Input),
}

#[derive(Debug, Args)]
struct Input {
    /// File holding one geometry record
    file: PathBuf,

    /// Fail on the first malformed field instead of skipping it
    #[arg(long)]
    strict: bool,

    /// Engine configuration (JSON); missing keys keep their defaults
    #[arg(long, value_name = "engine.json")]
    config: Option<PathBuf>,
}

impl Command {
    fn input(&self) -> &Input {
        match self {
            Command::Inspect(input) | Command::Format(input) => input,
        }
    }
}

fn load_config(input: &Input) -> Result<EngineConfig, String> {
    let mut config = match &input.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("{}: {e}", path.display()))?;
            serde_json::from_str(&text).map_err(|e| format!("{}: {e}", path.display()))?
        }
        None => EngineConfig::default(),
    };
    if input.strict {
        config.decode_mode = DecodeMode::Strict;
    }
    Ok(config)
}

fn inspect(text: &str, config: &EngineConfig) -> Result<String, String> {
    let mut c = Connection::new(ConnectionId::intern("inspect"), ConnectionKind::Flow, config);
    decode_geometry(text, &mut c, config.decode_mode)?;

    let mut out = String::new();
    out.push_str(&format!("segments: {}\n", c.segment_count()));
    if c.segment_count() > 0 {
        for i in 0..=c.segment_count() {
            let p = c.point_at(i);
            let l = c.ctrl_point_at(i, Side::Left);
            let r = c.ctrl_point_at(i, Side::Right);
            out.push_str(&format!(
                "  [{i}] ({}, {})  in ({}, {})  out ({}, {})\n",
                p.x, p.y, l.x, l.y, r.x, r.y
            ));
        }
    }
    let anchor = c.label_anchor();
    out.push_str(&format!(
        "label: offset ({}, {}) anchor ({}, {})\n",
        c.label.offset.x, c.label.offset.y, anchor.x, anchor.y
    ));
    out.push_str(&format!(
        "factors: start {} end {}\n",
        c.start_factor(),
        c.end_factor()
    ));
    let b = c.display_box();
    out.push_str(&format!(
        "display box: ({}, {}) - ({}, {})\n",
        b.x0, b.y0, b.x1, b.y1
    ));
    Ok(out)
}

fn run(command: &Command) -> Result<String, String> {
    let input = command.input();
    let config = load_config(input)?;
    let path = input.file.display();
    let text = std::fs::read_to_string(&input.file).map_err(|e| format!("{path}: {e}"))?;
    log::debug!("{path} ({} bytes, {:?})", text.len(), config.decode_mode);
    match command {
        Command::Inspect(_) => inspect(&text, &config),
        Command::Format(_) => format_geometry(&text, &config).map(|s| s + "\n"),
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(&cli.command) {
        Ok(out) => {
            print!("{out}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
