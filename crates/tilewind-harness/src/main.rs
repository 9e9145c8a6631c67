mod lifecycles;
mod screenshot;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use tilewind_engine::engine::{EngineArgs, Tilengine};
use tilewind_engine::logging::{LoggingConfig, init_logging};
use tilewind_engine::native::HeadlessConfig;

use lifecycles::{Lifecycle, Options};

/// Frames a headless window stays open when `--frames` is not given.
const DEFAULT_HEADLESS_FRAMES: u64 = 120;

#[derive(Debug, Parser)]
#[command(name = "tilewind-harness", version, about = "Runs the tilewind window lifecycles")]
struct Cli {
    #[command(subcommand)]
    mode: Option<Mode>,

    /// Use the in-memory backend instead of the native library.
    #[arg(long, global = true)]
    headless: bool,

    /// Close the headless window after N drawn frames.
    #[arg(long, global = true, value_name = "N")]
    frames: Option<u64>,

    /// Engine args as TOML.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Save the last frame as a png.
    #[arg(long, global = true, value_name = "PNG")]
    screenshot: Option<PathBuf>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Subcommand)]
enum Mode {
    /// Window owns the engine, loop autostarts.
    Standard,
    /// Window owns the engine, loop started after setup.
    Delayed,
    /// Engine created first and shared with the window.
    Managed,
    /// Managed engine, caller-driven process/draw loop.
    Legacy,
    /// Every lifecycle, one after another.
    All,
}

impl Mode {
    const MENU: [Mode; 5] = [Mode::Standard, Mode::Delayed, Mode::Managed, Mode::Legacy, Mode::All];

    fn lifecycles(self) -> Vec<Lifecycle> {
        match self {
            Mode::Standard => vec![Lifecycle::Standard],
            Mode::Delayed => vec![Lifecycle::Delayed],
            Mode::Managed => vec![Lifecycle::Managed],
            Mode::Legacy => vec![Lifecycle::Legacy],
            Mode::All => Lifecycle::ALL.to_vec(),
        }
    }
}

fn main() -> ExitCode {
    init_logging(LoggingConfig::default());
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mode = match cli.mode {
        Some(mode) => mode,
        None => prompt_mode(&mut io::stdin().lock())?,
    };

    let engine = match &cli.config {
        Some(path) => EngineArgs::from_toml_file(path)
            .with_context(|| format!("failed to load engine config {}", path.display()))?,
        None => EngineArgs::new().with_load_path("assets"),
    };
    let tln = backend(&cli)?;

    print_banner(cli.headless, mode);

    let several = mode == Mode::All;
    for lifecycle in mode.lifecycles() {
        let opts = Options {
            engine: engine.clone(),
            screenshot: cli.screenshot.as_deref().map(|path| {
                if several {
                    screenshot::path_for(path, lifecycle.name())
                } else {
                    path.to_path_buf()
                }
            }),
        };

        let summary = lifecycles::run(&tln, lifecycle, &opts)?;
        println!(
            "  {:<9} {:>6} frame(s)  exit: {}",
            summary.lifecycle.name(),
            summary.frames,
            summary
                .exit
                .map_or_else(|| "none".to_string(), |e| format!("{e:?}")),
        );
    }
    println!();
    Ok(())
}

fn backend(cli: &Cli) -> Result<Tilengine> {
    if cli.headless {
        return Ok(Tilengine::headless_with(HeadlessConfig {
            close_after_frames: Some(cli.frames.unwrap_or(DEFAULT_HEADLESS_FRAMES)),
            ..HeadlessConfig::default()
        }));
    }
    if cli.frames.is_some() {
        log::warn!("--frames only applies to --headless");
    }
    native_backend()
}

#[cfg(feature = "native")]
fn native_backend() -> Result<Tilengine> {
    Tilengine::native().context("failed to claim the native library")
}

#[cfg(not(feature = "native"))]
fn native_backend() -> Result<Tilengine> {
    bail!("built without the `native` feature; pass --headless")
}

/// Asks for a lifecycle on stdin, like the menu of the original demo.
fn prompt_mode(input: &mut impl BufRead) -> Result<Mode> {
    println!("Which lifecycle do you want to run?");
    for (i, mode) in Mode::MENU.iter().enumerate() {
        println!("{i}: {mode:?}");
    }
    print!("> ");
    io::stdout().flush()?;

    let mut line = String::new();
    input.read_line(&mut line).context("failed to read selection")?;
    parse_selection(&line)
}

fn parse_selection(line: &str) -> Result<Mode> {
    let line = line.trim();
    match line.parse::<usize>().ok().and_then(|i| Mode::MENU.get(i)) {
        Some(mode) => Ok(*mode),
        None => bail!("lifecycle {line:?} does not exist"),
    }
}

fn print_banner(headless: bool, mode: Mode) {
    let backend = if headless { "headless" } else { "native" };
    println!();
    println!("  ╔════════════════════════════════════════╗");
    println!("  ║          TILEWIND  HARNESS v0.1        ║");
    println!("  ╠════════════════════════════════════════╣");
    println!("  ║  backend : {backend:<28}║");
    println!("  ║  mode    : {:<28}║", format!("{mode:?}").to_lowercase());
    println!("  ╚════════════════════════════════════════╝");
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_selection_maps_to_modes() {
        assert_eq!(parse_selection("0\n").unwrap(), Mode::Standard);
        assert_eq!(parse_selection(" 3 ").unwrap(), Mode::Legacy);
        assert_eq!(parse_selection("4").unwrap(), Mode::All);
        assert!(parse_selection("9").is_err());
        assert!(parse_selection("x").is_err());
    }

    #[test]
    fn prompt_reads_one_line() {
        let mut input = io::Cursor::new("2\n1\n");
        assert_eq!(prompt_mode(&mut input).unwrap(), Mode::Managed);
    }

    #[test]
    fn flags_are_global() {
        let cli = Cli::try_parse_from(["tilewind-harness", "legacy", "--headless", "--frames", "5"]).unwrap();
        assert_eq!(cli.mode, Some(Mode::Legacy));
        assert!(cli.headless);
        assert_eq!(cli.frames, Some(5));
    }

    #[test]
    fn all_expands_in_order() {
        assert_eq!(Mode::All.lifecycles(), Lifecycle::ALL.to_vec());
        assert_eq!(Mode::Delayed.lifecycles(), vec![Lifecycle::Delayed]);
    }

    #[test]
    fn headless_backend_honors_frames() {
        let cli = Cli::try_parse_from(["tilewind-harness", "--headless", "--frames", "3", "standard"]).unwrap();
        let tln = backend(&cli).unwrap();
        let opts = Options {
            engine: EngineArgs::new(),
            screenshot: None,
        };
        let summary = lifecycles::run(&tln, Lifecycle::Standard, &opts).unwrap();
        assert_eq!(summary.frames, 3);
    }
}
