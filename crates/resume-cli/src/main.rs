use std::env;
use std::path::PathBuf;

use resume_core::config::AgentConfig;
use resume_core::persistence::FilePreferenceStorage;
use resume_core::preferences::FlagSurface;
use resume_core::preferences::PreferenceStore;
use tracing_subscriber::EnvFilter;

mod ui;

const APP_DIR: &str = "resume-agent";

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Help,
    Version,
    Chat { config: Option<PathBuf> },
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    match parse_args(env::args().skip(1).collect())? {
        Command::Help => {
            print_help();
            Ok(())
        }
        Command::Version => {
            println!("resume-agent {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Command::Chat { config } => start_chat(config),
    }
}

fn parse_args(args: Vec<String>) -> Result<Command, Box<dyn std::error::Error>> {
    let mut config = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" | "help" => return Ok(Command::Help),
            "--version" | "-V" | "version" => return Ok(Command::Version),
            "--config" => {
                let Some(value) = args.get(i + 1) else {
                    return Err("--config requires a path".into());
                };
                config = Some(PathBuf::from(value));
                i += 2;
            }
            other => {
                return Err(format!("unsupported argument: {other}").into());
            }
        }
    }
    Ok(Command::Chat { config })
}

fn start_chat(config_path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = match config_path.or_else(default_config_path) {
        Some(path) => AgentConfig::load(&path)?,
        None => AgentConfig::default(),
    };
    init_logging(&config.log_filter);

    let storage_dir = config
        .preferences
        .storage_dir
        .clone()
        .or_else(default_storage_dir)
        .ok_or("no data directory available; set preferences.storage_dir")?;
    let storage = FilePreferenceStorage::open(&storage_dir)?;
    let ambient_dark = config
        .preferences
        .ambient_dark
        .unwrap_or_else(|| ambient_dark_from(env::var("COLORFGBG").ok().as_deref()));
    let preferences = PreferenceStore::initialize(storage, &ambient_dark, FlagSurface::default());
    tracing::debug!(
        storage = %storage_dir.display(),
        ambient_dark,
        "preferences loaded"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("resume-agent-runtime")
        .build()?;
    runtime.block_on(ui::run(preferences, &config))
}

fn init_logging(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
}

fn default_storage_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join(APP_DIR))
}

/// Terminals that export `COLORFGBG` ("fg;bg") report their background color
/// index; low indices other than 7 are dark backgrounds.
fn ambient_dark_from(colorfgbg: Option<&str>) -> bool {
    colorfgbg
        .and_then(|value| value.rsplit(';').next())
        .and_then(|bg| bg.trim().parse::<u8>().ok())
        .is_some_and(|bg| bg < 7 || bg == 8)
}

fn print_help() {
    println!("resume-agent {}", env!("CARGO_PKG_VERSION"));
    println!("Usage:");
    println!("  resume-agent [--config PATH]");
    println!("  resume-agent --help");
    println!("  resume-agent --version");
    println!();
    ui::print_commands();
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn parses_config_flag() {
        assert_eq!(
            parse_args(args(&["--config", "/etc/agent.toml"])).expect("parse"),
            Command::Chat {
                config: Some(PathBuf::from("/etc/agent.toml"))
            }
        );
        assert_eq!(
            parse_args(Vec::new()).expect("parse"),
            Command::Chat { config: None }
        );
        assert!(parse_args(args(&["--config"])).is_err());
        assert!(parse_args(args(&["--repo", "."])).is_err());
    }

    #[test]
    fn help_and_version_short_circuit() {
        assert_eq!(parse_args(args(&["-h"])).expect("parse"), Command::Help);
        assert_eq!(
            parse_args(args(&["--version", "--bogus"])).expect("parse"),
            Command::Version
        );
    }

    #[test]
    fn ambient_signal_from_colorfgbg() {
        assert!(ambient_dark_from(Some("15;0")));
        assert!(ambient_dark_from(Some("7;default;8")));
        assert!(!ambient_dark_from(Some("0;15")));
        assert!(!ambient_dark_from(Some("0;7")));
        assert!(!ambient_dark_from(Some("garbage")));
        assert!(!ambient_dark_from(None));
    }
}
