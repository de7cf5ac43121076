#![forbid(unsafe_code)]

mod command;
mod config;
mod constants;
mod controller;
mod geometry;
mod logging;
mod menu;
mod presenter;
mod template;
mod watcher;
mod window_cache;
mod x11_utils;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::info;

use command::CommandExecutor;
use config::MenuNode;
use constants::config::{APP_DIR, BROWSER, COMMAND_TIMEOUT_SECS, POLL_INTERVAL_MS};
use controller::Controller;
use menu::MenuTreeBuilder;
use presenter::{ControllerEvent, TrayPresenter};
use watcher::ConfigWatcher;

#[derive(Parser, Debug)]
#[command(name = "tray-menu")]
#[command(about = "System tray menu built from a JSON config, with shell command output in labels")]
#[command(version)]
struct Cli {
    /// Menu config file [default: ~/tray-menu.config.json]
    #[arg(long, env = "TRAY_MENU_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Directory holding assets/icons [default: <data dir>/tray-menu]
    #[arg(long, env = "TRAY_MENU_RESOURCES", global = true)]
    resources_dir: Option<PathBuf>,

    /// How often the config file is checked for changes
    #[arg(long, default_value_t = POLL_INTERVAL_MS, global = true)]
    poll_interval_ms: u64,

    /// Kill label and value commands after this many seconds (0 = never)
    #[arg(long, default_value_t = COMMAND_TIMEOUT_SECS, global = true)]
    command_timeout_secs: u64,

    /// Browser used for browser-window items
    #[arg(long, env = "TRAY_MENU_BROWSER", default_value = BROWSER, global = true)]
    browser: String,

    /// Append logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Commands {
    /// Show the tray menu and follow config changes (default)
    Run,

    /// Load the config and report errors
    Check,

    /// Build the menu once and print it as text
    Render,
}

/// Resolved process settings
#[derive(Debug, Clone)]
struct Settings {
    config_path: PathBuf,
    resources_dir: PathBuf,
    profiles_dir: PathBuf,
    poll_interval: Duration,
    command_timeout: Option<Duration>,
    browser: String,
}

impl Cli {
    fn settings(&self) -> Settings {
        let app_dir = |base: Option<PathBuf>| {
            base.unwrap_or_else(std::env::temp_dir).join(APP_DIR)
        };
        Settings {
            config_path: self
                .config
                .clone()
                .unwrap_or_else(config::default_config_path),
            resources_dir: self
                .resources_dir
                .clone()
                .unwrap_or_else(|| app_dir(dirs::data_dir())),
            profiles_dir: app_dir(dirs::cache_dir()).join(constants::window::PROFILES_DIR),
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(1)),
            command_timeout: (self.command_timeout_secs > 0)
                .then(|| Duration::from_secs(self.command_timeout_secs)),
            browser: self.browser.clone(),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    logging::init(cli.log_file.as_deref());
    let settings = cli.settings();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_daemon(settings).await,
        Commands::Check => Ok(if check(&settings) {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }),
        Commands::Render => render(&settings).await,
    }
}

async fn run_daemon(settings: Settings) -> Result<ExitCode> {
    info!(config = %settings.config_path.display(), "Starting tray menu");
    let (tx, rx) = mpsc::unbounded_channel();
    spawn_signal_listener(tx.clone())?;

    let presenter = TrayPresenter::spawn(tx.clone(), &settings.browser, settings.profiles_dir)
        .await
        .context("Failed to start tray")?;
    let watcher = ConfigWatcher::new(&settings.config_path, settings.poll_interval).spawn(tx);

    let controller = Controller::new(
        presenter,
        CommandExecutor::new(settings.command_timeout),
        settings.config_path,
        settings.resources_dir,
    );
    controller.run(rx).await;
    watcher.abort();

    info!("Exiting");
    Ok(ExitCode::SUCCESS)
}

fn count_nodes(nodes: &[MenuNode]) -> usize {
    nodes.iter().map(|n| 1 + count_nodes(&n.submenu)).sum()
}

/// Print a summary of the config, or the load error; false on error
fn check(settings: &Settings) -> bool {
    match config::try_load(&settings.config_path, &settings.resources_dir) {
        Ok(config) => {
            println!(
                "{}: ok ({} top-level entries, {} total)",
                settings.config_path.display(),
                config.menus.len(),
                count_nodes(&config.menus)
            );
            true
        }
        Err(e) => {
            eprintln!("{e}");
            false
        }
    }
}

async fn render(settings: &Settings) -> Result<ExitCode> {
    let config = config::load(&settings.config_path, &settings.resources_dir);
    let executor = CommandExecutor::new(settings.command_timeout);
    let built = MenuTreeBuilder::new(&executor).build(&config.menus).await;

    println!("{}", config.title);
    if !config.description.is_empty() {
        println!("{}", config.description);
    }
    print!("{}", built.to_text());
    Ok(ExitCode::SUCCESS)
}

#[cfg(unix)]
fn spawn_signal_listener(events: UnboundedSender<ControllerEvent>) -> Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals =
        Signals::new([SIGINT, SIGTERM]).context("Failed to register signal handlers")?;
    std::thread::Builder::new()
        .name("signals".to_string())
        .spawn(move || {
            if let Some(signal) = signals.forever().next() {
                info!(signal, "Received signal");
                // Controller may already be gone
                let _ = events.send(ControllerEvent::Shutdown);
            }
        })
        .context("Failed to spawn signal thread")?;
    Ok(())
}

#[cfg(not(unix))]
fn spawn_signal_listener(_events: UnboundedSender<ControllerEvent>) -> Result<()> {
    Ok(())
}
