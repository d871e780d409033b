// Piwatch - Pi-hole status alerting and remote maintenance
// Main entry point

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use piwatch::config::{Config, Domain};
use piwatch::error::PiwatchError;
use piwatch::notify::Notifier;
use piwatch::process::{CommandRunner, SystemCommandRunner};
use piwatch::tasks::TaskSelection;
use piwatch::version::build_info;
use piwatch::{bot, checks, logging};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "piwatch")]
#[command(author, about, long_about = None)]
#[command(disable_version_flag = true)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log alerts instead of sending them to Telegram
    #[arg(long, global = true)]
    test: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Show version information
    #[arg(short = 'V', long)]
    version: bool,

    /// Show detailed build information
    #[arg(long)]
    build_info: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Alert when the service or the internet connection goes down or comes back
    DownAlert,

    /// Sample CPU, RAM, disk and temperature and alert on threshold breaches
    Monitor {
        /// Alert on every breached metric, not only new ones
        #[arg(long)]
        force: bool,
    },

    /// Run maintenance tasks and send a summary
    Maintenance {
        /// all, os_update, pihole_update, gravity or clear_logs
        #[arg(long, default_value = "all")]
        task: String,
    },

    /// Serve the Telegram control bot
    Bot,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("{}", build_info().format_display());
        return Ok(());
    }

    if cli.build_info {
        println!("{}", build_info().format_display());
        println!("\n{}", build_info().format_build_info());
        return Ok(());
    }

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        std::process::exit(2);
    };

    let config_path = cli
        .config
        .ok_or_else(|| PiwatchError::Config("--config <path> is required".to_string()))?;
    let config = Config::load(&config_path)?;

    // Reject bad input before any state or log file is touched
    let selection = match &command {
        Command::Maintenance { task } => Some(task.parse::<TaskSelection>()?),
        _ => None,
    };
    let notifier = Notifier::from_config(&config, cli.test)?;

    let (log_dir, stem) = match &command {
        Command::DownAlert => (config.log_dir(Domain::DownAlert), Domain::DownAlert.name()),
        Command::Monitor { .. } => (config.log_dir(Domain::Monitor), Domain::Monitor.name()),
        Command::Maintenance { .. } => (config.log_dir(Domain::Maintenance), Domain::Maintenance.name()),
        Command::Bot => (config.log_dir(Domain::Monitor), "bot"),
    };
    let log_path = logging::init(&log_dir, stem, cli.debug)?;
    tracing::info!("{} starting, logging to {}", build_info().format_display(), log_path.display());
    if cli.test {
        tracing::info!("Test mode: alerts are logged, not sent");
    }

    let runtime = match &command {
        Command::Bot => tokio::runtime::Builder::new_multi_thread(),
        _ => tokio::runtime::Builder::new_current_thread(),
    }
    .enable_all()
    .build()?;

    let runner: Arc<dyn CommandRunner> = Arc::new(SystemCommandRunner::new());
    runtime.block_on(async move {
        match command {
            Command::Bot => bot::run(&config).await,
            Command::DownAlert => checks::down_alert::run(&config, &notifier, runner).await,
            Command::Monitor { force } => checks::monitor::run(&config, &notifier, runner, force).await,
            Command::Maintenance { .. } => {
                let selection = selection.unwrap_or(TaskSelection::All);
                // Task failures are reported to the operator, not through the exit code
                checks::maintenance::run(&config, &notifier, runner, selection)
                    .await
                    .map(|_| ())
            }
        }
    })
}
