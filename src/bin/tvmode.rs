use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow, bail};
use clap::{Parser, Subcommand};
use serde_json::json;
use tokio::sync::oneshot;
use tracing::{info, warn};
use tvmode::actor::config_watcher::ConfigWatcher;
use tvmode::actor::presentation::Presentation;
use tvmode::actor::reactor::{self, DisableReport, Event, Reactor, Record};
use tvmode::common::config::{Config, config_file};
use tvmode::common::log;
use tvmode::sys::headless::Scenario;
use tvmode::ui::theme::ThemeManager;

#[derive(Parser)]
#[command(name = "tvmode")]
#[command(about = "TV-mode window layout: one main viewport and a row of cards")]
struct Cli {
    /// Configuration file to use instead of the one in the config directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enable the layout on a headless world and play a scenario against it
    Run {
        scenario: PathBuf,
        /// Record every event the reactor handles to this file
        #[arg(long)]
        record: Option<PathBuf>,
        /// Reload the configuration file while the scenario runs
        #[arg(long)]
        watch_config: bool,
    },
    /// Feed a recording back through a fresh reactor
    Replay { scenario: PathBuf, events: PathBuf },
    /// Validate the configuration file
    CheckConfig {
        /// Reset invalid values to their defaults and save the file
        #[arg(long)]
        fix: bool,
    },
    /// Print the bundled default configuration
    DefaultConfig,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    log::init_logging();
    let config_path = cli.config.clone().or_else(config_file);

    match cli.command {
        Commands::Run { scenario, record, watch_config } => {
            run(&scenario, config_path, record.as_deref(), watch_config)
        }
        Commands::Replay { scenario, events } => replay(&scenario, config_path, &events),
        Commands::CheckConfig { fix } => check_config(config_path, fix),
        Commands::DefaultConfig => {
            print!("{}", Config::bundled());
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config = Config::read_or_default(path)?;
    for issue in config.validate() {
        warn!("config: {issue}");
    }
    Ok(config)
}

fn run(
    scenario_path: &Path,
    config_path: Option<PathBuf>,
    record: Option<&Path>,
    watch_config: bool,
) -> anyhow::Result<()> {
    let config = load_config(config_path.as_deref())?;
    let scenario = Scenario::load(scenario_path)?;
    let ws = scenario.world();
    let themes = ThemeManager::new(config.settings.themes_dir());

    let (broadcast_tx, broadcast_rx) = tvmode::actor::channel();
    let reactor = Reactor::new(config, ws.clone())
        .with_broadcast(broadcast_tx)
        .with_record(Record::new(record)?);
    let (events_tx, reactor_thread) = Reactor::spawn(reactor);

    if watch_config {
        match config_path {
            Some(path) => ConfigWatcher::spawn(path, events_tx.clone()),
            None => warn!("no config file to watch"),
        }
    }

    let runtime = tokio::runtime::Builder::new_current_thread().enable_time().build()?;
    let (layout, status) = runtime.block_on(async {
        let presentation = tokio::spawn(Presentation::new(themes).run(broadcast_rx));
        scenario.drive(&ws, &events_tx).await;

        let (tx, rx) = oneshot::channel();
        events_tx.send(Event::QueryLayout(tx));
        let layout = rx.await.context("reactor stopped before reporting its layout")?;
        events_tx.send(Event::Disable);

        let presentation = presentation.await?;
        anyhow::Ok((layout, presentation.status_line().to_string()))
    })?;
    let report = reactor_thread.join().map_err(|_| anyhow!("reactor thread panicked"))?;
    info!(%status, "presentation finished");

    let output = json!({
        "layout": layout,
        "restore": report_json(&report),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn replay(scenario_path: &Path, config_path: Option<PathBuf>, events: &Path) -> anyhow::Result<()> {
    let config = load_config(config_path.as_deref())?;
    let scenario = Scenario::load(scenario_path)?;
    let mut reactor = Reactor::new(config, scenario.world());
    reactor.enable();
    let handled = reactor::replay(events, &mut reactor)?;
    let layout = reactor.snapshot();
    let report = reactor.disable();

    let output = json!({
        "handled": handled,
        "layout": layout,
        "restore": report_json(&report),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn check_config(config_path: Option<PathBuf>, fix: bool) -> anyhow::Result<()> {
    let Some(path) = config_path else {
        bail!("no config directory on this platform; pass --config");
    };
    let mut config = Config::read(&path)?;
    let issues = config.validate();
    if issues.is_empty() {
        println!("{}: ok", path.display());
        return Ok(());
    }
    for issue in &issues {
        println!("  - {issue}");
    }
    if !fix {
        bail!("{} issue(s) in {}", issues.len(), path.display());
    }

    let fixed = config.auto_fix_values();
    config.save(&path)?;
    println!("fixed {fixed} value(s) in {}", path.display());
    let remaining = config.validate();
    if !remaining.is_empty() {
        bail!("{} issue(s) could not be fixed", remaining.len());
    }
    Ok(())
}

fn report_json(report: &DisableReport) -> serde_json::Value {
    let failed: Vec<_> = report
        .failed
        .iter()
        .map(|(wid, e)| json!({ "window": wid, "error": e.to_string() }))
        .collect();
    json!({ "restored": report.restored, "failed": failed })
}
