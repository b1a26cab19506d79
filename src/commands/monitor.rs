//! Monitor command handler.
//!
//! Wires configuration, the proc source and the sampler together, then hands
//! off to either the TUI or the JSON printer.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::ArgMatches;
use serde::Serialize;

use crate::core::config::{Config, InfoColumn};
use crate::core::monitor::{
    candidate_paths, period_from_secs, FireOutcome, Message, MonitorContext, MonitorSnapshot,
    Priority, ProcFs, Sampler, SamplerRuntime, SamplerSettings, SortKey, SymbolTable,
    SystemUsers, UpdateScheduler, WatchGroup,
};
use crate::ui::monitor_tui::{run_monitor_app, MonitorAppConfig};

/// One line of `--json` output
#[derive(Debug, Serialize)]
pub struct JsonReport {
    #[serde(flatten)]
    pub snapshot: MonitorSnapshot,
    pub messages: Vec<Message>,
}

/// Execute the monitor command
pub fn execute(matches: &ArgMatches) -> Result<()> {
    let config = resolve_config(matches)?;
    let period = period_from_secs(config.delay)?;

    let source = ProcFs::open(&config.proc_root).context("Cannot start the monitor")?;
    let mut context = MonitorContext::new(config.groups.iter().map(WatchGroup::from_config).collect());
    let symbols = load_symbols(&config, &mut context);
    let sampler = Sampler::new(
        source,
        SystemUsers::load(),
        symbols,
        SamplerSettings {
            min_disk_free: config.min_disk_free,
        },
    );

    if matches.get_flag("json") {
        let count = matches.get_one::<u64>("count").copied();
        return run_json_output(sampler, context, &config, period, count);
    }

    let runtime = SamplerRuntime::start(sampler, context, period, config.warmup_passes)?;
    let hostname = sysinfo::System::host_name().unwrap_or_else(|| "localhost".to_string());
    let app_config = MonitorAppConfig::from_config(&config, hostname, period);

    let result = run_monitor_app(app_config, &runtime).context("Failed to run monitor");
    runtime.shutdown();
    result
}

/// Config file values with command-line overrides applied.
pub fn resolve_config(matches: &ArgMatches) -> Result<Config> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    if let Some(delay) = matches.get_one::<f64>("delay") {
        config.delay = *delay;
    }
    if let Some(sort) = matches.get_one::<SortKey>("sort") {
        config.sort = *sort;
    }
    if let Some(info) = matches.get_one::<InfoColumn>("info") {
        config.info = *info;
    }
    if let Some(map_file) = matches.get_one::<PathBuf>("map-file") {
        config.map_file = Some(map_file.clone());
    }

    config.validate()?;
    Ok(config)
}

/// Build the symbol table once. Failure is reported and leaves hex wait channels.
fn load_symbols(config: &Config, context: &mut MonitorContext) -> SymbolTable {
    let release = sysinfo::System::kernel_version().unwrap_or_default();
    let candidates = candidate_paths(config.map_file.as_deref(), &release);
    match SymbolTable::build(&candidates) {
        Ok(table) => {
            log::info!("Loaded {} kernel symbols", table.len());
            table
        }
        Err(e) => {
            context.messages.push(Priority::Med, e.to_string());
            SymbolTable::unresolved()
        }
    }
}

/// Run in JSON output mode (for scripting)
fn run_json_output<S, U>(
    mut sampler: Sampler<S, U>,
    mut context: MonitorContext,
    config: &Config,
    period: Duration,
    count: Option<u64>,
) -> Result<()>
where
    S: crate::core::monitor::MetricSource,
    U: crate::core::monitor::UserLookup,
{
    let mut scheduler = UpdateScheduler::new();
    let mut emitted = 0u64;

    loop {
        let started = Instant::now();
        let outcome = scheduler.fire(&mut sampler, &mut context, || started.elapsed() >= period);

        if outcome == FireOutcome::Sampled {
            let report = JsonReport {
                snapshot: context.snapshot(config.sort, config.top),
                messages: context.messages.drain(),
            };
            println!("{}", serde_json::to_string(&report)?);
            emitted += 1;
            if count.is_some_and(|count| emitted >= count) {
                return Ok(());
            }
        }

        std::thread::sleep(period.saturating_sub(started.elapsed()));
    }
}
