//! One sampling pass: read every source, update the shared context.

use crate::error::MonitorError;

use super::logins::{sort_sessions, LoginSession, LoginSummary, WatchGroup};
use super::messages::{MessageQueue, Priority};
use super::metrics::{
    AggregateCpu, FilesystemUsage, GroupView, LoadAverages, MemoryState, MonitorSnapshot,
    ProcessView,
};
use super::parse::{
    normalize_cmdline, parse_cpu_counters, parse_loadavg, parse_meminfo, parse_mounts,
    parse_process_stat, parse_process_status, parse_uptime,
};
use super::rank::{top_k, SortKey};
use super::registry::{LiveProcess, ProcessRegistry, CMDLINE_WIDTH};
use super::source::MetricSource;
use super::symbols::SymbolTable;
use super::users::UserLookup;

/// Filesystem types worth warning about when they fill up.
pub const NATIVE_FILESYSTEMS: &[&str] = &["ext2", "ext3", "ext4", "xfs", "btrfs", "nfs", "nfs4", "umsdos"];

pub const DEFAULT_MIN_DISK_FREE: u64 = 1_000_000;

/// State shared between the sampler and the screen. Only the sampler writes
/// it; the screen reads it while holding the runtime's mask.
#[derive(Debug, Clone, Default)]
pub struct MonitorContext {
    pub registry: ProcessRegistry,
    pub cpu: AggregateCpu,
    pub memory: MemoryState,
    pub loads: LoadAverages,
    pub sessions: Vec<LoginSession>,
    pub logins: LoginSummary,
    pub groups: Vec<WatchGroup>,
    pub filesystems: Vec<FilesystemUsage>,
    pub messages: MessageQueue,
    pub passes: u64,
}

impl MonitorContext {
    pub fn new(groups: Vec<WatchGroup>) -> Self {
        Self {
            groups,
            ..Self::default()
        }
    }

    /// Copy out everything a frame needs, with the top `k` processes by `key`.
    pub fn snapshot(&self, key: SortKey, k: usize) -> MonitorSnapshot {
        let processes = top_k(&self.registry, key, k)
            .into_iter()
            .filter_map(|pid| self.registry.get(pid))
            .map(|record| ProcessView {
                pid: record.pid,
                command_name: record.command_name.clone(),
                command_line: record.command_line.clone(),
                user: record.user.clone(),
                state: record.state,
                cpu_percent: record.cpu_percent(),
                priority: record.priority,
                virtual_size: record.virtual_size,
                resident_size: record.resident_size,
                wait_channel: record.wait_channel_name.clone(),
            })
            .collect();

        MonitorSnapshot {
            timestamp: chrono::Utc::now().timestamp(),
            serial: self.registry.serial(),
            cpu: self.cpu.percentages(),
            memory: self.memory,
            loads: self.loads,
            logins: self.logins,
            groups: self
                .groups
                .iter()
                .map(|group| GroupView {
                    name: group.name.clone(),
                    members: group.members.iter().map(|m| (m.id, m.status)).collect(),
                })
                .collect(),
            filesystems: self.filesystems.clone(),
            processes,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SamplerSettings {
    pub min_disk_free: u64,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            min_disk_free: DEFAULT_MIN_DISK_FREE,
        }
    }
}

/// Owns the metric source and everything that only the sampling side needs.
pub struct Sampler<S, U> {
    source: S,
    users: U,
    symbols: SymbolTable,
    settings: SamplerSettings,
    total_ticks: u64,
}

impl<S: MetricSource, U: UserLookup> Sampler<S, U> {
    pub fn new(source: S, users: U, symbols: SymbolTable, settings: SamplerSettings) -> Self {
        Self {
            source,
            users,
            symbols,
            settings,
            total_ticks: 0,
        }
    }

    /// Run one full pass. Read failures become messages in `ctx`; the pass
    /// always runs to the end.
    pub fn pass(&mut self, ctx: &mut MonitorContext) {
        let elapsed = self.update_ticks(&mut ctx.messages);
        self.read_processes(ctx, elapsed);
        self.read_cpu(ctx, elapsed);
        self.read_loads(ctx);
        self.read_memory(ctx);
        self.read_logins(ctx);
        self.check_disk_free(ctx);
        ctx.passes += 1;
        log::trace!("Pass {} done, {} elapsed ticks", ctx.passes, elapsed);
    }

    /// Advance the tick clock and return ticks since the previous pass, or 0
    /// when uptime cannot be read.
    fn update_ticks(&mut self, messages: &mut MessageQueue) -> u64 {
        let Some(text) = self.read_text("uptime", messages) else {
            return 0;
        };
        let Some(secs) = parse_uptime(&text) else {
            self.report_format("uptime", messages);
            return 0;
        };
        let total = (secs * self.source.clock_ticks() as f64).round() as u64;
        let elapsed = total.saturating_sub(self.total_ticks);
        self.total_ticks = total;
        elapsed
    }

    fn read_processes(&self, ctx: &mut MonitorContext, elapsed: u64) {
        let pids = match self.source.pids() {
            Ok(pids) => pids,
            Err(e) => {
                let path = self.source.display_path("");
                ctx.messages.push(Priority::Max, MonitorError::source_read(path, e).to_string());
                return;
            }
        };

        let live: Vec<LiveProcess> = pids
            .into_iter()
            .map(|pid| self.read_process(pid, &mut ctx.messages))
            .collect();

        ctx.registry.reconcile(
            &live,
            elapsed,
            &self.symbols,
            &self.users,
            self.source.page_size(),
        );
    }

    fn read_process(&self, pid: u32, messages: &mut MessageQueue) -> LiveProcess {
        let mut process = LiveProcess::new(pid);

        let stat_name = format!("{}/stat", pid);
        process.stat = self
            .read_text(&stat_name, messages)
            .and_then(|text| self.parsed(&stat_name, parse_process_stat(&text), messages));

        let status_name = format!("{}/status", pid);
        process.credentials = self
            .read_text(&status_name, messages)
            .and_then(|text| self.parsed(&status_name, parse_process_status(&text), messages));

        let cmdline_name = format!("{}/cmdline", pid);
        process.command_line = match self.source.read_bytes(&cmdline_name, CMDLINE_WIDTH) {
            Ok(raw) => Some(normalize_cmdline(&raw, CMDLINE_WIDTH)),
            Err(e) => {
                self.report_read(&cmdline_name, e, messages);
                None
            }
        };

        process
    }

    fn read_cpu(&self, ctx: &mut MonitorContext, elapsed: u64) {
        let counters = self
            .read_text("stat", &mut ctx.messages)
            .and_then(|text| self.parsed("stat", parse_cpu_counters(&text), &mut ctx.messages));
        if let Some(counters) = counters {
            ctx.cpu.advance(counters, elapsed);
        }
    }

    fn read_loads(&self, ctx: &mut MonitorContext) {
        let loads = self
            .read_text("loadavg", &mut ctx.messages)
            .and_then(|text| self.parsed("loadavg", parse_loadavg(&text), &mut ctx.messages));
        if let Some(loads) = loads {
            ctx.loads = loads;
        }
    }

    fn read_memory(&self, ctx: &mut MonitorContext) {
        let memory = self
            .read_text("meminfo", &mut ctx.messages)
            .and_then(|text| self.parsed("meminfo", parse_meminfo(&text), &mut ctx.messages));
        if let Some(memory) = memory {
            ctx.memory = memory;
        }
    }

    fn read_logins(&self, ctx: &mut MonitorContext) {
        let mut sessions = self.source.logins();
        sort_sessions(&mut sessions);
        ctx.logins = LoginSummary::from_sessions(&sessions);
        for group in &mut ctx.groups {
            group.update(&sessions);
        }
        ctx.sessions = sessions;
    }

    fn check_disk_free(&self, ctx: &mut MonitorContext) {
        let Some(text) = self.read_text("mounts", &mut ctx.messages) else {
            return;
        };

        let mut usage = Vec::new();
        let mut any_full = false;
        for mount in parse_mounts(&text) {
            if !NATIVE_FILESYSTEMS.contains(&mount.fs_type.as_str()) || mount.is_read_only() {
                continue;
            }
            let available = match self.source.available_space(&mount.mount_point) {
                Ok(bytes) => bytes,
                Err(e) => {
                    log::debug!("statvfs {}: {}", mount.mount_point, e);
                    continue;
                }
            };
            let full = available < self.settings.min_disk_free;
            if full {
                any_full = true;
                ctx.messages.push(
                    Priority::Med,
                    format!("{:.18} is FULL!!", mount.mount_point),
                );
            }
            usage.push(FilesystemUsage {
                device: mount.device,
                mount_point: mount.mount_point,
                fs_type: mount.fs_type,
                available_bytes: available,
                full,
            });
        }
        if !any_full {
            ctx.messages.push(Priority::Min, "No filesystems are full");
        }
        ctx.filesystems = usage;
    }

    fn read_text(&self, name: &str, messages: &mut MessageQueue) -> Option<String> {
        match self.source.read(name) {
            Ok(text) => Some(text),
            Err(e) => {
                self.report_read(name, e, messages);
                None
            }
        }
    }

    fn parsed<T>(&self, name: &str, value: Option<T>, messages: &mut MessageQueue) -> Option<T> {
        if value.is_none() {
            self.report_format(name, messages);
        }
        value
    }

    fn report_read(&self, name: &str, err: std::io::Error, messages: &mut MessageQueue) {
        let err = MonitorError::source_read(self.source.display_path(name), err);
        messages.push(Priority::Max, err.to_string());
    }

    fn report_format(&self, name: &str, messages: &mut MessageQueue) {
        let err = MonitorError::format(self.source.display_path(name));
        messages.push(Priority::Max, err.to_string());
    }
}
