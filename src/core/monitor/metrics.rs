use serde::{Deserialize, Serialize};

use super::decay::DecayRing;
use super::logins::{LoginSummary, PresenceStatus};
use super::parse::CpuCounters;

/// System-wide CPU split, each field decayed independently.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregateCpu {
    pub user: DecayRing,
    pub nice: DecayRing,
    pub system: DecayRing,
    pub idle: DecayRing,
}

impl AggregateCpu {
    pub fn advance(&mut self, counters: CpuCounters, elapsed_ticks: u64) {
        self.user.advance(counters.user, elapsed_ticks);
        self.nice.advance(counters.nice, elapsed_ticks);
        self.system.advance(counters.system, elapsed_ticks);
        self.idle.advance(counters.idle, elapsed_ticks);
    }

    pub fn percentages(&self) -> CpuPercentages {
        CpuPercentages {
            user: self.user.weighted(),
            nice: self.nice.weighted(),
            system: self.system.weighted(),
            idle: self.idle.weighted(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuPercentages {
    pub user: f64,
    pub nice: f64,
    pub system: f64,
    pub idle: f64,
}

/// Memory and swap in bytes, replaced wholesale each pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryState {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub shared: u64,
    pub buffers: u64,
    pub cached: u64,
    pub swap_total: u64,
    pub swap_used: u64,
    pub swap_free: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadAverages {
    pub one: f64,
    pub five: f64,
    pub fifteen: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilesystemUsage {
    pub device: String,
    pub mount_point: String,
    pub fs_type: String,
    pub available_bytes: u64,
    pub full: bool,
}

/// One ranked process as handed to the presentation layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessView {
    pub pid: u32,
    pub command_name: String,
    pub command_line: String,
    pub user: String,
    pub state: char,
    pub cpu_percent: f64,
    pub priority: i64,
    pub virtual_size: u64,
    pub resident_size: u64,
    pub wait_channel: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupView {
    pub name: String,
    pub members: Vec<(char, PresenceStatus)>,
}

/// Complete copy of what the consumer reads in one masked section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitorSnapshot {
    pub timestamp: i64, // Unix timestamp
    pub serial: u64,
    pub cpu: CpuPercentages,
    pub memory: MemoryState,
    pub loads: LoadAverages,
    pub logins: LoginSummary,
    pub groups: Vec<GroupView>,
    pub filesystems: Vec<FilesystemUsage>,
    pub processes: Vec<ProcessView>,
}
