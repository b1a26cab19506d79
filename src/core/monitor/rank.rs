//! Top-K selection over the process registry.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::registry::{ProcessRecord, ProcessRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Cpu,
    #[serde(rename = "rss")]
    ResidentSize,
    #[serde(rename = "vsize")]
    VirtualSize,
}

impl SortKey {
    pub fn next(self) -> Self {
        match self {
            SortKey::Cpu => SortKey::ResidentSize,
            SortKey::ResidentSize => SortKey::VirtualSize,
            SortKey::VirtualSize => SortKey::Cpu,
        }
    }

    /// Short tag for the flags line.
    pub fn tag(self) -> &'static str {
        match self {
            SortKey::Cpu => "CPU",
            SortKey::ResidentSize => "RSS",
            SortKey::VirtualSize => "VSZ",
        }
    }

    pub fn value(self, record: &ProcessRecord) -> f64 {
        match self {
            SortKey::Cpu => record.cpu_percent(),
            SortKey::ResidentSize => record.resident_size as f64,
            SortKey::VirtualSize => record.virtual_size as f64,
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SortKey::Cpu => "cpu",
            SortKey::ResidentSize => "rss",
            SortKey::VirtualSize => "vsize",
        };
        f.write_str(name)
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cpu" => Ok(SortKey::Cpu),
            "rss" | "mem" => Ok(SortKey::ResidentSize),
            "vsize" | "vsz" => Ok(SortKey::VirtualSize),
            other => Err(format!("unknown sort key '{}'", other)),
        }
    }
}

/// Up to `k` pids ordered by `key`, highest first.
///
/// Each rank rescans the active slots for the largest positive value not
/// already placed, so the registry itself is never reordered. Selection
/// stops as soon as no remaining process has a positive value. Equal values
/// keep slot order.
pub fn top_k(registry: &ProcessRegistry, key: SortKey, k: usize) -> Vec<u32> {
    let mut ranked: Vec<u32> = Vec::with_capacity(k);
    for _ in 0..k {
        let mut best_value = 0.0;
        let mut best_pid = None;
        for record in registry.iter_active() {
            let value = key.value(record);
            if value > best_value && !ranked.contains(&record.pid) {
                best_value = value;
                best_pid = Some(record.pid);
            }
        }
        match best_pid {
            Some(pid) => ranked.push(pid),
            None => break,
        }
    }
    ranked
}
