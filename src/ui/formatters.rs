use humansize::{format_size as human_format_size, BINARY};

use crate::core::config::{InfoColumn, MemoryMode};
use crate::core::monitor::metrics::{MemoryState, ProcessView};
use crate::core::monitor::rank::SortKey;

const MIB: u64 = 1024 * 1024;

/// Format a byte count in human-readable binary units (KiB, MiB, ...)
pub fn format_size(size: u64) -> String {
    human_format_size(size, BINARY)
}

/// Kilobytes, right-aligned the way the memory rows show them
pub fn format_kib(bytes: u64) -> String {
    format!("{:6}K", bytes >> 10)
}

/// Compact size for a process row: megabytes with one decimal from 1 MiB up,
/// whole kilobytes below that.
pub fn format_compact_size(bytes: u64) -> String {
    if bytes >= MIB {
        format!("{:4.1}M", bytes as f64 / MIB as f64)
    } else {
        format!("{:4}K", bytes >> 10)
    }
}

/// The sorted-on column of a process row, followed by the state code.
pub fn format_sort_value(process: &ProcessView, key: SortKey) -> String {
    match key {
        SortKey::Cpu => format!("{:4.1}% {}", process.cpu_percent, process.state),
        SortKey::ResidentSize => {
            format!("{} {}", format_compact_size(process.resident_size), process.state)
        }
        SortKey::VirtualSize => {
            format!("{} {}", format_compact_size(process.virtual_size), process.state)
        }
    }
}

/// The info column, cut to nine characters.
pub fn format_info(process: &ProcessView, column: InfoColumn) -> String {
    let text = match column {
        InfoColumn::Pid => process.pid.to_string(),
        InfoColumn::Cmdline => process.command_line.clone(),
        InfoColumn::Wchan => process.wait_channel.clone(),
        InfoColumn::User => process.user.clone(),
        InfoColumn::Priority => process.priority.to_string(),
    };
    format!("{:<9.9}", text)
}

pub fn format_name(process: &ProcessView) -> String {
    format!("{:<8.8}", process.command_name)
}

/// Memory and swap figures for the chosen mode.
pub fn memory_figures(memory: &MemoryState, mode: MemoryMode) -> (String, String) {
    match mode {
        MemoryMode::Free => (format_kib(memory.free), format_kib(memory.swap_free)),
        MemoryMode::Used => (format_kib(memory.used), format_kib(memory.swap_used)),
    }
}

/// Mode line, e.g. `--CPU-NAM-FRE-------------`
pub fn flags_line(sort: SortKey, info: InfoColumn, memory: MemoryMode) -> String {
    format!("--{}-{}-{}-------------", sort.tag(), info.tag(), memory.tag())
}
