//! Parsers for the text records the kernel exposes under the proc root.
//!
//! Each parser takes the full file contents and returns `None` when the text
//! does not have the expected shape. Callers turn that into a status message
//! naming the file.

use super::metrics::{LoadAverages, MemoryState};

/// Fields taken from `<pid>/stat`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatFields {
    pub command_name: String,
    pub state: char,
    /// utime + stime
    pub cpu_ticks: u64,
    /// Nice value, shown as the process priority.
    pub priority: i64,
    pub virtual_size: u64,
    pub resident_pages: u64,
    pub wait_channel: u64,
}

/// Real, effective, saved and filesystem ids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct IdQuad {
    pub real: u32,
    pub effective: u32,
    pub saved: u32,
    pub filesystem: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Credentials {
    pub uid: IdQuad,
    pub gid: IdQuad,
}

/// Aggregate CPU tick counters from the first line of `stat`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuCounters {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
}

/// One row of the mount table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    pub device: String,
    pub mount_point: String,
    pub fs_type: String,
    pub options: String,
}

impl MountEntry {
    pub fn is_read_only(&self) -> bool {
        self.options.split(',').next() == Some("ro")
    }
}

/// Parse `<pid>/stat`. The command name sits between the first `(` and the
/// last `)`, so names containing spaces or parentheses survive.
pub fn parse_process_stat(text: &str) -> Option<StatFields> {
    let open = text.find('(')?;
    let close = text.rfind(')')?;
    if close < open {
        return None;
    }
    let command_name = text[open + 1..close].to_string();
    let rest: Vec<&str> = text[close + 1..].split_whitespace().collect();

    // rest[0] is field 3 (state); field N lives at rest[N - 3]
    if rest.len() < 33 {
        return None;
    }
    let state = rest[0].chars().next()?;
    let utime: u64 = rest[11].parse().ok()?;
    let stime: u64 = rest[12].parse().ok()?;
    let priority: i64 = rest[16].parse().ok()?;
    let virtual_size: u64 = rest[20].parse().ok()?;
    // rss may be negative on some kernels for kernel threads
    let resident_pages = rest[21].parse::<i64>().ok()?.max(0) as u64;
    let wait_channel: u64 = rest[32].parse().ok()?;

    Some(StatFields {
        command_name,
        state,
        cpu_ticks: utime.saturating_add(stime),
        priority,
        virtual_size,
        resident_pages,
        wait_channel,
    })
}

/// Parse the `Uid:` and `Gid:` lines of `<pid>/status`.
pub fn parse_process_status(text: &str) -> Option<Credentials> {
    let mut uid = None;
    let mut gid = None;
    for line in text.lines() {
        if let Some(rest) = line.strip_prefix("Uid:") {
            uid = parse_id_quad(rest);
        } else if let Some(rest) = line.strip_prefix("Gid:") {
            gid = parse_id_quad(rest);
        }
    }
    Some(Credentials {
        uid: uid?,
        gid: gid?,
    })
}

fn parse_id_quad(text: &str) -> Option<IdQuad> {
    let ids: Vec<u32> = text
        .split_whitespace()
        .map(|field| field.parse().ok())
        .collect::<Option<Vec<_>>>()?;
    if ids.len() != 4 {
        return None;
    }
    Some(IdQuad {
        real: ids[0],
        effective: ids[1],
        saved: ids[2],
        filesystem: ids[3],
    })
}

/// Turn raw command-line bytes into display text: NUL separators become
/// spaces and at most `max_bytes` bytes are kept.
pub fn normalize_cmdline(raw: &[u8], max_bytes: usize) -> String {
    let kept = &raw[..raw.len().min(max_bytes)];
    let spaced: Vec<u8> = kept
        .iter()
        .map(|&b| if b == 0 { b' ' } else { b })
        .collect();
    String::from_utf8_lossy(&spaced).into_owned()
}

/// First line of `stat`: `cpu user nice system idle ...`.
pub fn parse_cpu_counters(text: &str) -> Option<CpuCounters> {
    let line = text.lines().next()?;
    let mut fields = line.split_whitespace();
    if fields.next()? != "cpu" {
        return None;
    }
    let mut next = || fields.next()?.parse::<u64>().ok();
    Some(CpuCounters {
        user: next()?,
        nice: next()?,
        system: next()?,
        idle: next()?,
    })
}

/// Seconds since boot, the first value of `uptime`.
pub fn parse_uptime(text: &str) -> Option<f64> {
    let secs: f64 = text.split_whitespace().next()?.parse().ok()?;
    secs.is_finite().then_some(secs)
}

pub fn parse_loadavg(text: &str) -> Option<LoadAverages> {
    let mut fields = text.split_whitespace();
    let mut next = || fields.next()?.parse::<f64>().ok();
    Some(LoadAverages {
        one: next()?,
        five: next()?,
        fifteen: next()?,
    })
}

/// Parse `meminfo` in either layout. The keyed layout is recognised by a
/// first line starting with `MemTotal`; anything else is read as the legacy
/// `Mem:` / `Swap:` table.
pub fn parse_meminfo(text: &str) -> Option<MemoryState> {
    let first = text.lines().next()?;
    if first.starts_with("MemTotal") {
        parse_keyed_meminfo(text)
    } else {
        parse_legacy_meminfo(text)
    }
}

fn parse_keyed_meminfo(text: &str) -> Option<MemoryState> {
    let mut values = std::collections::HashMap::new();
    for line in text.lines() {
        let Some((key, rest)) = line.split_once(':') else {
            continue;
        };
        let Some(kib) = rest.split_whitespace().next() else {
            continue;
        };
        if let Ok(kib) = kib.parse::<u64>() {
            values.insert(key.trim(), kib << 10);
        }
    }
    let get = |key: &str| values.get(key).copied();

    let total = get("MemTotal")?;
    let free = get("MemFree")?;
    let swap_total = get("SwapTotal")?;
    let swap_free = get("SwapFree")?;
    Some(MemoryState {
        total,
        used: total.saturating_sub(free),
        free,
        shared: get("MemShared").or_else(|| get("Shmem")).unwrap_or(0),
        buffers: get("Buffers").unwrap_or(0),
        cached: get("Cached").unwrap_or(0),
        swap_total,
        swap_used: swap_total.saturating_sub(swap_free),
        swap_free,
    })
}

fn parse_legacy_meminfo(text: &str) -> Option<MemoryState> {
    let mut mem = None;
    let mut swap = None;
    for line in text.lines() {
        if let Some(rest) = line.strip_prefix("Mem:") {
            mem = parse_u64_row(rest, 6);
        } else if let Some(rest) = line.strip_prefix("Swap:") {
            swap = parse_u64_row(rest, 3);
        }
    }
    let mem = mem?;
    let swap = swap?;
    Some(MemoryState {
        total: mem[0],
        used: mem[1],
        free: mem[2],
        shared: mem[3],
        buffers: mem[4],
        cached: mem[5],
        swap_total: swap[0],
        swap_used: swap[1],
        swap_free: swap[2],
    })
}

fn parse_u64_row(text: &str, count: usize) -> Option<Vec<u64>> {
    let row: Vec<u64> = text
        .split_whitespace()
        .take(count)
        .map(|field| field.parse().ok())
        .collect::<Option<Vec<_>>>()?;
    (row.len() == count).then_some(row)
}

/// Parse the mount table, skipping malformed rows.
pub fn parse_mounts(text: &str) -> Vec<MountEntry> {
    text.lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            Some(MountEntry {
                device: fields.next()?.to_string(),
                mount_point: unescape_mount_field(fields.next()?),
                fs_type: fields.next()?.to_string(),
                options: fields.next()?.to_string(),
            })
        })
        .collect()
}

/// Decode the `\ooo` octal escapes the kernel uses for blanks in paths.
fn unescape_mount_field(field: &str) -> String {
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 3 < bytes.len() {
            let digits = &bytes[i + 1..i + 4];
            if digits.iter().all(|d| (b'0'..=b'7').contains(d)) {
                let value = digits.iter().fold(0u32, |acc, d| acc * 8 + u32::from(d - b'0'));
                if let Ok(value) = u8::try_from(value) {
                    out.push(value);
                    i += 4;
                    continue;
                }
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
