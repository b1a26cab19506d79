use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::core::monitor::rank::SortKey;
use crate::core::monitor::sampler::DEFAULT_MIN_DISK_FREE;
use crate::error::MonitorError;

/// What the last column of a process row shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InfoColumn {
    Pid,
    Cmdline,
    Wchan,
    #[default]
    User,
    Priority,
}

impl InfoColumn {
    pub fn next(self) -> Self {
        match self {
            InfoColumn::Pid => InfoColumn::Cmdline,
            InfoColumn::Cmdline => InfoColumn::Wchan,
            InfoColumn::Wchan => InfoColumn::User,
            InfoColumn::User => InfoColumn::Priority,
            InfoColumn::Priority => InfoColumn::Pid,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            InfoColumn::Pid => "PID",
            InfoColumn::Cmdline => "CMD",
            InfoColumn::Wchan => "WCH",
            InfoColumn::User => "NAM",
            InfoColumn::Priority => "PRI",
        }
    }
}

impl FromStr for InfoColumn {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pid" => Ok(InfoColumn::Pid),
            "cmdline" | "cmd" => Ok(InfoColumn::Cmdline),
            "wchan" => Ok(InfoColumn::Wchan),
            "user" => Ok(InfoColumn::User),
            "priority" | "pri" => Ok(InfoColumn::Priority),
            other => Err(format!("unknown info column '{}'", other)),
        }
    }
}

impl fmt::Display for InfoColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InfoColumn::Pid => "pid",
            InfoColumn::Cmdline => "cmdline",
            InfoColumn::Wchan => "wchan",
            InfoColumn::User => "user",
            InfoColumn::Priority => "priority",
        };
        f.write_str(name)
    }
}

/// Whether the memory rows show free or used amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryMode {
    #[default]
    Free,
    Used,
}

impl MemoryMode {
    pub fn toggle(self) -> Self {
        match self {
            MemoryMode::Free => MemoryMode::Used,
            MemoryMode::Used => MemoryMode::Free,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            MemoryMode::Free => "FRE",
            MemoryMode::Used => "USE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberConfig {
    pub id: char,
    pub user: String,
}

/// A watch list shown on the groups row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupConfig {
    pub name: String,
    #[serde(default)]
    pub members: Vec<MemberConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Update period in seconds
    pub delay: f64,
    pub sort: SortKey,
    pub info: InfoColumn,
    pub memory: MemoryMode,
    /// Symbol map tried before the standard locations
    pub map_file: Option<PathBuf>,
    /// Free bytes below which a filesystem counts as full
    pub min_disk_free: u64,
    /// Number of process rows
    pub top: usize,
    pub warmup_passes: u32,
    pub proc_root: PathBuf,
    pub groups: Vec<GroupConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            delay: 5.0,
            sort: SortKey::Cpu,
            info: InfoColumn::User,
            memory: MemoryMode::Free,
            map_file: None,
            min_disk_free: DEFAULT_MIN_DISK_FREE,
            top: 12,
            warmup_passes: 4,
            proc_root: PathBuf::from("/proc"),
            groups: Vec::new(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    /// Read `path`. A missing or empty file yields the defaults; so does one
    /// that no longer parses, with a warning.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        if data.trim().is_empty() {
            return Ok(Config::default());
        }

        let config = toml::from_str::<Config>(&data).unwrap_or_else(|e| {
            log::warn!("Ignoring unreadable config {:?}: {}", path, e);
            Config::default()
        });
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let data = toml::to_string_pretty(self).with_context(|| "Failed to serialize config")?;

        fs::write(path, data)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().with_context(|| "Could not determine config directory")?;

        Ok(config_dir.join("sysglance").join("config.toml"))
    }

    pub fn validate(&self) -> crate::error::Result<()> {
        if !self.delay.is_finite() || self.delay <= 0.0 {
            return Err(MonitorError::config(format!(
                "delay must be a positive number of seconds, got {}",
                self.delay
            )));
        }
        for group in &self.groups {
            let mut ids: Vec<char> = group.members.iter().map(|m| m.id).collect();
            ids.sort_unstable();
            ids.dedup();
            if ids.len() != group.members.len() {
                return Err(MonitorError::config(format!(
                    "group '{}' reuses a member id",
                    group.name
                )));
            }
        }
        Ok(())
    }
}
