//! Kernel symbol table for naming wait channels.
//!
//! The table is loaded once from the first readable System.map candidate and
//! never changes afterwards. A load either succeeds completely or yields
//! nothing at all.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::error::{MonitorError, Result};

use super::messages::truncate_chars;

/// Longest symbol name kept, in characters.
pub const SYMBOL_WIDTH: usize = 31;

/// Release-qualified and release-independent map locations, in priority order.
/// `{release}` is replaced with the running kernel's release string.
const DEFAULT_MAP_FILES: &[&str] = &[
    "/boot/System.map-{release}",
    "/boot/System.map",
    "/lib/modules/{release}/System.map",
    "/usr/src/linux/System.map",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub address: u64,
    pub name: String,
}

/// Address-ordered symbol table. Empty means unresolved.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    entries: Vec<Symbol>,
}

/// Build the ordered candidate list: the override first, then the defaults.
pub fn candidate_paths(override_path: Option<&Path>, release: &str) -> Vec<PathBuf> {
    let mut paths = Vec::with_capacity(DEFAULT_MAP_FILES.len() + 1);
    if let Some(path) = override_path {
        paths.push(path.to_path_buf());
    }
    paths.extend(
        DEFAULT_MAP_FILES
            .iter()
            .map(|template| PathBuf::from(template.replace("{release}", release))),
    );
    paths
}

impl SymbolTable {
    /// A table that resolves nothing; every lookup renders hex.
    pub fn unresolved() -> Self {
        Self::default()
    }

    /// Entries must already be sorted by address.
    pub fn from_entries(entries: Vec<Symbol>) -> Self {
        Self { entries }
    }

    /// Open the first candidate that exists and parse it in full.
    pub fn build(candidates: &[PathBuf]) -> Result<Self> {
        for path in candidates {
            let file = match File::open(path) {
                Ok(file) => file,
                Err(_) => continue,
            };
            log::debug!("Loading symbol map from {}", path.display());
            return Self::parse(BufReader::new(file), path);
        }
        Err(MonitorError::SymbolMapNotFound)
    }

    /// Parse `address type name` lines. Any bad line discards the whole table.
    pub fn parse<R: BufRead>(reader: R, origin: &Path) -> Result<Self> {
        let mut entries = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let symbol = parse_line(&line).ok_or_else(|| MonitorError::SymbolMapParse {
                path: origin.to_path_buf(),
                line: index + 1,
            })?;
            entries.push(symbol);
        }
        Ok(Self { entries })
    }

    /// Name of the greatest symbol at or below `address`, or the address in
    /// hex when the table is empty, the address is zero, or it lies below
    /// the first symbol.
    pub fn lookup(&self, address: u64) -> String {
        if self.entries.is_empty() || address == 0 {
            return format!("{:x}", address);
        }
        match self.entries.partition_point(|symbol| symbol.address <= address) {
            0 => format!("{:x}", address),
            n => self.entries[n - 1].name.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_line(line: &str) -> Option<Symbol> {
    let mut fields = line.split_whitespace();
    let address = u64::from_str_radix(fields.next()?, 16).ok()?;
    let kind = fields.next()?;
    if kind.chars().count() != 1 {
        return None;
    }
    let name = fields.next()?;
    Some(Symbol {
        address,
        name: truncate_chars(name, SYMBOL_WIDTH),
    })
}
