//! Slot table of observed processes.
//!
//! Slots are reconciled against the live pid listing once per sampling pass.
//! A slot is claimed by pid match first, then by the first free index, and
//! only then by extending the high-water mark `maxi`. Slots of processes that
//! were not confirmed in a pass are freed in place and reused later; the table
//! never compacts, and `maxi` retreats by at most one slot per pass.

use serde::Serialize;

use super::decay::DecayRing;
use super::messages::truncate_chars;
use super::parse::{Credentials, StatFields};
use super::symbols::{SymbolTable, SYMBOL_WIDTH};
use super::users::UserLookup;

pub const INITIAL_CAPACITY: usize = 32;
pub const NAME_WIDTH: usize = 31;
pub const CMDLINE_WIDTH: usize = 31;
pub const USER_WIDTH: usize = 15;

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessRecord {
    /// 0 marks a free slot.
    pub pid: u32,
    pub serial: u64,
    pub command_name: String,
    pub command_line: String,
    pub user: String,
    pub credentials: Credentials,
    pub state: char,
    pub cpu: DecayRing,
    pub priority: i64,
    pub virtual_size: u64,
    pub resident_size: u64,
    pub wait_channel_address: u64,
    pub wait_channel_name: String,
}

impl ProcessRecord {
    fn claimed(pid: u32) -> Self {
        Self {
            pid,
            ..Self::default()
        }
    }

    pub fn is_free(&self) -> bool {
        self.pid == 0
    }

    pub fn cpu_percent(&self) -> f64 {
        self.cpu.weighted()
    }
}

/// What one pass managed to read about a listed pid. `None` fields could not
/// be read and leave the slot's previous values in place.
#[derive(Debug, Clone, Default)]
pub struct LiveProcess {
    pub pid: u32,
    pub stat: Option<StatFields>,
    pub credentials: Option<Credentials>,
    pub command_line: Option<String>,
}

impl LiveProcess {
    pub fn new(pid: u32) -> Self {
        Self {
            pid,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProcessRegistry {
    slots: Vec<ProcessRecord>,
    maxi: usize,
    serial: u64,
}

impl Default for ProcessRegistry {
    fn default() -> Self {
        Self::with_capacity(INITIAL_CAPACITY)
    }
}

impl ProcessRegistry {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: vec![ProcessRecord::default(); capacity],
            maxi: 0,
            serial: 0,
        }
    }

    /// Bring the table in line with one pass worth of live processes.
    pub fn reconcile<L: UserLookup + ?Sized>(
        &mut self,
        live: &[LiveProcess],
        elapsed_ticks: u64,
        symbols: &SymbolTable,
        users: &L,
        page_size: u64,
    ) {
        self.serial += 1;
        let serial = self.serial;

        for process in live.iter().filter(|p| p.pid != 0) {
            let index = self.claim(process.pid);
            let record = &mut self.slots[index];

            if let Some(stat) = &process.stat {
                record.command_name = truncate_chars(&stat.command_name, NAME_WIDTH);
                record.state = stat.state;
                record.priority = stat.priority;
                record.virtual_size = stat.virtual_size;
                record.resident_size = stat.resident_pages.saturating_mul(page_size);
                record.wait_channel_address = stat.wait_channel;
                record.wait_channel_name =
                    truncate_chars(&symbols.lookup(stat.wait_channel), SYMBOL_WIDTH);
                record.cpu.advance(stat.cpu_ticks, elapsed_ticks);
            }
            if let Some(credentials) = process.credentials {
                record.credentials = credentials;
                record.user = truncate_chars(&users.display_name(credentials.uid.real), USER_WIDTH);
            }
            if let Some(command_line) = &process.command_line {
                record.command_line = command_line.clone();
            }
            record.serial = serial;
        }

        for record in &mut self.slots[..self.maxi] {
            if !record.is_free() && record.serial != serial {
                log::trace!("Process {} is gone", record.pid);
                record.pid = 0;
            }
        }

        if self.maxi > 0 && self.slots[self.maxi - 1].is_free() {
            self.maxi -= 1;
        }
    }

    /// Slot for `pid`: its existing slot, else the first free one below
    /// `maxi`, else a fresh slot at `maxi`. New slots start zeroed.
    fn claim(&mut self, pid: u32) -> usize {
        if let Some(index) = self.slots[..self.maxi].iter().position(|r| r.pid == pid) {
            return index;
        }

        let index = match self.slots[..self.maxi].iter().position(ProcessRecord::is_free) {
            Some(index) => index,
            None => {
                if self.maxi == self.slots.len() {
                    let capacity = self.slots.len() * 2;
                    log::debug!("Growing process table to {} slots", capacity);
                    self.slots.resize(capacity, ProcessRecord::default());
                }
                self.maxi += 1;
                self.maxi - 1
            }
        };
        self.slots[index] = ProcessRecord::claimed(pid);
        index
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// High-water index: no active slot lives at or above it.
    pub fn high_water(&self) -> usize {
        self.maxi
    }

    pub fn serial(&self) -> u64 {
        self.serial
    }

    /// Active records in slot order.
    pub fn iter_active(&self) -> impl Iterator<Item = &ProcessRecord> {
        self.slots[..self.maxi].iter().filter(|r| !r.is_free())
    }

    pub fn get(&self, pid: u32) -> Option<&ProcessRecord> {
        if pid == 0 {
            return None;
        }
        self.iter_active().find(|r| r.pid == pid)
    }

    pub fn slot_of(&self, pid: u32) -> Option<usize> {
        if pid == 0 {
            return None;
        }
        self.slots[..self.maxi].iter().position(|r| r.pid == pid)
    }

    pub fn len(&self) -> usize {
        self.iter_active().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter_active().next().is_none()
    }
}
