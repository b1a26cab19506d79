use std::collections::{HashMap, HashSet};

use sysglance::core::monitor::parse::StatFields;
use sysglance::core::monitor::{top_k, LiveProcess, ProcessRegistry, SortKey, SymbolTable};

fn live(pid: u32, ticks: u64, vsize: u64) -> LiveProcess {
    LiveProcess {
        pid,
        stat: Some(StatFields {
            command_name: format!("p{pid}"),
            state: 'R',
            cpu_ticks: ticks,
            priority: 0,
            virtual_size: vsize,
            resident_pages: vsize / 4096,
            wait_channel: 0,
        }),
        ..LiveProcess::default()
    }
}

fn pass(registry: &mut ProcessRegistry, live: &[LiveProcess]) {
    let users: HashMap<u32, String> = HashMap::new();
    registry.reconcile(live, 100, &SymbolTable::unresolved(), &users, 4096);
}

/// Small deterministic generator so churn runs are repeatable.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.0 >> 33
    }
}

#[test]
fn test_active_pids_stay_unique_under_churn() {
    let mut registry = ProcessRegistry::default();
    let mut rng = Lcg(7);

    for _ in 0..200 {
        let count = (rng.next() % 80) as usize;
        let mut batch: Vec<LiveProcess> = (0..count)
            .map(|_| live((rng.next() % 120) as u32 + 1, rng.next() % 1000, 4096))
            .collect();
        // A listing can mention the same pid twice; it must not take two slots
        if let Some(first) = batch.first().cloned() {
            batch.push(first);
        }
        pass(&mut registry, &batch);

        let mut seen = HashSet::new();
        for record in registry.iter_active() {
            assert_ne!(record.pid, 0);
            assert!(seen.insert(record.pid), "pid {} appears twice", record.pid);
        }
        let expected: HashSet<u32> = batch.iter().map(|p| p.pid).collect();
        assert_eq!(seen, expected);
        assert!(registry.high_water() <= registry.capacity());
    }
}

#[test]
fn test_returning_pid_reclaims_its_slot_when_untouched() {
    let mut registry = ProcessRegistry::default();
    pass(&mut registry, &[live(10, 0, 0), live(20, 0, 0), live(30, 0, 0)]);
    let slot = registry.slot_of(20);

    pass(&mut registry, &[live(10, 0, 0), live(30, 0, 0)]);
    pass(&mut registry, &[live(10, 0, 0), live(20, 0, 0), live(30, 0, 0)]);

    assert_eq!(registry.slot_of(20), slot);
}

#[test]
fn test_returning_pid_moves_when_slot_was_claimed() {
    let mut registry = ProcessRegistry::default();
    pass(&mut registry, &[live(10, 0, 0), live(20, 0, 0), live(30, 0, 0)]);
    assert_eq!(registry.slot_of(20), Some(1));

    pass(&mut registry, &[live(10, 0, 0), live(30, 0, 0)]);
    pass(&mut registry, &[live(10, 0, 0), live(30, 0, 0), live(40, 0, 0)]);
    assert_eq!(registry.slot_of(40), Some(1));

    pass(&mut registry, &[live(10, 0, 0), live(20, 0, 0), live(30, 0, 0), live(40, 0, 0)]);
    assert_eq!(registry.slot_of(20), Some(3));
}

#[test]
fn test_growth_doubles_capacity_once() {
    let mut registry = ProcessRegistry::with_capacity(32);
    let batch: Vec<LiveProcess> = (1..=40).map(|pid| live(pid, pid as u64, 4096)).collect();
    pass(&mut registry, &batch);

    assert_eq!(registry.capacity(), 64);
    assert_eq!(registry.len(), 40);
    for pid in 1..=40 {
        assert_eq!(registry.get(pid).unwrap().cpu.last_counter(), pid as u64);
    }
}

#[test]
fn test_top_k_properties() {
    let mut registry = ProcessRegistry::default();
    let sizes = [0u64, 8192, 4096, 65536, 0, 16384, 8192];
    let batch: Vec<LiveProcess> = sizes
        .iter()
        .enumerate()
        .map(|(i, &size)| live(i as u32 + 1, 0, size))
        .collect();
    pass(&mut registry, &batch);

    for k in 0..10 {
        let ranked = top_k(&registry, SortKey::VirtualSize, k);
        assert!(ranked.len() <= k);
        assert!(ranked.len() <= 5, "only five processes have a positive size");

        let unique: HashSet<u32> = ranked.iter().copied().collect();
        assert_eq!(unique.len(), ranked.len());

        let values: Vec<u64> = ranked
            .iter()
            .map(|&pid| registry.get(pid).unwrap().virtual_size)
            .collect();
        assert!(values.windows(2).all(|w| w[0] >= w[1]));
        assert!(values.iter().all(|&v| v > 0));
    }

    assert_eq!(top_k(&registry, SortKey::VirtualSize, 3), vec![4, 6, 2]);
}

#[test]
fn test_top_k_leaves_registry_untouched() {
    let mut registry = ProcessRegistry::default();
    pass(&mut registry, &[live(1, 0, 4096), live(2, 0, 8192)]);
    let before: Vec<(u32, Option<usize>)> = [1, 2].iter().map(|&p| (p, registry.slot_of(p))).collect();

    let _ = top_k(&registry, SortKey::VirtualSize, 2);
    let after: Vec<(u32, Option<usize>)> = [1, 2].iter().map(|&p| (p, registry.slot_of(p))).collect();
    assert_eq!(before, after);
}
