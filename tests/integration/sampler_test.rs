use std::collections::HashMap;

use sysglance::core::config::{GroupConfig, MemberConfig};
use sysglance::core::monitor::parse::CpuCounters;
use sysglance::core::monitor::symbols::Symbol;
use sysglance::core::monitor::{
    LoginSession, MonitorContext, PresenceStatus, Priority, Sampler, SamplerSettings,
    SymbolTable, WatchGroup,
};

use super::support::{stat_line_with_wchan, FakeSource};

type TestSampler = Sampler<FakeSource, HashMap<u32, String>>;

fn sampler_with(source: &FakeSource, symbols: SymbolTable) -> TestSampler {
    let users: HashMap<u32, String> = [(1000, "alice".to_string())].into_iter().collect();
    Sampler::new(source.clone(), users, symbols, SamplerSettings::default())
}

fn sampler(source: &FakeSource) -> TestSampler {
    sampler_with(source, SymbolTable::unresolved())
}

fn texts(ctx: &MonitorContext) -> Vec<String> {
    ctx.messages.iter().map(|m| m.text.clone()).collect()
}

#[test]
fn test_full_pass_populates_context() {
    let source = FakeSource::with_system();
    source.add_process_sized(42, "nginx", 50, 8 * 1024 * 1024, 256);
    let mut sampler = sampler(&source);
    let mut ctx = MonitorContext::default();

    sampler.pass(&mut ctx);

    let record = ctx.registry.get(42).unwrap();
    assert_eq!(record.command_name, "nginx");
    assert_eq!(record.user, "alice");
    assert!(record.command_line.starts_with("nginx --serve"));
    assert_eq!(record.resident_size, 256 * 4096);
    assert_eq!(record.wait_channel_name, "0");

    assert_eq!(ctx.memory.total, 1_048_576);
    assert_eq!(ctx.memory.used, 786_432);
    assert_eq!(ctx.loads.one, 0.50);
    assert_eq!(ctx.filesystems.len(), 1);
    assert_eq!(ctx.passes, 1);

    let messages: Vec<_> = ctx.messages.iter().collect();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].priority, Priority::Min);
    assert_eq!(messages[0].text, "No filesystems are full");
}

#[test]
fn test_cpu_split_converges_to_deltas() {
    let source = FakeSource::with_system();
    let mut sampler = sampler(&source);
    let mut ctx = MonitorContext::default();
    sampler.pass(&mut ctx);

    let mut counters = CpuCounters { user: 100, nice: 0, system: 100, idle: 800 };
    for second in 1..=3 {
        counters.user += 30;
        counters.nice += 5;
        counters.system += 15;
        counters.idle += 50;
        source.set_cpu(counters.user, counters.nice, counters.system, counters.idle);
        source.set_uptime(100.0 + second as f64);
        sampler.pass(&mut ctx);
    }

    let pct = ctx.cpu.percentages();
    assert!((pct.user - 30.0).abs() < 1e-6);
    assert!((pct.nice - 5.0).abs() < 1e-6);
    assert!((pct.system - 15.0).abs() < 1e-6);
    assert!((pct.idle - 50.0).abs() < 1e-6);
}

#[test]
fn test_process_cpu_percent() {
    let source = FakeSource::with_system();
    source.add_process(7, "worker", 0);
    let mut sampler = sampler(&source);
    let mut ctx = MonitorContext::default();
    sampler.pass(&mut ctx);

    for second in 1..=3u64 {
        source.set_process_ticks(7, "worker", 25 * second);
        source.set_uptime(100.0 + second as f64);
        sampler.pass(&mut ctx);
    }

    let pct = ctx.registry.get(7).unwrap().cpu_percent();
    assert!((pct - 25.0).abs() < 1e-6, "got {pct}");
}

#[test]
fn test_exited_process_drops_out() {
    let source = FakeSource::with_system();
    source.add_process(1, "init", 0);
    source.add_process(2, "short", 0);
    let mut sampler = sampler(&source);
    let mut ctx = MonitorContext::default();
    sampler.pass(&mut ctx);

    source.remove_process(2);
    sampler.pass(&mut ctx);

    assert!(ctx.registry.get(2).is_none());
    assert!(ctx.registry.get(1).is_some());
}

#[test]
fn test_unreadable_stat_keeps_stale_values() {
    let source = FakeSource::with_system();
    source.add_process(42, "db", 0);
    let mut sampler = sampler(&source);
    let mut ctx = MonitorContext::default();
    sampler.pass(&mut ctx);
    source.set_process_ticks(42, "db", 40);
    source.set_uptime(101.0);
    sampler.pass(&mut ctx);
    let before = ctx.registry.get(42).unwrap().cpu_percent();
    ctx.messages.drain();

    source.remove_file("42/stat");
    source.set_uptime(102.0);
    sampler.pass(&mut ctx);

    let record = ctx.registry.get(42).unwrap();
    assert_eq!(record.cpu_percent(), before);
    assert_eq!(record.cpu.last_counter(), 40);
    assert_eq!(record.command_name, "db");

    let top = ctx.messages.most_important().unwrap();
    assert_eq!(top.priority, Priority::Max);
    assert!(top.text.starts_with("/proc/42/stat: "));
}

#[test]
fn test_malformed_stat_reports_format() {
    let source = FakeSource::with_system();
    source.add_process(42, "db", 0);
    source.set_file("42/stat", "42 (db) S 1 2 3");
    let mut sampler = sampler(&source);
    let mut ctx = MonitorContext::default();
    sampler.pass(&mut ctx);

    assert!(texts(&ctx).contains(&"/proc/42/stat: unexpected format".to_string()));
    // Credentials were still readable
    assert_eq!(ctx.registry.get(42).unwrap().user, "alice");
}

#[test]
fn test_listing_failure_leaves_registry_alone() {
    let source = FakeSource::with_system();
    source.add_process(5, "cron", 0);
    let mut sampler = sampler(&source);
    let mut ctx = MonitorContext::default();
    sampler.pass(&mut ctx);
    let serial = ctx.registry.serial();

    source.fail_listing(true);
    sampler.pass(&mut ctx);

    assert_eq!(ctx.registry.serial(), serial);
    assert!(ctx.registry.get(5).is_some());
    assert!(texts(&ctx).contains(&"/proc/: denied".to_string()));
}

#[test]
fn test_missing_uptime_skips_decay_but_moves_snapshots() {
    let source = FakeSource::with_system();
    source.add_process(9, "job", 0);
    let mut sampler = sampler(&source);
    let mut ctx = MonitorContext::default();
    sampler.pass(&mut ctx);
    source.set_process_ticks(9, "job", 50);
    source.set_uptime(101.0);
    sampler.pass(&mut ctx);
    let before = ctx.registry.get(9).unwrap().cpu_percent();

    source.remove_file("uptime");
    source.set_process_ticks(9, "job", 90);
    sampler.pass(&mut ctx);

    let record = ctx.registry.get(9).unwrap();
    assert_eq!(record.cpu_percent(), before);
    assert_eq!(record.cpu.last_counter(), 90);
    assert!(texts(&ctx).iter().any(|t| t.starts_with("/proc/uptime: ")));
}

#[test]
fn test_system_parse_failure_leaves_metric_unchanged() {
    let source = FakeSource::with_system();
    let mut sampler = sampler(&source);
    let mut ctx = MonitorContext::default();
    sampler.pass(&mut ctx);

    source.set_file("loadavg", "not numbers\n");
    source.set_file("meminfo", "MemTotal: 2048 kB\n");
    sampler.pass(&mut ctx);

    assert_eq!(ctx.loads.one, 0.50);
    assert_eq!(ctx.memory.total, 1_048_576);
    let texts = texts(&ctx);
    assert!(texts.contains(&"/proc/loadavg: unexpected format".to_string()));
    assert!(texts.contains(&"/proc/meminfo: unexpected format".to_string()));
}

#[test]
fn test_legacy_meminfo_layout() {
    let source = FakeSource::with_system();
    source.set_file(
        "meminfo",
        "        total:    used:    free:  shared: buffers:  cached:\n\
         Mem:  1048576 786432 262144 0 4096 8192\n\
         Swap: 524288 0 524288\n",
    );
    let mut sampler = sampler(&source);
    let mut ctx = MonitorContext::default();
    sampler.pass(&mut ctx);

    assert_eq!(ctx.memory.total, 1_048_576);
    assert_eq!(ctx.memory.free, 262_144);
    assert_eq!(ctx.memory.cached, 8192);
}

#[test]
fn test_full_filesystem_messages() {
    let source = FakeSource::with_system();
    source.set_file(
        "mounts",
        "/dev/sda1 / ext4 rw 0 0\n\
         /dev/sdb1 /srv/very/long/mount/point xfs rw,noatime 0 0\n\
         /dev/sdc1 /mnt/backup ext4 ro,nosuid 0 0\n\
         tmpfs /tmp tmpfs rw 0 0\n",
    );
    source.set_space("/", 50_000_000);
    source.set_space("/srv/very/long/mount/point", 10);
    source.set_space("/mnt/backup", 0);
    source.set_space("/tmp", 0);
    let mut sampler = sampler(&source);
    let mut ctx = MonitorContext::default();
    sampler.pass(&mut ctx);

    let full: Vec<_> = ctx.messages.iter().filter(|m| m.priority == Priority::Med).collect();
    assert_eq!(full.len(), 1);
    assert_eq!(full[0].text, "/srv/very/long/mou is FULL!!");
    assert!(!texts(&ctx).contains(&"No filesystems are full".to_string()));
    assert_eq!(ctx.filesystems.len(), 2);
}

#[test]
fn test_logins_and_watch_groups() {
    let source = FakeSource::with_system();
    source.set_logins(vec![
        LoginSession::new("bob", ""),
        LoginSession::new("alice", ":0"),
        LoginSession::new("alice", "10.1.1.1"),
    ]);
    let group = GroupConfig {
        name: "ops".to_string(),
        members: vec![
            MemberConfig { id: 'a', user: "alice".to_string() },
            MemberConfig { id: 'c', user: "carol".to_string() },
        ],
    };
    let mut sampler = sampler(&source);
    let mut ctx = MonitorContext::new(vec![WatchGroup::from_config(&group)]);
    sampler.pass(&mut ctx);

    assert_eq!(ctx.sessions[0].user, "alice");
    assert_eq!(ctx.logins.tty_logins, 2);
    assert_eq!(ctx.logins.tty_users, 2);
    assert_eq!(ctx.logins.x_logins, 1);
    assert_eq!(ctx.groups[0].members[0].status, PresenceStatus::JustLoggedIn);
    assert_eq!(ctx.groups[0].members[1].status, PresenceStatus::NotLoggedIn);
}

#[test]
fn test_wait_channel_resolves_through_symbols() {
    let source = FakeSource::with_system();
    source.add_process(3, "sleeper", 0);
    source.set_file("3/stat", &stat_line_with_wchan(3, "sleeper", 0, 0, 0, 0xc0105abc));
    let symbols = SymbolTable::from_entries(vec![
        Symbol { address: 0xc0100000, name: "_stext".to_string() },
        Symbol { address: 0xc0105000, name: "schedule".to_string() },
    ]);
    let mut sampler = sampler_with(&source, symbols);
    let mut ctx = MonitorContext::default();
    sampler.pass(&mut ctx);

    let record = ctx.registry.get(3).unwrap();
    assert_eq!(record.wait_channel_address, 0xc0105abc);
    assert_eq!(record.wait_channel_name, "schedule");
}

#[test]
fn test_snapshot_ranks_processes() {
    let source = FakeSource::with_system();
    source.add_process_sized(1, "small", 0, 4096, 1);
    source.add_process_sized(2, "big", 0, 1 << 30, 1000);
    source.add_process_sized(3, "idle", 0, 0, 0);
    let mut sampler = sampler(&source);
    let mut ctx = MonitorContext::default();
    sampler.pass(&mut ctx);

    let snapshot = ctx.snapshot(sysglance::core::monitor::SortKey::VirtualSize, 5);
    let pids: Vec<u32> = snapshot.processes.iter().map(|p| p.pid).collect();
    assert_eq!(pids, vec![2, 1]);
    assert_eq!(snapshot.memory.total, 1_048_576);
    assert_eq!(snapshot.serial, 1);
}
