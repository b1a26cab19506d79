use std::collections::HashMap;
use std::fs;

use sysglance::core::monitor::{
    candidate_paths, MonitorContext, Sampler, SamplerSettings, SymbolTable,
};
use sysglance::MonitorError;
use tempfile::TempDir;

use super::support::{stat_line_with_wchan, FakeSource};

const MAP: &str = "c0100000 T _stext\nc0105000 t schedule\nc0107000 T do_select\nc0109000 T pipe_wait\n";

fn wchan_after_pass(symbols: SymbolTable, wchan: u64) -> String {
    let source = FakeSource::with_system();
    source.add_process(3, "sleeper", 0);
    source.set_file("3/stat", &stat_line_with_wchan(3, "sleeper", 0, 0, 0, wchan));
    let mut sampler = Sampler::new(
        source,
        HashMap::<u32, String>::new(),
        symbols,
        SamplerSettings::default(),
    );
    let mut ctx = MonitorContext::default();
    sampler.pass(&mut ctx);
    ctx.registry.get(3).unwrap().wait_channel_name.clone()
}

#[test]
fn test_override_map_names_wait_channels() {
    let dir = TempDir::new().unwrap();
    let map = dir.path().join("System.map");
    fs::write(&map, MAP).unwrap();

    let candidates = candidate_paths(Some(&map), "0.0.0-test");
    let table = SymbolTable::build(&candidates).unwrap();
    assert_eq!(table.len(), 4);

    assert_eq!(wchan_after_pass(table.clone(), 0xc0107010), "do_select");
    assert_eq!(wchan_after_pass(table.clone(), 0xc01fffff), "pipe_wait");
    assert_eq!(wchan_after_pass(table, 0), "0");
}

#[test]
fn test_broken_map_leaves_hex_channels() {
    let dir = TempDir::new().unwrap();
    let map = dir.path().join("System.map");
    fs::write(&map, "c0100000 T _stext\nc0105000 schedule\n").unwrap();

    let err = SymbolTable::build(&[map]).unwrap_err();
    assert!(matches!(err, MonitorError::SymbolMapParse { line: 2, .. }));

    let table = SymbolTable::build(&[dir.path().join("missing")]).unwrap_or_default();
    assert!(table.is_empty());
    assert_eq!(wchan_after_pass(table, 0xc0105abc), "c0105abc");
}
