use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;

use sysglance::core::config::InfoColumn;
use sysglance::core::monitor::SortKey;

fn build_cli() -> Command {
    Command::new("sysglance")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Handy information for sysadmins: a live, ranked view of processes and system load")
        .arg(
            Arg::new("delay")
                .short('d')
                .long("delay")
                .value_name("SECONDS")
                .help("Update period in seconds (fractions allowed)")
                .value_parser(clap::value_parser!(f64)),
        )
        .arg(
            Arg::new("sort")
                .short('s')
                .long("sort")
                .value_name("KEY")
                .help("Rank processes by cpu, rss or vsize")
                .value_parser(clap::value_parser!(SortKey)),
        )
        .arg(
            Arg::new("info")
                .short('i')
                .long("info")
                .value_name("COLUMN")
                .help("Info column: pid, cmdline, wchan, user or priority")
                .value_parser(clap::value_parser!(InfoColumn)),
        )
        .arg(
            Arg::new("map-file")
                .short('m')
                .long("map-file")
                .value_name("PATH")
                .help("Kernel symbol map tried before the standard locations")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("PATH")
                .help("Configuration file (default: <config dir>/sysglance/config.toml)")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print one JSON snapshot per update instead of the screen")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("count")
                .short('n')
                .long("count")
                .value_name("N")
                .help("Stop after N snapshots (with --json)")
                .value_parser(clap::value_parser!(u64))
                .requires("json"),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .value_name("PATH")
                .help("Write log output to this file")
                .value_parser(clap::value_parser!(PathBuf)),
        )
}

fn main() -> Result<()> {
    let matches = build_cli().get_matches();

    sysglance::init_logging(matches.get_one::<PathBuf>("log-file").map(PathBuf::as_path))?;

    sysglance::commands::monitor(&matches)
}
