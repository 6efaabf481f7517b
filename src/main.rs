// keysweep - keyspace scanner
// Derives P2PKH addresses from random scalars and tests them against a
// precomputed target set. Matches land in an append-only log.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::sync::Arc;

use clap::Parser;

use keysweep::cli::Args;
use keysweep::error::Result;
use keysweep::keygen::OsKeySource;
use keysweep::sink::ResultSink;
use keysweep::targets::TargetSet;
use keysweep::Supervisor;

fn main() {
    if let Err(e) = run(Args::parse()) {
        eprintln!("[✗] {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    println!("keysweep | keyspace scanner");

    let cfg = args.to_config();
    cfg.validate()?;

    println!("[*] Loading targets: {}", args.targets.display());
    let file = File::open(&args.targets)?;
    let lines = BufReader::new(file).lines().map_while(|l| l.ok());
    let targets = TargetSet::from_lines_guarded(
        lines,
        cfg.min_memory_headroom,
        keysweep::mem::available_fraction,
    )?;
    let report = targets.report();
    println!(
        "[✓] Loaded {} targets ({} lines skipped{})",
        report.loaded,
        report.skipped,
        if report.truncated { ", load truncated" } else { "" }
    );

    let sink = ResultSink::open(&args.found)?;
    println!("[*] Found-record log: {}", sink.path().display());

    let mut supervisor = Supervisor::new(cfg.clone(), OsKeySource, Arc::new(targets), sink)?;

    let handle = supervisor.shutdown_handle();
    ctrlc::set_handler(move || {
        println!("\n[!] Shutdown requested, draining...");
        handle.trigger();
    })
    .ok();

    println!(
        "[▶] Scanning with {} workers, target {:.0} keys/s (Ctrl+C to stop)\n",
        cfg.workers, cfg.target_rate
    );

    let report = supervisor.run()?;

    println!("\n[✓] Scan complete");
    println!("    checked: {}", report.checked);
    println!("    found:   {}", report.found);
    println!(
        "    speed:   {:.0} keys/s over {:.1}s",
        report.average_rate,
        report.elapsed.as_secs_f64()
    );
    if let Some(warning) = report.sink_warning {
        eprintln!("[!] Warning: {}", warning);
    }
    Ok(())
}
