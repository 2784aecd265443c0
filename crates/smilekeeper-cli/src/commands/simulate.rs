use std::path::PathBuf;

use clap::Args;
use smilekeeper_core::{Config, Simulation};

#[derive(Args)]
pub struct SimulateArgs {
    /// Trace file: one smile ratio per line, "none" or "-" for a
    /// no-face tick, "#" comments allowed
    #[arg(long)]
    pub trace: PathBuf,
    /// RNG seed (defaults to the configured seed, then 42)
    #[arg(long)]
    pub seed: Option<u64>,
    /// Ticks per second of session time
    #[arg(long, default_value = "30")]
    pub tick_hz: f64,
    /// Tick index at which the baseline is calibrated
    #[arg(long, default_value = "0")]
    pub calibrate_at: usize,
}

pub fn run(args: SimulateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let trace = parse_trace(&std::fs::read_to_string(&args.trace)?)?;
    if trace.is_empty() {
        return Err(format!("trace {} is empty", args.trace.display()).into());
    }

    let config = Config::load()?;
    let mut sim = Simulation::new(config)
        .with_tick_hz(args.tick_hz)
        .calibrate_at(args.calibrate_at);
    if let Some(seed) = args.seed {
        sim = sim.with_seed(seed);
    }

    let report = sim.run(&trace);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn parse_trace(content: &str) -> Result<Vec<Option<f64>>, Box<dyn std::error::Error>> {
    let mut trace = Vec::new();
    for (lineno, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line == "none" || line == "-" {
            trace.push(None);
        } else {
            let ratio: f64 = line
                .parse()
                .map_err(|e| format!("line {}: {e}", lineno + 1))?;
            trace.push(Some(ratio));
        }
    }
    Ok(trace)
}
