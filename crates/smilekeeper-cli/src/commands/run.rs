//! Interactive stdin-driven session runner.
//!
//! Each input line is one tick. The landmark extractor (or a human at
//! a terminal) feeds ratios in; actuator commands go to the device
//! node, or to stdout when no device is given.
//!
//! ```text
//! r 0.43     tick with a smile-ratio sample
//! none       tick with no face detected
//! baseline   calibrate and start the warm-up
//! status     print the session snapshot as JSON
//! end        flush active pulses and exit
//! ```

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use smilekeeper_core::{Config, LineTransport, SessionController};

#[derive(Args)]
pub struct RunArgs {
    /// Serial device node to write commands to (stdout if omitted)
    #[arg(long)]
    pub device: Option<PathBuf>,
    /// Override the configured RNG seed
    #[arg(long)]
    pub seed: Option<u64>,
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load()?;
    if args.seed.is_some() {
        config.seed = args.seed;
    }

    let sink: Box<dyn Write> = match &args.device {
        Some(path) => Box::new(
            std::fs::OpenOptions::new()
                .write(true)
                .open(path)
                .map_err(|e| format!("cannot open device {}: {e}", path.display()))?,
        ),
        None => Box::new(std::io::stdout()),
    };
    let mut transport = LineTransport::new(sink);

    let mut controller = SessionController::new(config);
    let started = Instant::now();
    let mut last_tick = 0.0f64;

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let line = line.trim();
        let now = started.elapsed().as_secs_f64();
        let dt = now - last_tick;

        match line.split_once(' ').map_or((line, ""), |(a, b)| (a, b)) {
            ("r", ratio) => {
                let ratio: f64 = ratio.trim().parse()?;
                report_events(&controller.tick(now, dt, Some(ratio), &mut transport));
                last_tick = now;
            }
            ("none", _) => {
                report_events(&controller.tick(now, dt, None, &mut transport));
                last_tick = now;
            }
            ("baseline", _) => match controller.set_baseline(now) {
                Some(event) => eprintln!("{}", serde_json::to_string(&event)?),
                None => eprintln!("baseline: no sample yet, or already calibrated"),
            },
            ("status", _) => {
                println!("{}", serde_json::to_string_pretty(&controller.snapshot())?);
            }
            ("end", _) | ("quit", _) => break,
            ("", _) => {}
            (other, _) => eprintln!("unknown command: {other}"),
        }
    }

    // Flush paired offs for anything still on before releasing the
    // transport.
    let report = controller.end_session(&mut transport);
    report_events(&report);
    Ok(())
}

fn report_events(report: &smilekeeper_core::TickReport) {
    for event in &report.events {
        if let Ok(json) = serde_json::to_string(event) {
            eprintln!("{json}");
        }
    }
}
