//! drop-replay: run an airdrop scenario against the sandbox host.
//!
//! Usage:
//!   drop-replay run --scenario demos/coastal_drop.json
//!   drop-replay run --scenario demos/coastal_drop.json --duration 300 --step 0.05
//!
//! Outbound events go to stdout as JSON lines; logs go to stderr
//! (filter with RUST_LOG).

mod scenario;

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process;

use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scenario::Scenario;

const DEFAULT_DURATION_SECS: f64 = 600.0;
const DEFAULT_STEP_SECS: f64 = 0.1;

fn main() {
    init_tracing("info");

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    match args[1].as_str() {
        "run" => cmd_run(&args[2..]),
        "help" | "--help" | "-h" => print_usage(),
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    }
}

fn init_tracing(default_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(io::stderr),
        )
        .init();
}

fn print_usage() {
    eprintln!(
        "drop-replay: PARADROP scenario runner\n\
         \n\
         Commands:\n\
         \n\
         run       Replay a scenario and print airdrop events as JSON lines\n\
         \n\
           --scenario <path>  Scenario JSON file\n\
           --duration <secs>  Stop after this much simulated time (default: 600)\n\
           --step <secs>      Simulation step (default: 0.1)\n\
         \n\
         Examples:\n\
         \n\
           drop-replay run --scenario demos/coastal_drop.json\n\
           RUST_LOG=paradrop_sim=debug drop-replay run --scenario demos/coastal_drop.json --step 0.05\n"
    );
}

fn parse_flag<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_secs(args: &[String], flag: &str, default: f64) -> f64 {
    match parse_flag(args, flag) {
        Some(v) => match v.parse::<f64>() {
            Ok(secs) => secs,
            Err(_) => {
                eprintln!("Error: {flag} expects a number of seconds, got {v}");
                process::exit(1);
            }
        },
        None => default,
    }
}

fn cmd_run(args: &[String]) {
    let path = match parse_flag(args, "--scenario") {
        Some(p) => PathBuf::from(p),
        None => {
            eprintln!("Error: --scenario <path> is required");
            process::exit(1);
        }
    };
    let duration = parse_secs(args, "--duration", DEFAULT_DURATION_SECS);
    let step = parse_secs(args, "--step", DEFAULT_STEP_SECS);

    let scenario = match Scenario::from_path(&path) {
        Ok(s) => s,
        Err(e) => {
            error!(path = %path.display(), "{e}");
            process::exit(1);
        }
    };

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let result = scenario::run(&scenario, duration, step, &mut out);
    if let Err(e) = out.flush() {
        error!("failed to flush output: {e}");
    }

    match result {
        Ok(stats) => eprintln!(
            "released {} units: {} landed, {} lost, {} formations",
            stats.released, stats.landed, stats.lost, stats.formations
        ),
        Err(e) => {
            error!("replay failed: {e}");
            process::exit(1);
        }
    }
}
