//! Example: run the hardness pipeline on the worker thread.
//!
//! Usage: cargo run --release --example run_pipeline -- [config.json]
//!
//! Without a config file the fast preset is used. Set RUST_LOG=debug for
//! per-phase parameters.

use hardness_runner::{EngineConfig, JobOutput, Worker};
use std::env;

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let config = match env::args().nth(1) {
        Some(path) => match EngineConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => EngineConfig::fast(),
    };

    let mut worker = match Worker::spawn() {
        Ok(worker) => worker,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    let job = match worker.submit(config) {
        Ok(job) => job,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    println!("=== Phase transition pipeline (job {}) ===", job);
    while let Some(output) = worker.recv() {
        match output {
            JobOutput::Phase { report, .. } => {
                println!("[{}] {}", report.phase().name(), report.summary());
            }
            JobOutput::Finished { result, .. } => {
                match result {
                    Ok(report) => {
                        println!("\n=== Done ===");
                        println!("Peak alpha: {:.2}", report.peak_alpha);
                        println!("Trap detected: {}", report.trap_detected);
                        println!("Phases run: {}", report.reports.len());
                    }
                    Err(e) => {
                        eprintln!("Pipeline failed: {}", e);
                        std::process::exit(1);
                    }
                }
                break;
            }
        }
    }
    worker.shutdown();
}
