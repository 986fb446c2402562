//! ln-gamma-stats CLI
//!
//! Thin shell over `ln_gamma_stats::cli`: parse, run, map errors to exit
//! status 1.

use clap::Parser;
use ln_gamma_stats::cli::{run, Args};

fn main() {
    #[cfg(feature = "tracing")]
    init_tracing();

    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

#[cfg(feature = "tracing")]
fn init_tracing() {
    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}
