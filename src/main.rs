//! # JTL Splitter - Main Entry Point
//!
//! Command-line front end for the splitter library. The binary performs
//! these key operations:
//! 1. **Initialize logging**: colorized, level-filtered console output
//! 2. **Parse arguments**: warmup duration, input file, summary options
//! 3. **Validate configuration**: bad input is rejected before any file is
//!    touched
//! 4. **Run the split**: one streaming pass producing the warmup and
//!    measurement partitions and, optionally, per-label summary documents
//!
//! Malformed-shape lines are logged and skipped; corrupt numeric content and
//! I/O failures abort the run with a descriptive error, leaving any partial
//! output files in place for diagnosis.

use anyhow::Result;
use clap::Parser;
use jtl_splitter::{
    cli::{Args, SplitConfig},
    logging::ColorizedFormatter,
    Splitter,
};
use tracing::info;

fn main() -> Result<()> {
    // Log level can be controlled via RUST_LOG; defaults to info so that
    // progress and skipped-line warnings are visible.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .event_format(ColorizedFormatter)
        .init();

    let args = Args::parse();
    let config = SplitConfig::from(&args);

    info!(
        "Warmup time: {} {}",
        args.warmup_time, args.time_unit
    );

    let splitter = Splitter::new(config)?;
    let outcome = splitter.run()?;

    info!(
        "Split complete: {} warmup lines, {} measurement lines, {} skipped",
        outcome.warmup_lines, outcome.measurement_lines, outcome.skipped_lines
    );
    Ok(())
}
