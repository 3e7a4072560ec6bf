use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// JTL Splitter - split JMeter results into warmup and measurement partitions
#[derive(Parser, Debug)]
#[clap(version, about, long_about = None)]
pub struct Args {
    /// Warmup time, in the unit given by --time-unit
    #[clap(short = 't', long, help_heading = "Core Options")]
    pub warmup_time: u64,

    /// Unit of the warmup time
    #[clap(short = 'u', long, value_enum, default_value_t = TimeUnit::Minutes)]
    pub time_unit: TimeUnit,

    /// JTL file to split
    #[clap(short = 'f', long = "jtlfile")]
    pub jtl_file: PathBuf,

    /// Delete the input JTL file after a successful split
    #[clap(short = 'd', long, default_value_t = false)]
    pub delete_jtl_file_on_exit: bool,

    /// Write per-label summary statistics for each partition
    #[clap(short = 's', long, default_value_t = false)]
    pub summarize: bool,

    /// Significant decimal digits retained by the latency histogram (1-5)
    #[clap(short = 'p', long, default_value_t = crate::defaults::PRECISION)]
    pub precision: u8,
}

/// Units accepted for the warmup duration
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
pub enum TimeUnit {
    #[clap(name = "seconds")]
    Seconds,
    #[clap(name = "minutes")]
    Minutes,
    #[clap(name = "hours")]
    Hours,
}

impl TimeUnit {
    /// Convert a duration expressed in this unit to milliseconds.
    pub fn to_millis(&self, amount: u64) -> i64 {
        let amount = amount as i64;
        match self {
            TimeUnit::Seconds => amount * 1_000,
            TimeUnit::Minutes => amount * 60 * 1_000,
            TimeUnit::Hours => amount * 60 * 60 * 1_000,
        }
    }
}

impl std::fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeUnit::Seconds => write!(f, "seconds"),
            TimeUnit::Minutes => write!(f, "minutes"),
            TimeUnit::Hours => write!(f, "hours"),
        }
    }
}

/// Configuration for one split run, derived from CLI arguments and validated
/// before any processing begins.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SplitConfig {
    pub jtl_file: PathBuf,
    /// Warmup window length relative to the first observed timestamp.
    pub warmup_millis: i64,
    pub summarize: bool,
    pub delete_jtl_file_on_exit: bool,
    pub precision: u8,
}

impl From<&Args> for SplitConfig {
    fn from(args: &Args) -> Self {
        Self {
            jtl_file: args.jtl_file.clone(),
            warmup_millis: args.time_unit.to_millis(args.warmup_time),
            summarize: args.summarize,
            delete_jtl_file_on_exit: args.delete_jtl_file_on_exit,
            precision: args.precision,
        }
    }
}

impl SplitConfig {
    /// Reject bad configuration before the input stream is touched.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.warmup_millis <= 0 {
            anyhow::bail!("Warmup time should be positive");
        }
        if !(1..=5).contains(&self.precision) {
            anyhow::bail!(
                "Histogram precision {} is out of range (expected 1 to 5)",
                self.precision
            );
        }
        if !self.jtl_file.is_file() {
            anyhow::bail!("{} is not a valid JTL file", self.jtl_file.display());
        }
        let extension = self.jtl_file.extension().and_then(|ext| ext.to_str());
        if extension != Some("jtl") {
            anyhow::bail!("{} should have a .jtl extension", self.jtl_file.display());
        }
        Ok(())
    }
}
