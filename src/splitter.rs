//! Streaming JTL split driver
//!
//! Reads the input file line by line, copies the header to both output
//! partitions, routes every data line to the warmup or measurement partition
//! and, when summaries are enabled, feeds each parsed sample to the per-label
//! accumulator registry of its window. The whole run is a single pass with
//! fixed memory; no line is ever buffered beyond the current one.
//!
//! Failure discipline: lines with a bad column count are logged and skipped,
//! corrupt numeric content aborts the run, and partially written output files
//! from a failed run are left in place for diagnosis.

use crate::cli::SplitConfig;
use crate::record::RecordParser;
use crate::registry::AccumulatorRegistry;
use crate::window::{Window, WindowClassifier};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// Interval between progress log lines, in input lines.
const PROGRESS_INTERVAL: u64 = 10_000;

/// What a completed split produced.
#[derive(Debug)]
pub struct SplitOutcome {
    pub warmup_lines: u64,
    pub measurement_lines: u64,
    /// Malformed lines that were warned about and dropped.
    pub skipped_lines: u64,
    pub warmup_file: PathBuf,
    pub measurement_file: PathBuf,
    pub warmup_summary_file: Option<PathBuf>,
    pub measurement_summary_file: Option<PathBuf>,
}

/// Single-pass splitter for one JTL file.
pub struct Splitter {
    config: SplitConfig,
    parser: RecordParser,
}

impl Splitter {
    /// Create a splitter after validating the configuration. Configuration
    /// errors surface here, before the input stream is touched.
    pub fn new(config: SplitConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            parser: RecordParser::default(),
        })
    }

    /// Run the split and return what was written where.
    pub fn run(&self) -> Result<SplitOutcome> {
        let started = Instant::now();

        let warmup_path = partition_path(&self.config.jtl_file, Window::Warmup);
        let measurement_path = partition_path(&self.config.jtl_file, Window::Measurement);
        info!(
            "Splitting {} into {} and {}",
            self.config.jtl_file.display(),
            warmup_path.display(),
            measurement_path.display()
        );
        info!("Warmup time: {} ms", self.config.warmup_millis);

        let input = File::open(&self.config.jtl_file)
            .with_context(|| format!("cannot open {}", self.config.jtl_file.display()))?;
        let mut reader = BufReader::new(input);

        let mut warmup_writer = partition_writer(&warmup_path)?;
        let mut measurement_writer = partition_writer(&measurement_path)?;

        let registries = if self.config.summarize {
            Some((
                AccumulatorRegistry::new(self.config.precision)?,
                AccumulatorRegistry::new(self.config.precision)?,
            ))
        } else {
            None
        };

        let mut outcome = SplitOutcome {
            warmup_lines: 0,
            measurement_lines: 0,
            skipped_lines: 0,
            warmup_file: warmup_path,
            measurement_file: measurement_path,
            warmup_summary_file: None,
            measurement_summary_file: None,
        };

        // The first line is an opaque header, copied to both partitions and
        // never parsed as data.
        let mut line = String::new();
        if read_line(&mut reader, &mut line)? {
            writeln!(warmup_writer, "{}", line)?;
            writeln!(measurement_writer, "{}", line)?;
        }

        let mut classifier = WindowClassifier::new(self.config.warmup_millis);
        let mut line_number: u64 = 1;

        while read_line(&mut reader, &mut line)? {
            line_number += 1;
            if line_number % PROGRESS_INTERVAL == 0 {
                info!("Processed {} lines", line_number);
            }

            let sample = match self.parser.parse(&line, line_number) {
                Ok(sample) => sample,
                Err(err) if err.is_recoverable() => {
                    warn!("{}", err);
                    outcome.skipped_lines += 1;
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            let window = classifier.classify(sample.timestamp);
            match window {
                Window::Warmup => {
                    writeln!(warmup_writer, "{}", line)?;
                    outcome.warmup_lines += 1;
                }
                Window::Measurement => {
                    writeln!(measurement_writer, "{}", line)?;
                    outcome.measurement_lines += 1;
                }
            }

            if let Some((warmup_registry, measurement_registry)) = &registries {
                let registry = match window {
                    Window::Warmup => warmup_registry,
                    Window::Measurement => measurement_registry,
                };
                registry.resolve(sample.label)?.add_sample(
                    sample.timestamp,
                    sample.elapsed,
                    sample.success,
                    sample.bytes,
                    sample.sent_bytes,
                );
            }
        }

        warmup_writer.flush()?;
        measurement_writer.flush()?;

        if let Some((warmup_registry, measurement_registry)) = &registries {
            let warmup_summary = summary_path(&self.config.jtl_file, Window::Warmup);
            let measurement_summary = summary_path(&self.config.jtl_file, Window::Measurement);
            write_summary(&warmup_summary, warmup_registry)?;
            write_summary(&measurement_summary, measurement_registry)?;
            outcome.warmup_summary_file = Some(warmup_summary);
            outcome.measurement_summary_file = Some(measurement_summary);
        }

        // Remove the input only once everything else has succeeded.
        if self.config.delete_jtl_file_on_exit {
            std::fs::remove_file(&self.config.jtl_file)
                .with_context(|| format!("cannot delete {}", self.config.jtl_file.display()))?;
        }

        let elapsed = started.elapsed();
        info!(
            "Done in {} min, {} sec",
            elapsed.as_secs() / 60,
            elapsed.as_secs() % 60
        );
        Ok(outcome)
    }
}

/// Read one line without its trailing newline; false on end of stream.
fn read_line(reader: &mut impl BufRead, line: &mut String) -> Result<bool> {
    line.clear();
    let bytes = reader.read_line(line).context("cannot read input")?;
    if bytes == 0 {
        return Ok(false);
    }
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    Ok(true)
}

fn partition_writer(path: &Path) -> Result<BufWriter<File>> {
    let file =
        File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// `results.jtl` becomes `results-warmup.jtl` / `results-measurement.jtl`
/// next to the input file.
pub fn partition_path(jtl_file: &Path, window: Window) -> PathBuf {
    sibling(jtl_file, &format!("{}.jtl", window.suffix()))
}

/// `results.jtl` becomes `results-warmup-summary.json` and the measurement
/// counterpart.
pub fn summary_path(jtl_file: &Path, window: Window) -> PathBuf {
    sibling(jtl_file, &format!("{}-summary.json", window.suffix()))
}

fn sibling(jtl_file: &Path, suffix: &str) -> PathBuf {
    let stem = jtl_file
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("results");
    jtl_file.with_file_name(format!("{}-{}", stem, suffix))
}

/// Serialize one window's per-label summaries, keys in first-seen order.
fn write_summary(path: &Path, registry: &AccumulatorRegistry) -> Result<()> {
    let mut document = serde_json::Map::new();
    for (label, stats) in registry.snapshot_all()? {
        document.insert(label, serde_json::to_value(stats)?);
    }
    let json = serde_json::to_string_pretty(&serde_json::Value::Object(document))?;
    std::fs::write(path, json).with_context(|| format!("cannot write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_names_derive_from_input_stem() {
        let input = Path::new("/data/run-42/results.jtl");
        assert_eq!(
            partition_path(input, Window::Warmup),
            Path::new("/data/run-42/results-warmup.jtl")
        );
        assert_eq!(
            partition_path(input, Window::Measurement),
            Path::new("/data/run-42/results-measurement.jtl")
        );
        assert_eq!(
            summary_path(input, Window::Warmup),
            Path::new("/data/run-42/results-warmup-summary.json")
        );
    }

    #[test]
    fn read_line_strips_line_endings() {
        let mut reader = BufReader::new("a,b\r\nc,d\n".as_bytes());
        let mut line = String::new();
        assert!(read_line(&mut reader, &mut line).unwrap());
        assert_eq!(line, "a,b");
        assert!(read_line(&mut reader, &mut line).unwrap());
        assert_eq!(line, "c,d");
        assert!(!read_line(&mut reader, &mut line).unwrap());
    }
}
