//! Summary statistics accumulation
//!
//! A [`StatAccumulator`] owns one interval histogram plus the scalar running
//! aggregates for a single (window, label) pair. Recording goes through a
//! short-lived interval histogram that [`StatAccumulator::summarize`] folds
//! into an ever-growing cumulative histogram, the same two-phase recorder
//! split the original tool used so that the hot write path and the cold
//! summarization path stay cheap. The whole composite update sits behind one
//! mutex, making `add_sample` safe under concurrent submission from multiple
//! producers.

use crate::histogram::Histogram;
use anyhow::Result;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Decimal scale applied to every derived statistic.
pub const ROUNDING_SCALE: u32 = 2;

/// Finalized summary record for one label within one window.
///
/// Field names serialize to the summary document keys of the original tool
/// (`errorPercentage`, `receivedKBytesRate`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    pub samples: u64,
    pub errors: u64,
    pub error_percentage: f64,
    /// Requests per second over the observed duration.
    pub throughput: f64,
    pub min: u64,
    pub max: u64,
    pub mean: f64,
    pub stddev: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
    pub p95: f64,
    pub p98: f64,
    pub p99: f64,
    pub p999: f64,
    #[serde(rename = "receivedKBytesRate")]
    pub received_kbytes_rate: f64,
    #[serde(rename = "sentKBytesRate")]
    pub sent_kbytes_rate: f64,
}

/// Thread-safe streaming statistics accumulator for one label.
pub struct StatAccumulator {
    inner: Mutex<AccumulatorState>,
}

struct AccumulatorState {
    /// Write-side interval recorder; swapped out and merged on summarize.
    recorder: Histogram,
    cumulative: Histogram,
    start_timestamp: i64,
    end_timestamp: i64,
    min_elapsed: u64,
    max_elapsed: u64,
    errors: u64,
    total_bytes: u64,
    total_sent_bytes: u64,
}

impl StatAccumulator {
    /// Create an accumulator whose histograms retain `precision` significant
    /// decimal digits.
    pub fn new(precision: u8) -> Result<Self> {
        Ok(Self {
            inner: Mutex::new(AccumulatorState {
                recorder: Histogram::new(precision)?,
                cumulative: Histogram::new(precision)?,
                start_timestamp: i64::MAX,
                end_timestamp: i64::MIN,
                min_elapsed: u64::MAX,
                max_elapsed: 0,
                errors: 0,
                total_bytes: 0,
                total_sent_bytes: 0,
            }),
        })
    }

    /// Record one sample. Reentrant; callers on different threads may hit
    /// the same accumulator with no ordering requirement.
    pub fn add_sample(&self, timestamp: i64, elapsed: u64, success: bool, bytes: u64, sent_bytes: u64) {
        let mut state = self.inner.lock();
        state.recorder.record(elapsed);
        if state.start_timestamp > timestamp {
            state.start_timestamp = timestamp;
        }
        let end_timestamp = timestamp + elapsed as i64;
        if state.end_timestamp < end_timestamp {
            state.end_timestamp = end_timestamp;
        }
        if state.min_elapsed > elapsed {
            state.min_elapsed = elapsed;
        }
        if state.max_elapsed < elapsed {
            state.max_elapsed = elapsed;
        }
        if !success {
            state.errors += 1;
        }
        state.total_bytes += bytes;
        state.total_sent_bytes += sent_bytes;
    }

    /// Fold the current recording interval into the cumulative histogram and
    /// derive the summary. Idempotent: calling twice without an intervening
    /// `add_sample` yields identical output, and `samples` never decreases
    /// across calls.
    pub fn summarize(&self) -> Result<SummaryStats> {
        let mut state = self.inner.lock();

        let precision = state.recorder.precision();
        let interval = std::mem::replace(&mut state.recorder, Histogram::new(precision)?);
        state.cumulative.merge(&interval)?;

        let samples = state.cumulative.count();
        if samples == 0 {
            return Ok(SummaryStats::empty());
        }

        let duration_secs = (state.end_timestamp - state.start_timestamp) as f64 / 1_000.0;
        let error_percentage = if state.errors > 0 {
            state.errors as f64 / samples as f64 * 100.0
        } else {
            0.0
        };
        // A degenerate run (single zero-elapsed sample) has no measurable
        // duration; report zero rates instead of dividing by zero.
        let (throughput, received_rate, sent_rate) = if duration_secs > 0.0 {
            (
                samples as f64 / duration_secs,
                state.total_bytes as f64 / 1_024.0 / duration_secs,
                state.total_sent_bytes as f64 / 1_024.0 / duration_secs,
            )
        } else {
            (0.0, 0.0, 0.0)
        };

        let histogram = &state.cumulative;
        Ok(SummaryStats {
            samples,
            errors: state.errors,
            error_percentage: round_half_even(error_percentage, ROUNDING_SCALE),
            throughput: round_half_even(throughput, ROUNDING_SCALE),
            min: state.min_elapsed,
            max: state.max_elapsed,
            mean: round_half_even(histogram.mean(), ROUNDING_SCALE),
            stddev: round_half_even(histogram.stddev(), ROUNDING_SCALE),
            p50: round_half_even(histogram.value_at_percentile(50.0) as f64, ROUNDING_SCALE),
            p75: round_half_even(histogram.value_at_percentile(75.0) as f64, ROUNDING_SCALE),
            p90: round_half_even(histogram.value_at_percentile(90.0) as f64, ROUNDING_SCALE),
            p95: round_half_even(histogram.value_at_percentile(95.0) as f64, ROUNDING_SCALE),
            p98: round_half_even(histogram.value_at_percentile(98.0) as f64, ROUNDING_SCALE),
            p99: round_half_even(histogram.value_at_percentile(99.0) as f64, ROUNDING_SCALE),
            p999: round_half_even(histogram.value_at_percentile(99.9) as f64, ROUNDING_SCALE),
            received_kbytes_rate: round_half_even(received_rate, ROUNDING_SCALE),
            sent_kbytes_rate: round_half_even(sent_rate, ROUNDING_SCALE),
        })
    }
}

impl SummaryStats {
    fn empty() -> Self {
        Self {
            samples: 0,
            errors: 0,
            error_percentage: 0.0,
            throughput: 0.0,
            min: 0,
            max: 0,
            mean: 0.0,
            stddev: 0.0,
            p50: 0.0,
            p75: 0.0,
            p90: 0.0,
            p95: 0.0,
            p98: 0.0,
            p99: 0.0,
            p999: 0.0,
            received_kbytes_rate: 0.0,
            sent_kbytes_rate: 0.0,
        }
    }
}

/// Round to `scale` decimal places with ties going to the even neighbour,
/// matching `BigDecimal.setScale(scale, RoundingMode.HALF_EVEN)`.
pub fn round_half_even(value: f64, scale: u32) -> f64 {
    let factor = 10f64.powi(scale as i32);
    let scaled = value * factor;
    let floor = scaled.floor();
    let fraction = scaled - floor;
    let rounded = if (fraction - 0.5).abs() < 1e-9 {
        if (floor as i64) % 2 == 0 {
            floor
        } else {
            floor + 1.0
        }
    } else if fraction > 0.5 {
        floor + 1.0
    } else {
        floor
    };
    rounded / factor
}
