//! Bounded-relative-error latency histogram
//!
//! A from-scratch log-linear histogram in the style of HdrHistogram. Values
//! are recorded into buckets whose width doubles with each magnitude band
//! while staying linear within a band, so a percentile query is accurate to
//! within `10^-precision` of the recorded value regardless of how many
//! samples have been seen. Memory is fixed at construction time and both
//! `record` and `value_at_percentile` run without allocating.

use anyhow::{bail, Result};

/// Largest trackable elapsed time in milliseconds (one hour). Values above
/// this are clamped on record so the hot path never fails.
pub const MAX_TRACKABLE_VALUE: u64 = 3_600_000;

/// Log-linear histogram of non-negative integer values.
///
/// `precision` is the number of significant decimal digits retained: each
/// magnitude band is split into at least `2 * 10^precision` linear
/// sub-buckets, bounding the relative error of any recorded value by
/// `10^-precision`.
#[derive(Debug, Clone)]
pub struct Histogram {
    precision: u8,
    /// Number of linear sub-buckets per magnitude band (a power of two).
    sub_bucket_count: usize,
    sub_bucket_half_count: usize,
    sub_bucket_count_magnitude: u32,
    sub_bucket_half_count_magnitude: u32,
    sub_bucket_mask: u64,
    counts: Vec<u64>,
    total_count: u64,
}

impl Histogram {
    /// Create a histogram with the given number of significant decimal
    /// digits (1..=5), covering `0..=MAX_TRACKABLE_VALUE`.
    pub fn new(precision: u8) -> Result<Self> {
        if !(1..=5).contains(&precision) {
            bail!(
                "histogram precision {} is out of range (expected 1 to 5)",
                precision
            );
        }

        let largest_single_unit_resolution = 2 * 10u64.pow(precision as u32);
        let sub_bucket_count = (largest_single_unit_resolution as usize).next_power_of_two();
        let sub_bucket_half_count = sub_bucket_count / 2;
        let sub_bucket_count_magnitude = sub_bucket_count.trailing_zeros();
        let sub_bucket_half_count_magnitude = sub_bucket_count_magnitude - 1;
        let sub_bucket_mask = (sub_bucket_count - 1) as u64;

        // Each additional bucket doubles the range covered; count how many
        // are needed to reach the maximum trackable value.
        let mut bucket_count = 1usize;
        let mut covered = sub_bucket_count as u64;
        while covered < MAX_TRACKABLE_VALUE {
            covered <<= 1;
            bucket_count += 1;
        }

        // Bucket 0 uses all sub-buckets; every later bucket reuses only the
        // upper half, so the counts array is (buckets + 1) half-counts long.
        let counts_len = (bucket_count + 1) * sub_bucket_half_count;

        Ok(Self {
            precision,
            sub_bucket_count,
            sub_bucket_half_count,
            sub_bucket_count_magnitude,
            sub_bucket_half_count_magnitude,
            sub_bucket_mask,
            counts: vec![0; counts_len],
            total_count: 0,
        })
    }

    /// Significant decimal digits this histogram retains.
    pub fn precision(&self) -> u8 {
        self.precision
    }

    /// Number of values recorded so far.
    pub fn count(&self) -> u64 {
        self.total_count
    }

    pub fn is_empty(&self) -> bool {
        self.total_count == 0
    }

    /// Record a single value in O(1) time. Values above the trackable
    /// maximum are clamped rather than rejected.
    #[inline]
    pub fn record(&mut self, value: u64) {
        let value = value.min(MAX_TRACKABLE_VALUE);
        let index = self.counts_index(value);
        self.counts[index] += 1;
        self.total_count += 1;
    }

    /// Fold another histogram's counts into this one bucket-by-bucket. Both
    /// histograms must have been created with the same precision.
    pub fn merge(&mut self, other: &Histogram) -> Result<()> {
        if self.precision != other.precision {
            bail!(
                "cannot merge histograms with different precisions ({} vs {})",
                self.precision,
                other.precision
            );
        }
        for (dst, src) in self.counts.iter_mut().zip(other.counts.iter()) {
            *dst += *src;
        }
        self.total_count += other.total_count;
        Ok(())
    }

    /// Mean of all recorded values, computed from bucket midpoints.
    pub fn mean(&self) -> f64 {
        if self.total_count == 0 {
            return 0.0;
        }
        let mut sum = 0.0;
        for (index, &count) in self.counts.iter().enumerate() {
            if count > 0 {
                sum += self.median_equivalent(self.value_at_index(index)) as f64 * count as f64;
            }
        }
        sum / self.total_count as f64
    }

    /// Population standard deviation of all recorded values.
    pub fn stddev(&self) -> f64 {
        if self.total_count == 0 {
            return 0.0;
        }
        let mean = self.mean();
        let mut geometric_deviation_total = 0.0;
        for (index, &count) in self.counts.iter().enumerate() {
            if count > 0 {
                let deviation = self.median_equivalent(self.value_at_index(index)) as f64 - mean;
                geometric_deviation_total += deviation * deviation * count as f64;
            }
        }
        (geometric_deviation_total / self.total_count as f64).sqrt()
    }

    /// Value at or below which `percentile` percent of recorded values fall,
    /// using nearest-rank selection within the owning bucket.
    pub fn value_at_percentile(&self, percentile: f64) -> u64 {
        if self.total_count == 0 {
            return 0;
        }
        let requested = percentile.clamp(0.0, 100.0);
        let mut count_at_percentile =
            ((requested / 100.0) * self.total_count as f64).ceil() as u64;
        if count_at_percentile < 1 {
            count_at_percentile = 1;
        }

        let mut cumulative = 0u64;
        for (index, &count) in self.counts.iter().enumerate() {
            cumulative += count;
            if cumulative >= count_at_percentile {
                return self.highest_equivalent(self.value_at_index(index));
            }
        }
        0
    }

    /// Index into the counts array for a value.
    #[inline]
    fn counts_index(&self, value: u64) -> usize {
        let bucket_index = self.bucket_index(value);
        let sub_bucket_index = (value >> bucket_index) as usize;
        // Bucket 0 spans the full sub-bucket range; later buckets only use
        // the upper half, the lower half aliases the previous bucket.
        let bucket_base = (bucket_index as usize + 1) << self.sub_bucket_half_count_magnitude;
        bucket_base + sub_bucket_index - self.sub_bucket_half_count
    }

    #[inline]
    fn bucket_index(&self, value: u64) -> u32 {
        64 - (value | self.sub_bucket_mask).leading_zeros() - self.sub_bucket_count_magnitude
    }

    /// Lowest value mapping to the given counts index.
    fn value_at_index(&self, index: usize) -> u64 {
        let mut bucket_index = (index >> self.sub_bucket_half_count_magnitude) as i32 - 1;
        let mut sub_bucket_index =
            (index & (self.sub_bucket_half_count - 1)) + self.sub_bucket_half_count;
        if bucket_index < 0 {
            sub_bucket_index -= self.sub_bucket_half_count;
            bucket_index = 0;
        }
        (sub_bucket_index as u64) << bucket_index
    }

    /// Width of the value range that collapses into the same bucket as
    /// `value`.
    fn equivalent_range(&self, value: u64) -> u64 {
        1u64 << self.bucket_index(value)
    }

    fn lowest_equivalent(&self, value: u64) -> u64 {
        let bucket_index = self.bucket_index(value);
        (value >> bucket_index) << bucket_index
    }

    fn highest_equivalent(&self, value: u64) -> u64 {
        self.lowest_equivalent(value) + self.equivalent_range(value) - 1
    }

    fn median_equivalent(&self, value: u64) -> u64 {
        self.lowest_equivalent(value) + (self.equivalent_range(value) >> 1)
    }
}
