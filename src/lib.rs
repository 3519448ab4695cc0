//! HdrCore records a stream of non-negative integer samples (typically latencies) into a
//! fixed-size array of counters, and answers statistical queries over them with a guaranteed
//! relative error. It follows the design of Gil Tene's
//! [HdrHistogram](https://hdrhistogram.github.io/HdrHistogram/).
//!
//! # How it works
//!
//! A histogram is configured with the range of values it must track and the number of
//! significant decimal digits it must preserve across that range. With 3 significant digits and
//! a range of 1 to 3,600,000,000, for example, no value is ever quantized by more than 0.1% of
//! itself: microsecond latencies keep single microsecond resolution up to one millisecond, and
//! one hour is still tracked to within a few seconds.
//!
//! Values are grouped into power-of-two *buckets*, each split linearly into *sub-buckets*. All
//! values that land in the same sub-bucket are *equivalent*, because the histogram can no longer
//! tell them apart. The counter array is sized once from the configuration and never grows.
//!
//! # Usage
//!
//! ## Recording samples
//!
//! ```
//! use hdrcore::Histogram;
//! let mut hist = Histogram::new_with_bounds(1, 60 * 60 * 1000, 2).unwrap();
//!
//! // samples are recorded using .record, which will error if the value is out of range
//! hist.record(54321).expect("value 54321 should be in range");
//!
//! // if the code that generates the values is subject to Coordinated Omission,
//! // the self-correcting record method should be used instead.
//! // for example, if the expected sampling interval is 10 msec:
//! hist.record_correct(54321, 10).expect("value 54321 should be in range");
//! ```
//!
//! Values above the highest trackable value are not recorded. This is a normal outcome under
//! real traffic, so it is reported as a cheap [`RecordError`] rather than a panic.
//!
//! ## Querying samples
//!
//! At any time, the histogram can be queried to return interesting statistical measurements,
//! such as the total number of recorded samples, or the value at a given percentile:
//!
//! ```
//! use hdrcore::Histogram;
//! let mut hist = Histogram::new_with_max(3_600_000_000, 3).unwrap();
//! hist.record(100).unwrap();
//!
//! println!("# of samples: {}", hist.len());
//! println!("99.9'th percentile: {}", hist.value_at_percentile(99.9));
//! assert!(hist.equivalent(100, hist.value_at_percentile(50.0)));
//! ```
//!
//! Several iterators are also provided for quickly getting an overview of the dataset. The
//! simplest one is `iter_recorded()`, which yields one item for every non-empty sample slot.
//!
//! ```
//! use hdrcore::Histogram;
//! let mut hist = Histogram::new_with_max(1_000_000, 3).unwrap();
//! hist.record_n(42, 3).unwrap();
//! for v in hist.iter_recorded() {
//!     println!("{}'th percentile of data is {} with {} samples",
//!         v.percentile(), v.value_iterated_to(), v.count_at_value());
//! }
//! ```
//!
//! # Limitations and Caveats
//!
//! A histogram has a single owner and no internal synchronization. To record from several
//! threads, give each thread its own histogram and merge them with [`Histogram::add`]. Histogram
//! serialization formats are not supported.

#![deny(missing_docs)]
#![warn(trivial_casts, unused_extern_crates, unused_import_braces, unused_results)]

use std::mem;
use tracing::{debug, trace};

pub mod config;
pub mod errors;
pub mod iterators;
mod print;

#[cfg(test)]
#[path = "tests/tests.rs"]
mod tests;

pub use crate::config::{Bounds, BucketConfig};
pub use crate::errors::{Error, InvalidArgument, RecordError};
pub use crate::iterators::{HistogramIterator, IterationValue};
pub use crate::print::Format;

/// A fixed-precision recorder of `u64` samples.
///
/// The layout resembles a floating point number: the bucket is the exponent and the sub-bucket
/// the mantissa. With 2048 sub-buckets and a lowest discernible value of 1:
///
/// <pre>
/// bucket 0 covers 0..=2047 in steps of 1, using all 2048 sub-buckets
/// bucket 1 covers 2048..=4095 in steps of 2, using the top 1024 sub-buckets
/// bucket 2 covers 4096..=8191 in steps of 4, using the top 1024 sub-buckets
/// ...
/// </pre>
///
/// The bottom half of every bucket past the first would duplicate, at a coarser step, the range
/// of the buckets below it, so only the top half is stored. The counter array therefore holds
/// `(buckets + 1) * sub_bucket_count / 2` slots.
#[derive(Debug, Clone)]
pub struct Histogram {
    config: BucketConfig,

    // Running aggregates. min_value is the lowest value of the smallest non-zero slot, and
    // u64::max_value() when empty.
    min_value: u64,
    max_value: u64,
    total_count: u64,

    // Shift applied to every counter access. Always 0 for histograms built here.
    normalizing_index_offset: isize,

    counts: Vec<u64>,
}

// accessors

impl Histogram {
    /// Get the current number of distinct values that can be represented in the histogram.
    pub fn distinct_values(&self) -> usize {
        self.counts.len()
    }

    /// Get the lowest discernible value for the histogram in its current configuration.
    pub fn low(&self) -> u64 {
        self.config.lowest_discernible_value
    }

    /// Get the highest trackable value for the histogram in its current configuration.
    pub fn high(&self) -> u64 {
        self.config.highest_trackable_value
    }

    /// Get the number of significant value digits kept by this histogram.
    pub fn sigfig(&self) -> u8 {
        self.config.significant_figures
    }

    /// Get the total number of samples recorded.
    pub fn len(&self) -> u64 {
        self.total_count
    }

    /// Returns true if this histogram has no recorded values.
    pub fn is_empty(&self) -> bool {
        self.total_count == 0
    }

    /// Get the number of buckets used by the histogram to cover the highest trackable value.
    ///
    /// This method differs from `.distinct_values()` in that it does not count the sub buckets
    /// within each bucket.
    pub fn buckets(&self) -> u8 {
        self.config.bucket_count
    }

    /// Get the number of sub-buckets in each bucket.
    pub fn sub_bucket_count(&self) -> u32 {
        self.config.sub_bucket_count
    }

    /// The configuration this histogram was built from.
    pub fn config(&self) -> &BucketConfig {
        &self.config
    }

    /// Number of bytes used by this histogram: the header plus the counter array.
    pub fn memory_size(&self) -> usize {
        mem::size_of::<Histogram>() + self.counts.len() * mem::size_of::<u64>()
    }

    /// Get the count of recorded values at the given counter index, or `None` if the index is
    /// past the end of the counter array.
    pub fn count_at_index(&self, index: usize) -> Option<u64> {
        if index < self.counts.len() {
            Some(self.counts[self.normalize_index(index)])
        } else {
            None
        }
    }

    fn last_index(&self) -> usize {
        self.counts.len() - 1
    }

    fn normalize_index(&self, index: usize) -> usize {
        if self.normalizing_index_offset == 0 {
            return index;
        }

        let len = self.counts.len() as isize;
        let normalized_index = index as isize - self.normalizing_index_offset;
        let adjustment = if normalized_index < 0 {
            len
        } else if normalized_index >= len {
            -len
        } else {
            0
        };
        (normalized_index + adjustment) as usize
    }
}

// construction

impl Histogram {
    /// Construct a `Histogram` given a known maximum value to be tracked, and a number of
    /// significant decimal digits. The histogram will be constructed to implicitly track
    /// (distinguish from 0) values as low as 1.
    ///
    /// `high` is the highest value to be tracked by the histogram, and must be a positive
    /// integer that is >= 2. `sigfig` specifies the number of significant figures to maintain.
    /// This is the number of significant decimal digits to which the histogram will maintain
    /// value resolution and separation. Must be in the range [1, 5].
    pub fn new_with_max(high: u64, sigfig: u8) -> Result<Histogram, Error> {
        Self::new_with_bounds(1, high, sigfig)
    }

    /// Construct a `Histogram` with known upper and lower bounds for recorded sample values.
    ///
    /// `low` is the lowest value that can be discerned (distinguished from 0) by the histogram,
    /// and must be a positive integer that is >= 1. It may be internally rounded down to nearest
    /// power of 2. Providing a lowest discernible value (`low`) is useful is situations where the
    /// units used for the histogram's values are much smaller that the minimal accuracy required.
    /// E.g. when tracking time values stated in nanosecond units, where the minimal accuracy
    /// required is a microsecond, the proper value for `low` would be 1000. If you're not sure,
    /// use 1.
    ///
    /// `high` is the highest value to be tracked by the histogram, and must be a
    /// positive integer that is `>= (2 * low)`.
    ///
    /// `sigfig` Specifies the number of significant figures to maintain. This is the number of
    /// significant decimal digits to which the histogram will maintain value resolution and
    /// separation. Must be in the range [1, 5].
    pub fn new_with_bounds(low: u64, high: u64, sigfig: u8) -> Result<Histogram, Error> {
        let config = BucketConfig::new(low, high, sigfig)?;
        Self::from_config(config)
    }

    /// Construct an empty `Histogram` shaped by a previously validated configuration.
    ///
    /// The counter array is allocated once, here. An allocation failure is reported as
    /// `Error::OutOfMemory` and leaves nothing behind.
    pub fn from_config(config: BucketConfig) -> Result<Histogram, Error> {
        let len = config.counts_len;
        let mut counts = Vec::new();
        counts
            .try_reserve_exact(len)
            .map_err(|_| Error::OutOfMemory { len })?;
        counts.resize(len, 0);

        debug!(
            lowest_discernible_value = config.lowest_discernible_value,
            highest_trackable_value = config.highest_trackable_value,
            significant_figures = config.significant_figures,
            counts_len = len,
            "Allocated histogram counters."
        );

        Ok(Histogram {
            config,
            min_value: u64::max_value(),
            max_value: 0,
            total_count: 0,
            normalizing_index_offset: 0,
            counts,
        })
    }

    /// Construct a `Histogram` with the same range settings as a given source histogram,
    /// but NOT its contents.
    pub fn new_from(source: &Histogram) -> Result<Histogram, Error> {
        Self::from_config(source.config)
    }

    /// Reset the contents and statistics of this histogram, preserving its configuration and
    /// without reallocating.
    pub fn reset(&mut self) {
        for c in self.counts.iter_mut() {
            *c = 0;
        }
        self.total_count = 0;
        self.min_value = u64::max_value();
        self.max_value = 0;

        trace!(counts_len = self.counts.len(), "Reset histogram.");
    }
}

// recording

impl Histogram {
    /// Record `value` in the histogram.
    ///
    /// Returns an error if `value` is above the highest trackable value. The histogram is left
    /// untouched in that case.
    pub fn record(&mut self, value: u64) -> Result<(), RecordError> {
        self.record_n(value, 1)
    }

    /// Record multiple samples for a value in the histogram, adding to the value's current count.
    ///
    /// `count` is the number of occurrences of this value to record.
    ///
    /// Returns an error if `value` is above the highest trackable value. The histogram is left
    /// untouched in that case.
    pub fn record_n(&mut self, value: u64, count: u64) -> Result<(), RecordError> {
        if value > self.config.highest_trackable_value {
            return Err(RecordError::ValueOutOfRange(value));
        }
        let index = self
            .index_for(value)
            .ok_or(RecordError::ValueOutOfRange(value))?;
        let index = self.normalize_index(index);

        self.counts[index] = self.counts[index].saturating_add(count);
        self.total_count = self.total_count.saturating_add(count);
        self.update_min_max(value);
        Ok(())
    }

    /// Record a value in the histogram while correcting for coordinated omission.
    ///
    /// See `record_n_correct` for further documentation.
    pub fn record_correct(&mut self, value: u64, interval: u64) -> Result<(), RecordError> {
        self.record_n_correct(value, 1, interval)
    }

    /// Record multiple values in the histogram while correcting for coordinated omission.
    ///
    /// To compensate for the loss of sampled values when a recorded value is larger than the
    /// expected interval between value samples, this will auto-generate an additional series of
    /// decreasingly-smaller (down to `interval`) value records, each with the same `count`.
    ///
    /// An `interval` of 0 disables the correction.
    ///
    /// Note: This is a at-recording correction method, as opposed to the post-recording
    /// correction method provided by `clone_correct`. The two methods are mutually exclusive,
    /// and only one of the two should be be used on a given data set to correct for the same
    /// coordinated omission issue.
    ///
    /// Returns an error if `value` is out of range. If a synthetic value fails to record, the
    /// backfill stops there and the error is returned; samples recorded before the failure are
    /// kept.
    pub fn record_n_correct(
        &mut self,
        value: u64,
        count: u64,
        interval: u64,
    ) -> Result<(), RecordError> {
        self.record_n(value, count)?;
        if interval == 0 || value <= interval {
            return Ok(());
        }

        let mut missing_value = value - interval;
        while missing_value >= interval {
            self.record_n(missing_value, count)?;
            missing_value -= interval;
        }

        Ok(())
    }

    fn update_min_max(&mut self, value: u64) {
        // zero is the implicit floor and is found through slot 0 instead. The slot's lowest
        // value is stored, which stays below the empty sentinel even for u64::max_value().
        if value != 0 && value <= self.min_value {
            let lowest = self.lowest_equivalent(value);
            if lowest < self.min_value {
                self.min_value = lowest;
            }
        }
        if value > self.max_value {
            self.max_value = value;
        }
    }
}

// merging

impl Histogram {
    /// Add the contents of another histogram to this one.
    ///
    /// Every recorded value of `source` is re-recorded here at the lowest value of its slot.
    /// Values that this histogram cannot represent are dropped, and the number of dropped samples
    /// is returned. Merging histograms of identical configuration never drops anything.
    pub fn add(&mut self, source: &Histogram) -> u64 {
        let mut dropped = 0_u64;
        for v in source.iter_recorded() {
            if self.record_n(v.value(), v.count_at_value()).is_err() {
                dropped = dropped.saturating_add(v.count_at_value());
            }
        }
        self.log_dropped(dropped, source);
        dropped
    }

    /// Add the contents of another histogram to this one, while correcting for coordinated
    /// omission.
    ///
    /// Every recorded value of `source` is re-recorded with `record_n_correct`. A value whose
    /// correction fails part way counts all of its samples as dropped, even though some of its
    /// backfill may have been recorded.
    pub fn add_correct(&mut self, source: &Histogram, interval: u64) -> u64 {
        let mut dropped = 0_u64;
        for v in source.iter_recorded() {
            if self
                .record_n_correct(v.value(), v.count_at_value(), interval)
                .is_err()
            {
                dropped = dropped.saturating_add(v.count_at_value());
            }
        }
        self.log_dropped(dropped, source);
        dropped
    }

    /// Get a copy of this histogram, corrected for coordinated omission.
    ///
    /// To compensate for the loss of sampled values when a recorded value is larger than the
    /// expected interval between value samples, the new histogram will include an auto-generated
    /// additional series of decreasingly-smaller (down to the `interval`) value records for each
    /// count found in the current histogram that is larger than the `interval`.
    ///
    /// Note: This is a post-correction method, as opposed to the at-recording correction method
    /// provided by `record_correct`. The two methods are mutually exclusive, and only one of the
    /// two should be be used on a given data set to correct for the same coordinated omission
    /// issue.
    pub fn clone_correct(&self, interval: u64) -> Result<Histogram, Error> {
        let mut h = Histogram::new_from(self)?;
        // same configuration, and every synthetic value is below the value it was derived from
        let dropped = h.add_correct(self, interval);
        debug_assert_eq!(0, dropped);
        Ok(h)
    }

    fn log_dropped(&self, dropped: u64, source: &Histogram) {
        if dropped > 0 {
            debug!(
                dropped,
                source_total = source.total_count,
                highest_trackable_value = self.config.highest_trackable_value,
                "Dropped out-of-range samples while merging histograms."
            );
        }
    }
}

impl PartialEq for Histogram {
    fn eq(&self, other: &Histogram) -> bool {
        if self.config.lowest_discernible_value != other.config.lowest_discernible_value
            || self.config.significant_figures != other.config.significant_figures
        {
            return false;
        }
        if self.total_count != other.total_count {
            return false;
        }
        if self.max() != other.max() {
            return false;
        }
        if self.min_nz() != other.min_nz() {
            return false;
        }
        self.counts.len() == other.counts.len()
            && (0..self.counts.len()).all(|i| self.count_at_index(i) == other.count_at_index(i))
    }
}

impl Eq for Histogram {}

// iterators

impl Histogram {
    /// Iterate through histogram values by percentile levels.
    ///
    /// The iteration mechanic for this iterator may appear somewhat confusing, but it yields
    /// fairly pleasing output. The iterator starts with a *percentile step size* of
    /// `100/ticks_per_half_distance`. It will then iterate until the percentile of the current
    /// value reaches the percentile level it is iterating to. Then it yields that value, and
    /// halves the distance remaining to 100% every `ticks_per_half_distance` steps. Once all
    /// recorded values are exhausted, one last step at the 100th percentile is yielded.
    ///
    /// # Panics
    ///
    /// This will panic if `ticks_per_half_distance` is 0.
    pub fn iter_percentiles(&self, ticks_per_half_distance: u32) -> HistogramIterator<'_> {
        iterators::percentile::Iter::new(self, ticks_per_half_distance)
    }

    /// Iterates through histogram values using linear value steps. The iteration is performed in
    /// steps of size `value_units_per_bucket`, terminating when all recorded histogram values are
    /// exhausted.
    ///
    /// # Panics
    ///
    /// This will panic if `value_units_per_bucket` is 0.
    pub fn iter_linear(&self, value_units_per_bucket: u64) -> HistogramIterator<'_> {
        iterators::linear::Iter::new(self, value_units_per_bucket)
    }

    /// Iterates through histogram values at logarithmically increasing levels. The iteration is
    /// performed in steps that start at `value_units_in_first_bucket` and increase exponentially
    /// according to `log_base`, terminating when all recorded histogram values are exhausted.
    ///
    /// # Panics
    ///
    /// This will panic if `value_units_in_first_bucket` is 0 or `log_base` is <= 1.0.
    pub fn iter_log(&self, value_units_in_first_bucket: u64, log_base: f64) -> HistogramIterator<'_> {
        iterators::log::Iter::new(self, value_units_in_first_bucket, log_base)
    }

    /// Iterates through all recorded histogram values using the finest granularity steps
    /// supported by the underlying representation. The iteration steps through all non-zero
    /// recorded value counts, and terminates when all recorded histogram values are exhausted.
    pub fn iter_recorded(&self) -> HistogramIterator<'_> {
        iterators::recorded::Iter::new(self)
    }

    /// Iterates through every slot of the counter array, including empty ones.
    pub fn iter_all(&self) -> HistogramIterator<'_> {
        iterators::all::Iter::new(self)
    }
}

// minor data statistics

impl Histogram {
    /// Get the lowest recorded value level in the histogram.
    ///
    /// Returns 0 if anything was recorded in the lowest slot, and `u64::max_value()` if the
    /// histogram is empty.
    pub fn min(&self) -> u64 {
        if self.count_at_index(0).unwrap_or(0) > 0 {
            0
        } else {
            self.min_nz()
        }
    }

    /// Get the highest recorded value level in the histogram. If the histogram has no recorded
    /// values, the value returned is 0.
    pub fn max(&self) -> u64 {
        if self.max_value == 0 {
            0
        } else {
            self.highest_equivalent(self.max_value)
        }
    }

    /// Get the lowest recorded non-zero value level in the histogram. If the histogram has no
    /// recorded values, the value returned is `u64::max_value()`.
    pub fn min_nz(&self) -> u64 {
        if self.min_value == u64::max_value() {
            u64::max_value()
        } else {
            self.lowest_equivalent(self.min_value)
        }
    }

    /// Determine if two values are equivalent with the histogram's resolution. Equivalent here
    /// means that value samples recorded for any two equivalent values are counted in a common
    /// total count.
    pub fn equivalent(&self, value1: u64, value2: u64) -> bool {
        self.lowest_equivalent(value1) == self.lowest_equivalent(value2)
    }

    /// Get the count of recorded values at a specific value (to within the histogram resolution
    /// at the value level).
    ///
    /// The count is computed across values recorded in the histogram that are within the value
    /// range that is `>= lowest_equivalent(value)` and `<= highest_equivalent(value)`. Values
    /// past the end of the counter array read the last slot.
    pub fn count_at(&self, value: u64) -> u64 {
        self.counts[self.normalize_index(self.index_for_or_last(value))]
    }

    /// Get the count of recorded values within a range of value levels (inclusive to within the
    /// histogram's resolution).
    ///
    /// `low` gives the lower value bound on the range for which to provide the recorded count.
    /// Will be rounded down with `lowest_equivalent`. Similarly, `high` gives the higher value
    /// bound on the range, and will be rounded up with `highest_equivalent`.
    pub fn count_between(&self, low: u64, high: u64) -> u64 {
        let low_index = self.index_for_or_last(low);
        let high_index = self.index_for_or_last(high);
        (low_index..=high_index)
            .map(|i| self.counts[self.normalize_index(i)])
            .fold(0_u64, |t, c| t.saturating_add(c))
    }
}

// major data statistics

impl Histogram {
    /// Get the computed mean value of all recorded values in the histogram.
    ///
    /// Each slot contributes its median equivalent value, weighted by its count. Returns 0.0 for
    /// an empty histogram.
    pub fn mean(&self) -> f64 {
        if self.total_count == 0 {
            return 0.0;
        }

        // the recorded iterator stops once it has seen total_count samples
        let total = self.iter_recorded().fold(0.0_f64, |total, v| {
            total + v.median_equivalent() as f64 * v.count_at_value() as f64
        });
        total / self.total_count as f64
    }

    /// Get the computed standard deviation of all recorded values in the histogram
    pub fn stdev(&self) -> f64 {
        if self.total_count == 0 {
            return 0.0;
        }

        let mean = self.mean();
        let geom_dev_tot = self.iter_recorded().fold(0.0_f64, |gdt, v| {
            let dev = v.median_equivalent() as f64 - mean;
            gdt + (dev * dev) * v.count_at_value() as f64
        });

        (geom_dev_tot / self.total_count as f64).sqrt()
    }

    /// Get the value at a given percentile.
    ///
    /// When the given percentile is > 0.0, the value returned is the value that the given
    /// percentage of the overall recorded value entries in the histogram are either smaller than
    /// or equivalent to. When the given percentile is 0.0, the value returned is the value that
    /// all value entries in the histogram are either larger than or equivalent to.
    ///
    /// Two values are considered "equivalent" if `self.equivalent` would return true.
    ///
    /// Percentiles above 100 are treated as 100. Returns 0 for an empty histogram.
    pub fn value_at_percentile(&self, percentile: f64) -> u64 {
        let count_at_percentile = self.count_at_percentile(percentile);

        let mut total_to_current_index = 0_u64;
        for i in 0..self.counts.len() {
            total_to_current_index =
                total_to_current_index.saturating_add(self.counts[self.normalize_index(i)]);
            if total_to_current_index >= count_at_percentile {
                let value_at_index = self.value_for(i);
                return if percentile == 0.0 {
                    self.lowest_equivalent(value_at_index)
                } else {
                    self.highest_equivalent(value_at_index)
                };
            }
        }

        0
    }

    /// Get the values at several percentiles in one sweep over the counters.
    ///
    /// `percentiles` must be sorted in ascending order and `values` must be exactly as long.
    /// Each entry of `values` receives what `value_at_percentile` would return for the
    /// corresponding percentile. `values` doubles as scratch space during the sweep, so no other
    /// storage is allocated.
    pub fn values_at_percentiles(
        &self,
        percentiles: &[f64],
        values: &mut [u64],
    ) -> Result<(), Error> {
        if percentiles.len() != values.len() {
            return Err(InvalidArgument::PercentileBufferLengthMismatch.into());
        }
        if percentiles.windows(2).any(|w| !(w[0] <= w[1])) {
            return Err(InvalidArgument::PercentilesNotSorted.into());
        }

        // values holds the target cumulative count of each percentile until it is resolved
        for (target, &percentile) in values.iter_mut().zip(percentiles) {
            *target = self.count_at_percentile(percentile);
        }

        let mut at_pos = 0;
        for v in self.iter_recorded() {
            while at_pos < values.len() && v.cumulative_count() >= values[at_pos] {
                values[at_pos] = if percentiles[at_pos] == 0.0 {
                    v.lowest_equivalent()
                } else {
                    v.highest_equivalent()
                };
                at_pos += 1;
            }
            if at_pos == values.len() {
                break;
            }
        }

        // only reachable for an empty histogram
        for unresolved in values[at_pos..].iter_mut() {
            *unresolved = 0;
        }

        Ok(())
    }

    /// Get the percentile of samples at and below a given value.
    ///
    /// This is simply the number of samples at or below `value`, divided by the total number of
    /// samples, times 100. Returns 100.0 for an empty histogram.
    pub fn percentile_below(&self, value: u64) -> f64 {
        if self.total_count == 0 {
            return 100.0;
        }

        let total_to_current_index = self.count_between(0, value);
        100.0 * total_to_current_index as f64 / self.total_count as f64
    }

    fn count_at_percentile(&self, percentile: f64) -> u64 {
        // Truncate down to 100%
        let percentile = percentile.min(100.0);
        // round to nearest; negative percentiles saturate to 0 in the cast
        let count_at_percentile = ((percentile / 100.0) * self.total_count as f64 + 0.5) as u64;
        // Make sure we at least reach the first recorded entry
        count_at_percentile.max(1)
    }
}

// value equivalence

impl Histogram {
    /// Get the lowest value that is equivalent to the given value within the histogram's
    /// resolution. Equivalent here means that value samples recorded for any two equivalent
    /// values are counted in a common total count.
    pub fn lowest_equivalent(&self, value: u64) -> u64 {
        let bucket_index = self.bucket_for(value);
        let sub_bucket_index = self.sub_bucket_for(value, bucket_index);
        self.value_from_loc(bucket_index, sub_bucket_index)
    }

    /// Get the highest value that is equivalent to the given value within the histogram's
    /// resolution. Equivalent here means that value samples recorded for any two equivalent
    /// values are counted in a common total count.
    pub fn highest_equivalent(&self, value: u64) -> u64 {
        // the top of a slot never exceeds u64::max_value(), so this cannot overflow
        self.lowest_equivalent(value) + (self.equivalent_range(value) - 1)
    }

    /// Get a value that lies in the middle (rounded up) of the range of values equivalent the
    /// given value. Equivalent here means that value samples recorded for any two equivalent
    /// values are counted in a common total count.
    pub fn median_equivalent(&self, value: u64) -> u64 {
        self.lowest_equivalent(value) + (self.equivalent_range(value) >> 1)
    }

    /// Get the next value that is *not* equivalent to the given value within the histogram's
    /// resolution. Equivalent means that value samples recorded for any two equivalent values
    /// are counted in a common total count.
    ///
    /// Saturates at `u64::max_value()` for values in the topmost slot of the `u64` range.
    pub fn next_non_equivalent(&self, value: u64) -> u64 {
        self.lowest_equivalent(value).saturating_add(self.equivalent_range(value))
    }

    /// Get the size (in value units) of the range of values that are equivalent to the given
    /// value within the histogram's resolution. Equivalent here means that value samples recorded
    /// for any two equivalent values are counted in a common total count.
    pub fn equivalent_range(&self, value: u64) -> u64 {
        let bucket_index = self.bucket_for(value);
        let sub_bucket_index = self.sub_bucket_for(value, bucket_index);
        self.equivalent_range_at(bucket_index, sub_bucket_index)
    }

    /// Get the lowest value that maps to the given counter index.
    ///
    /// `index` should be at most `distinct_values()`; the value one past the last slot is where
    /// the next slot would begin.
    pub fn value_for(&self, index: usize) -> u64 {
        // Dividing by sub bucket half count will yield 1 in top half of first bucket, 2 in 2nd
        // bucket, etc, so subtract 1 to get 0-indexed bucket. This produces -1 for the bottom half
        // of the first bucket.
        let mut bucket_index =
            (index >> self.config.sub_bucket_half_count_magnitude) as isize - 1;

        // Calculate the remainder of dividing by sub_bucket_half_count, shifted into the top half
        // of the corresponding bucket. This will (temporarily) map indexes in the lower half of
        // first bucket into the top half.
        let mut sub_bucket_index = (index as u32 & (self.config.sub_bucket_half_count - 1))
            + self.config.sub_bucket_half_count;

        // Use the bottom half of bucket 0 for the first half of the indices.
        if bucket_index < 0 {
            sub_bucket_index -= self.config.sub_bucket_half_count;
            bucket_index = 0;
        }

        self.value_from_loc(bucket_index as u8, sub_bucket_index)
    }
}

// index mapping

impl Histogram {
    /// Compute the counter index for the given value, or `None` if the value maps past the end
    /// of the counter array.
    fn index_for(&self, value: u64) -> Option<usize> {
        let bucket_index = self.bucket_for(value);
        let sub_bucket_index = self.sub_bucket_for(value, bucket_index);

        debug_assert!(sub_bucket_index < self.config.sub_bucket_count);
        debug_assert!(
            bucket_index == 0 || (sub_bucket_index >= self.config.sub_bucket_half_count)
        );

        // Calculate the index for the first entry that will be used in the bucket (halfway through
        // sub_bucket_count). For bucket_index 0, all sub_bucket_count entries may be used, but
        // bucket_base_index is still set in the middle.
        let bucket_base_index =
            (usize::from(bucket_index) + 1) << self.config.sub_bucket_half_count_magnitude;

        // Calculate the offset in the bucket. This subtraction will result in a positive value in
        // all buckets except the 0th bucket (since a value in that bucket may be less than half
        // the bucket's 0 to sub_bucket_count range). However, this works out since we give bucket
        // 0 twice as much space.
        let offset_in_bucket =
            sub_bucket_index as isize - self.config.sub_bucket_half_count as isize;

        let index = bucket_base_index as isize + offset_in_bucket;
        if index < 0 || index as usize >= self.counts.len() {
            None
        } else {
            Some(index as usize)
        }
    }

    /// Like `index_for`, but values past the end of the counter array map to the last index.
    fn index_for_or_last(&self, value: u64) -> usize {
        self.index_for(value).unwrap_or_else(|| self.last_index())
    }

    /// Compute the lowest (and therefore highest precision) bucket index whose sub-buckets can
    /// represent the value.
    #[inline]
    fn bucket_for(&self, value: u64) -> u8 {
        // Calculates the number of powers of two by which the value is greater than the biggest
        // value that fits in bucket 0. This is the bucket index since each successive bucket can
        // hold a value 2x greater. The mask maps small values to bucket 0.
        let pow2ceiling = 64 - (value | self.config.sub_bucket_mask).leading_zeros();
        (pow2ceiling
            - u32::from(self.config.unit_magnitude)
            - (u32::from(self.config.sub_bucket_half_count_magnitude) + 1)) as u8
    }

    /// Compute the position inside a bucket at which the given value should be recorded,
    /// indexed from position 0 in the bucket (in the first half, which is not used past the
    /// first bucket).
    #[inline]
    fn sub_bucket_for(&self, value: u64, bucket_index: u8) -> u32 {
        // For bucket_index 0, this is just value, so it may be anywhere in 0 to
        // sub_bucket_count. For other bucket_index, this will always end up in the top half of
        // sub_bucket_count: assume that for some bucket k > 0, this calculation will yield a
        // value in the bottom half of 0 to sub_bucket_count. Then, because of how buckets
        // overlap, it would have also been in the top half of bucket k-1, and therefore would
        // have returned k-1 in bucket_for().
        (value >> (u32::from(bucket_index) + u32::from(self.config.unit_magnitude))) as u32
    }

    #[inline]
    fn value_from_loc(&self, bucket_index: u8, sub_bucket_index: u32) -> u64 {
        u64::from(sub_bucket_index)
            << (u32::from(bucket_index) + u32::from(self.config.unit_magnitude))
    }

    #[inline]
    fn equivalent_range_at(&self, bucket_index: u8, sub_bucket_index: u32) -> u64 {
        let adjusted_bucket = if sub_bucket_index >= self.config.sub_bucket_count {
            u32::from(bucket_index) + 1
        } else {
            u32::from(bucket_index)
        };
        1_u64 << (u32::from(self.config.unit_magnitude) + adjusted_bucket)
    }
}
