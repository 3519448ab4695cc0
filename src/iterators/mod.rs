//! Iterators over the counters of a [`Histogram`].
//!
//! Every iteration mode walks the counter array through the same [`Cursor`] and differs only in
//! which positions it reports. The modes are:
//!
//!  - all: every slot, including empty ones
//!  - recorded: every non-empty slot
//!  - percentile: steps of decreasing size as the 100th percentile is approached
//!  - linear: fixed-width value windows
//!  - log: value windows that grow by a constant factor
//!
//! An iterator takes a snapshot of the histogram's total count when it is created, and stops
//! once it has accounted for that many samples.

use crate::Histogram;
use std::iter::FusedIterator;

pub(crate) mod all;
pub(crate) mod linear;
pub(crate) mod log;
pub(crate) mod percentile;
pub(crate) mod recorded;

/// A walk over the counter array of a histogram. Modes move it forward and decide when its
/// current position is worth reporting.
#[derive(Debug, Clone)]
pub(crate) struct Cursor<'a> {
    hist: &'a Histogram,

    // None before the first step, and clamped to the array length once it runs off the end
    index: Option<usize>,
    total_count: u64,

    count: u64,
    cumulative_count: u64,

    value: u64,
    lowest_equivalent: u64,
    highest_equivalent: u64,
    median_equivalent: u64,

    value_iterated_from: u64,
    value_iterated_to: u64,
}

impl<'a> Cursor<'a> {
    fn new(hist: &'a Histogram) -> Cursor<'a> {
        Cursor {
            hist,
            index: None,
            total_count: hist.total_count,
            count: 0,
            cumulative_count: 0,
            value: 0,
            lowest_equivalent: 0,
            highest_equivalent: 0,
            median_equivalent: 0,
            value_iterated_from: 0,
            value_iterated_to: 0,
        }
    }

    pub(crate) fn hist(&self) -> &'a Histogram {
        self.hist
    }

    /// Have any steps been taken yet?
    pub(crate) fn started(&self) -> bool {
        self.index.is_some()
    }

    /// Has the cursor moved past the last slot?
    pub(crate) fn exhausted(&self) -> bool {
        self.index.map_or(false, |i| i >= self.hist.counts.len())
    }

    /// Are there samples left that the cursor has not yet accounted for?
    pub(crate) fn has_next(&self) -> bool {
        self.cumulative_count < self.total_count
    }

    fn next_index(&self) -> usize {
        self.index.map_or(0, |i| i + 1)
    }

    /// Step to the next slot, whether or not it holds samples. Returns false, without changing
    /// the current slot's data, if there is no next slot.
    pub(crate) fn move_next(&mut self) -> bool {
        let len = self.hist.counts.len();
        let index = self.next_index();
        if index >= len {
            self.index = Some(len);
            return false;
        }

        self.index = Some(index);
        self.count = self.hist.counts[self.hist.normalize_index(index)];
        self.cumulative_count = self.cumulative_count.saturating_add(self.count);

        let value = self.hist.value_for(index);
        self.value = value;
        self.lowest_equivalent = self.hist.lowest_equivalent(value);
        self.highest_equivalent = self.hist.highest_equivalent(value);
        self.median_equivalent = self.hist.median_equivalent(value);
        true
    }

    /// Step to the next slot only while samples remain unaccounted for.
    pub(crate) fn basic_next(&mut self) -> bool {
        if !self.has_next() || self.exhausted() {
            return false;
        }
        self.move_next()
    }

    /// Does the slot after the current one start above `bound`?
    pub(crate) fn next_value_exceeds(&self, bound: u64) -> bool {
        if self.exhausted() {
            return false;
        }
        self.hist.value_for(self.next_index()) > bound
    }

    pub(crate) fn update_iterated(&mut self, value_iterated_to: u64) {
        self.value_iterated_from = self.value_iterated_to;
        self.value_iterated_to = value_iterated_to;
    }

    pub(crate) fn count(&self) -> u64 {
        self.count
    }

    pub(crate) fn cumulative_count(&self) -> u64 {
        self.cumulative_count
    }

    pub(crate) fn total_count(&self) -> u64 {
        self.total_count
    }

    pub(crate) fn value(&self) -> u64 {
        self.value
    }

    pub(crate) fn highest_equivalent(&self) -> u64 {
        self.highest_equivalent
    }

    fn percentile(&self) -> f64 {
        if self.total_count == 0 {
            return 100.0;
        }
        100.0 * self.cumulative_count as f64 / self.total_count as f64
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Mode {
    All(all::Iter),
    Recorded(recorded::Iter),
    Percentile(percentile::Iter),
    Linear(linear::Iter),
    Log(log::Iter),
}

impl From<all::Iter> for Mode {
    fn from(it: all::Iter) -> Mode {
        Mode::All(it)
    }
}

impl From<recorded::Iter> for Mode {
    fn from(it: recorded::Iter) -> Mode {
        Mode::Recorded(it)
    }
}

impl From<percentile::Iter> for Mode {
    fn from(it: percentile::Iter) -> Mode {
        Mode::Percentile(it)
    }
}

impl From<linear::Iter> for Mode {
    fn from(it: linear::Iter) -> Mode {
        Mode::Linear(it)
    }
}

impl From<log::Iter> for Mode {
    fn from(it: log::Iter) -> Mode {
        Mode::Log(it)
    }
}

/// An iterator over a histogram, yielding one [`IterationValue`] per reported step.
///
/// Obtained from `Histogram::iter_all`, `iter_recorded`, `iter_percentiles`, `iter_linear` or
/// `iter_log`. The histogram stays borrowed for as long as the iterator lives.
#[derive(Debug, Clone)]
pub struct HistogramIterator<'a> {
    cursor: Cursor<'a>,
    mode: Mode,
    ended: bool,
}

impl<'a> HistogramIterator<'a> {
    pub(crate) fn new<M: Into<Mode>>(hist: &'a Histogram, mode: M) -> HistogramIterator<'a> {
        HistogramIterator {
            cursor: Cursor::new(hist),
            mode: mode.into(),
            ended: false,
        }
    }

    fn current(&self) -> IterationValue {
        let c = &self.cursor;
        let (count_since_last_iteration, percentile_iterated_to) = match self.mode {
            Mode::All(_) => (c.count, c.percentile()),
            Mode::Recorded(ref it) => (it.count_added(), c.percentile()),
            Mode::Percentile(ref it) => (it.count_added(), it.percentile()),
            Mode::Linear(ref it) => (it.count_added(), c.percentile()),
            Mode::Log(ref it) => (it.count_added(), c.percentile()),
        };

        IterationValue {
            value: c.value,
            lowest_equivalent: c.lowest_equivalent,
            highest_equivalent: c.highest_equivalent,
            median_equivalent: c.median_equivalent,
            value_iterated_from: c.value_iterated_from,
            value_iterated_to: c.value_iterated_to,
            count_at_value: c.count,
            count_since_last_iteration,
            cumulative_count: c.cumulative_count,
            percentile: c.percentile(),
            percentile_iterated_to,
        }
    }
}

impl<'a> Iterator for HistogramIterator<'a> {
    type Item = IterationValue;

    fn next(&mut self) -> Option<IterationValue> {
        if self.ended {
            return None;
        }

        let cursor = &mut self.cursor;
        let stepped = match self.mode {
            Mode::All(ref mut it) => it.advance(cursor),
            Mode::Recorded(ref mut it) => it.advance(cursor),
            Mode::Percentile(ref mut it) => it.advance(cursor),
            Mode::Linear(ref mut it) => it.advance(cursor),
            Mode::Log(ref mut it) => it.advance(cursor),
        };

        if !stepped {
            self.ended = true;
            return None;
        }
        Some(self.current())
    }
}

impl<'a> FusedIterator for HistogramIterator<'a> {}

/// One step of a histogram iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationValue {
    value: u64,
    lowest_equivalent: u64,
    highest_equivalent: u64,
    median_equivalent: u64,
    value_iterated_from: u64,
    value_iterated_to: u64,
    count_at_value: u64,
    count_since_last_iteration: u64,
    cumulative_count: u64,
    percentile: f64,
    percentile_iterated_to: f64,
}

impl IterationValue {
    /// The lowest value of the slot the iterator is positioned at.
    pub fn value(&self) -> u64 {
        self.value
    }

    /// The lowest value equivalent to the current slot's value.
    pub fn lowest_equivalent(&self) -> u64 {
        self.lowest_equivalent
    }

    /// The highest value equivalent to the current slot's value.
    pub fn highest_equivalent(&self) -> u64 {
        self.highest_equivalent
    }

    /// The middle of the current slot's range of equivalent values.
    pub fn median_equivalent(&self) -> u64 {
        self.median_equivalent
    }

    /// The upper bound of the previous step, or 0 for the first step.
    pub fn value_iterated_from(&self) -> u64 {
        self.value_iterated_from
    }

    /// The upper bound of the range of values covered by this step.
    ///
    /// For all and recorded iteration this is the highest equivalent value of the slot; for
    /// percentile iteration, the highest equivalent value of the slot the percentile level was
    /// reached in; for linear and logarithmic iteration, the last value of the window.
    pub fn value_iterated_to(&self) -> u64 {
        self.value_iterated_to
    }

    /// Number of samples recorded in the current slot.
    pub fn count_at_value(&self) -> u64 {
        self.count_at_value
    }

    /// Number of samples covered since the previous step was reported.
    pub fn count_since_last_iteration(&self) -> u64 {
        self.count_since_last_iteration
    }

    /// Number of samples in all slots up to and including the current one.
    pub fn cumulative_count(&self) -> u64 {
        self.cumulative_count
    }

    /// Percentage of all samples that are at or below the current slot.
    pub fn percentile(&self) -> f64 {
        self.percentile
    }

    /// The percentile level this step reports. Differs from `percentile()` only for percentile
    /// iteration, where it is the level that was iterated to.
    pub fn percentile_iterated_to(&self) -> f64 {
        self.percentile_iterated_to
    }
}
