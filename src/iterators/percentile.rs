use crate::iterators::{Cursor, HistogramIterator};
use crate::Histogram;

/// An iterator that will yield at percentile steps through the histogram's value range.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Iter {
    ticks_per_half_distance: u32,
    percentile_to_iterate_to: f64,
    percentile: f64,
    seen_last_value: bool,
    reported_cumulative_count: u64,
    count_added: u64,
}

impl Iter {
    /// Construct a new percentile iterator. See `Histogram::iter_percentiles` for details.
    pub(crate) fn new(hist: &Histogram, ticks_per_half_distance: u32) -> HistogramIterator<'_> {
        assert!(
            ticks_per_half_distance > 0,
            "Ticks per half distance must be > 0"
        );
        HistogramIterator::new(
            hist,
            Iter {
                ticks_per_half_distance,
                percentile_to_iterate_to: 0.0,
                percentile: 0.0,
                seen_last_value: false,
                reported_cumulative_count: 0,
                count_added: 0,
            },
        )
    }

    pub(crate) fn advance(&mut self, cursor: &mut Cursor<'_>) -> bool {
        if !cursor.has_next() {
            return self.report_last(cursor);
        }

        if !cursor.started() && !cursor.basic_next() {
            return false;
        }

        loop {
            let current_percentile =
                100.0 * cursor.cumulative_count() as f64 / cursor.total_count() as f64;
            if cursor.count() != 0 && self.percentile_to_iterate_to <= current_percentile {
                let to = cursor.highest_equivalent();
                cursor.update_iterated(to);
                self.percentile = self.percentile_to_iterate_to;
                self.record_step(cursor);
                self.percentile_to_iterate_to += self.tick_size();
                return true;
            }

            if !cursor.basic_next() {
                return self.report_last(cursor);
            }
        }
    }

    /// The single closing step at 100%, reported once every sample has been seen.
    fn report_last(&mut self, cursor: &mut Cursor<'_>) -> bool {
        if self.seen_last_value {
            return false;
        }
        self.seen_last_value = true;

        let to = cursor.highest_equivalent();
        cursor.update_iterated(to);
        self.percentile = 100.0;
        self.record_step(cursor);
        true
    }

    fn record_step(&mut self, cursor: &Cursor<'_>) {
        self.count_added = cursor
            .cumulative_count()
            .saturating_sub(self.reported_cumulative_count);
        self.reported_cumulative_count = cursor.cumulative_count();
    }

    fn tick_size(&self) -> f64 {
        // The choice to maintain fixed-sized "ticks" in each half-distance to 100% [starting from
        // 0%], as opposed to a "tick" size that varies with each interval, was made to make the
        // steps easily comprehensible and readable to humans. The resulting percentile steps are
        // much easier to browse through in a percentile distribution output, for example.
        //
        // We calculate the number of equal-sized "ticks" that the 0-100 range will be divided by
        // at the current scale. The scale is determined by the percentile level we are iterating
        // to. The following math determines the tick size for the current scale, and maintains a
        // fixed tick size for the remaining "half the distance to 100%" [from either 0% or from
        // the previous half-distance].
        let half_distance_exponent = ((100.0 / (100.0 - self.percentile_to_iterate_to)).log2()
            as u32)
            .saturating_add(1);
        let half_distance = 1_u64
            .checked_shl(half_distance_exponent)
            .unwrap_or_else(u64::max_value);
        let percentile_reporting_ticks =
            u64::from(self.ticks_per_half_distance).saturating_mul(half_distance);
        100.0 / percentile_reporting_ticks as f64
    }

    pub(crate) fn count_added(&self) -> u64 {
        self.count_added
    }

    pub(crate) fn percentile(&self) -> f64 {
        self.percentile
    }
}
