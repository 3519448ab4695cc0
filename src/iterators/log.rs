use crate::iterators::{Cursor, HistogramIterator};
use crate::Histogram;

/// An iterator that will yield at log-size steps through the histogram's value range.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Iter {
    log_base: f64,

    // exclusive upper end of the current window, kept as a float so fractional bases compound
    next_value_reporting_level: f64,
    current_step_highest_value_reporting_level: u64,
    current_step_lowest_value_reporting_level: u64,

    count_added: u64,
    levels_exhausted: bool,
}

impl Iter {
    /// Construct a new logarithmic iterator. See `Histogram::iter_log` for details.
    pub(crate) fn new(
        hist: &Histogram,
        value_units_in_first_bucket: u64,
        log_base: f64,
    ) -> HistogramIterator<'_> {
        assert!(
            value_units_in_first_bucket > 0,
            "value_units_in_first_bucket must be > 0"
        );
        assert!(log_base > 1.0, "log_base must be > 1.0");
        HistogramIterator::new(
            hist,
            Iter {
                log_base,
                next_value_reporting_level: value_units_in_first_bucket as f64,
                current_step_highest_value_reporting_level: value_units_in_first_bucket - 1,
                current_step_lowest_value_reporting_level: hist
                    .lowest_equivalent(value_units_in_first_bucket - 1),
                count_added: 0,
                levels_exhausted: false,
            },
        )
    }

    pub(crate) fn advance(&mut self, cursor: &mut Cursor<'_>) -> bool {
        self.count_added = 0;
        if self.levels_exhausted || cursor.exhausted() {
            return false;
        }

        if !cursor.has_next()
            && !cursor.next_value_exceeds(self.current_step_lowest_value_reporting_level)
        {
            return false;
        }

        loop {
            if cursor.started() && cursor.value() >= self.current_step_lowest_value_reporting_level
            {
                self.report(cursor);
                return true;
            }

            if !cursor.move_next() {
                self.report(cursor);
                return true;
            }
            self.count_added = self.count_added.saturating_add(cursor.count());
        }
    }

    fn report(&mut self, cursor: &mut Cursor<'_>) {
        let highest = self.current_step_highest_value_reporting_level;
        cursor.update_iterated(highest);

        self.next_value_reporting_level *= self.log_base;
        // 2^64, the first level a u64 window bound cannot express
        if self.next_value_reporting_level >= 18_446_744_073_709_551_616.0
            || highest == u64::max_value()
        {
            self.levels_exhausted = true;
            return;
        }

        // small bases may not move an integral bound on their own; windows never shrink to
        // nothing
        let next_highest = (self.next_value_reporting_level as u64 - 1).max(highest + 1);
        self.current_step_highest_value_reporting_level = next_highest;
        self.current_step_lowest_value_reporting_level =
            cursor.hist().lowest_equivalent(next_highest);
    }

    pub(crate) fn count_added(&self) -> u64 {
        self.count_added
    }
}
