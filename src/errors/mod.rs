//! Errors reported by construction, recording, batch queries and output.

use std::io;
use thiserror::Error;

/// Errors surfaced by histogram construction, batch queries, and percentile output.
#[derive(Debug, Error)]
pub enum Error {
    /// A construction or query parameter was rejected. No allocation was attempted.
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] InvalidArgument),
    /// The counter array could not be allocated.
    #[error("could not allocate a counter array of {len} slots")]
    OutOfMemory {
        /// Number of counter slots that were requested.
        len: usize,
    },
    /// Writing percentile output failed. Rows written before the failure are not retracted.
    #[error("i/o error while writing histogram output: {0}")]
    Io(#[from] io::Error),
}

/// Why a parameter was rejected.
#[derive(Debug, Eq, PartialEq, Clone, Copy, Error)]
pub enum InvalidArgument {
    /// Lowest discernible value must be >= 1.
    #[error("lowest discernible value must be >= 1")]
    LowIsZero,
    /// Highest trackable value must be >= 2 * lowest discernible value for some internal
    /// calculations to work out. In practice, high is typically much higher than 2 * low.
    #[error("highest trackable value must be >= 2 * lowest discernible value")]
    HighLessThanTwiceLow,
    /// Number of significant digits must be in the range `[1, 5]`. It is capped at 5 because 5
    /// significant digits is already more than almost anyone needs, and memory usage scales
    /// exponentially as this increases.
    #[error("significant figures must be between 1 and 5")]
    SigFigOutOfRange,
    /// Cannot represent sigfig worth of values beyond the lowest discernible value. Decrease the
    /// significant figures, lowest discernible value, or both.
    ///
    /// The exponent of the largest power of two that is not bigger than the lowest value and the
    /// bits needed for the sub-bucket half count must sum to 61 or less.
    #[error("cannot represent the requested significant figures beyond the lowest discernible value")]
    CannotRepresentSigFigBeyondLow,
    /// The `usize` type is too small to represent the desired configuration. Use fewer significant
    /// figures or a lower max.
    #[error("usize cannot represent the counter array length")]
    UsizeTypeTooSmall,
    /// The output buffer of a batch percentile query must be as long as the percentile list.
    #[error("percentile and value buffers must have the same length")]
    PercentileBufferLengthMismatch,
    /// Batch percentile queries are answered in one sweep and need ascending percentiles.
    #[error("percentiles must be sorted in ascending order")]
    PercentilesNotSorted,
}

/// Errors that can occur while recording a value and its associated count.
///
/// A failed record leaves the histogram untouched, so it is safe to ignore when dropping
/// out-of-range samples is acceptable.
#[derive(Debug, Eq, PartialEq, Clone, Copy, Error)]
pub enum RecordError {
    /// The value is above the highest trackable value. Configure a higher maximum value.
    #[error("value {0} is outside of the trackable range")]
    ValueOutOfRange(u64),
}
