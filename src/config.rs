//! Bucket configuration: the sizing parameters derived from a histogram's bounds and precision.

use crate::errors::InvalidArgument;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

/// The sizing parameters of a histogram, derived once from its lowest discernible value, highest
/// trackable value and number of significant figures.
///
/// A `BucketConfig` is always valid: the only ways to obtain one are [`BucketConfig::new`] and
/// deserialization, and both validate their input. It serializes as its [`Bounds`]; the derived
/// fields are recomputed on the way back in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Bounds", into = "Bounds")]
pub struct BucketConfig {
    pub(crate) lowest_discernible_value: u64,
    pub(crate) highest_trackable_value: u64,
    pub(crate) significant_figures: u8,
    pub(crate) unit_magnitude: u8,
    pub(crate) sub_bucket_half_count_magnitude: u8,
    pub(crate) sub_bucket_half_count: u32,
    pub(crate) sub_bucket_count: u32,
    pub(crate) sub_bucket_mask: u64,
    pub(crate) bucket_count: u8,
    pub(crate) counts_len: usize,
}

/// The user-facing inputs of a [`BucketConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    /// Smallest value distinguishable from 0. Rounded down to the nearest power of two.
    #[serde(default = "default_lowest_discernible_value")]
    pub lowest_discernible_value: u64,
    /// Largest value that can be recorded.
    pub highest_trackable_value: u64,
    /// Number of significant decimal digits maintained across the whole range, in `[1, 5]`.
    pub significant_figures: u8,
}

fn default_lowest_discernible_value() -> u64 {
    1
}

impl BucketConfig {
    /// Derive the sizing parameters for a histogram tracking values in
    /// `[lowest_discernible_value, highest_trackable_value]` with `significant_figures` digits of
    /// precision.
    ///
    /// `lowest_discernible_value` must be >= 1 and `highest_trackable_value` must be at least
    /// twice as large. `significant_figures` must be in `[1, 5]`.
    pub fn new(
        lowest_discernible_value: u64,
        highest_trackable_value: u64,
        significant_figures: u8,
    ) -> Result<BucketConfig, InvalidArgument> {
        if lowest_discernible_value < 1 {
            return Err(InvalidArgument::LowIsZero);
        }
        if !(1..=5).contains(&significant_figures) {
            return Err(InvalidArgument::SigFigOutOfRange);
        }
        match lowest_discernible_value.checked_mul(2) {
            Some(twice_low) if twice_low <= highest_trackable_value => {}
            _ => return Err(InvalidArgument::HighLessThanTwiceLow),
        }

        // Given a 3 decimal point accuracy, the expectation is obviously for "+/- 1 unit at 1000".
        // It also means that it's "ok to be +/- 2 units at 2000". The "tricky" thing is that it is
        // NOT ok to be +/- 2 units at 1999. Only starting at 2000. So internally, we need to
        // maintain single unit resolution to 2x 10^decimal_points.
        let largest_value_with_single_unit_resolution = 2 * 10_u32.pow(significant_figures.into());

        // We need to maintain power-of-two sub_bucket_count (for clean direct indexing) that is
        // large enough to provide unit resolution to at least
        // largest_value_with_single_unit_resolution. So figure out
        // largest_value_with_single_unit_resolution's nearest power-of-two (rounded up), and use
        // that. The f64 log2 is exact enough here since the input is at most 200,000.
        let sub_bucket_count_magnitude =
            f64::from(largest_value_with_single_unit_resolution).log2().ceil() as u8;
        let sub_bucket_half_count_magnitude = sub_bucket_count_magnitude.max(1) - 1;

        // floor(log2(low)), exact for any u64 >= 1
        let unit_magnitude = (63 - lowest_discernible_value.leading_zeros()) as u8;

        if u32::from(unit_magnitude) + u32::from(sub_bucket_half_count_magnitude) > 61 {
            return Err(InvalidArgument::CannotRepresentSigFigBeyondLow);
        }

        let sub_bucket_count = 1_u32 << (sub_bucket_half_count_magnitude + 1);
        let sub_bucket_half_count = sub_bucket_count / 2;
        let sub_bucket_mask = (u64::from(sub_bucket_count) - 1) << unit_magnitude;

        let bucket_count =
            buckets_needed_to_cover(highest_trackable_value, sub_bucket_count, unit_magnitude);

        // If we have N such that sub_bucket_count * 2^N > high, we need storage for N+1 buckets,
        // each with enough slots to hold the top half of the sub_bucket_count (the lower half is
        // covered by previous buckets), and the +1 being used for the lower half of the 0'th
        // bucket.
        let counts_len = (usize::from(bucket_count) + 1)
            .checked_mul(sub_bucket_half_count as usize)
            .ok_or(InvalidArgument::UsizeTypeTooSmall)?;

        Ok(BucketConfig {
            lowest_discernible_value,
            highest_trackable_value,
            significant_figures,
            unit_magnitude,
            sub_bucket_half_count_magnitude,
            sub_bucket_half_count,
            sub_bucket_count,
            sub_bucket_mask,
            bucket_count,
            counts_len,
        })
    }

    /// The lowest discernible value this configuration was built with.
    pub fn lowest_discernible_value(&self) -> u64 {
        self.lowest_discernible_value
    }

    /// The highest trackable value this configuration was built with.
    pub fn highest_trackable_value(&self) -> u64 {
        self.highest_trackable_value
    }

    /// The number of significant decimal digits maintained.
    pub fn significant_figures(&self) -> u8 {
        self.significant_figures
    }

    /// log2 of the lowest discernible value, rounded down.
    pub fn unit_magnitude(&self) -> u8 {
        self.unit_magnitude
    }

    /// Number of power-of-two buckets needed to cover the highest trackable value.
    pub fn bucket_count(&self) -> u8 {
        self.bucket_count
    }

    /// Number of linear sub-buckets per bucket.
    pub fn sub_bucket_count(&self) -> u32 {
        self.sub_bucket_count
    }

    /// Length of the counter array, `(bucket_count + 1) * (sub_bucket_count / 2)`.
    pub fn counts_len(&self) -> usize {
        self.counts_len
    }
}

impl TryFrom<Bounds> for BucketConfig {
    type Error = InvalidArgument;

    fn try_from(bounds: Bounds) -> Result<Self, Self::Error> {
        BucketConfig::new(
            bounds.lowest_discernible_value,
            bounds.highest_trackable_value,
            bounds.significant_figures,
        )
    }
}

impl From<BucketConfig> for Bounds {
    fn from(config: BucketConfig) -> Self {
        Bounds {
            lowest_discernible_value: config.lowest_discernible_value,
            highest_trackable_value: config.highest_trackable_value,
            significant_figures: config.significant_figures,
        }
    }
}

fn buckets_needed_to_cover(value: u64, sub_bucket_count: u32, unit_magnitude: u8) -> u8 {
    // the k'th bucket can express from 0 * 2^k to sub_bucket_count * 2^k in units of 2^k
    let mut smallest_untrackable_value = u64::from(sub_bucket_count) << unit_magnitude;

    // always have at least 1 bucket
    let mut buckets_needed = 1;
    while smallest_untrackable_value <= value {
        if smallest_untrackable_value > u64::max_value() / 2 {
            // next shift will overflow, meaning that bucket could represent values up to ones
            // greater than u64::max_value, so it's the last bucket
            return buckets_needed + 1;
        }
        smallest_untrackable_value <<= 1;
        buckets_needed += 1;
    }
    buckets_needed
}
