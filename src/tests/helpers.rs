use crate::{Error, Histogram, InvalidArgument};

#[cfg(test)]
pub fn histo64(
    lowest_discernible_value: u64,
    highest_trackable_value: u64,
    significant_figures: u8,
) -> Histogram {
    Histogram::new_with_bounds(
        lowest_discernible_value,
        highest_trackable_value,
        significant_figures,
    )
    .unwrap()
}

/// Unwrap the reason out of a construction error that must be an `InvalidArgument`.
#[cfg(test)]
pub fn invalid_argument(res: Result<Histogram, Error>) -> InvalidArgument {
    match res {
        Err(Error::InvalidArgument(e)) => e,
        other => panic!("expected an invalid argument, got {:?}", other),
    }
}
