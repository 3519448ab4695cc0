//! Percentile distribution output.

use crate::errors::Error;
use crate::Histogram;
use std::io::{self, Write};
use tracing::debug;

/// Layout of the table written by [`Histogram::print_percentiles`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Right-aligned columns followed by a summary footer.
    Classic,
    /// Comma-separated values without a footer.
    Csv,
}

impl Default for Format {
    fn default() -> Self {
        Format::Classic
    }
}

impl Histogram {
    /// Write the percentile distribution of this histogram to `writer`.
    ///
    /// One row is written per step of `iter_percentiles(ticks_per_half_distance)`, holding the
    /// step's highest equivalent value divided by `value_scale`, its percentile level as a
    /// fraction, its cumulative count and `1/(1-percentile)`. Values are printed with as many
    /// decimals as the histogram has significant figures. The classic format ends with a footer
    /// of mean, standard deviation, max, total count, bucket and sub-bucket counts.
    ///
    /// ```
    /// use hdrcore::{Format, Histogram};
    /// let mut hist = Histogram::new_with_max(10_000, 3).unwrap();
    /// hist.record(100).unwrap();
    ///
    /// let mut out = Vec::new();
    /// hist.print_percentiles(&mut out, 5, 1.0, Format::Csv).unwrap();
    /// let out = String::from_utf8(out).unwrap();
    /// assert!(out.starts_with("Value,Percentile,TotalCount,1/(1-Percentile)\n"));
    /// ```
    ///
    /// # Panics
    ///
    /// This will panic if `ticks_per_half_distance` is 0.
    pub fn print_percentiles<W: Write>(
        &self,
        writer: &mut W,
        ticks_per_half_distance: u32,
        value_scale: f64,
        format: Format,
    ) -> Result<(), Error> {
        self.write_percentiles(writer, ticks_per_half_distance, value_scale, format)
            .map_err(|e| {
                debug!(error = %e, "Failed to write percentile distribution.");
                Error::from(e)
            })
    }

    fn write_percentiles<W: Write>(
        &self,
        writer: &mut W,
        ticks_per_half_distance: u32,
        value_scale: f64,
        format: Format,
    ) -> io::Result<()> {
        let precision = usize::from(self.sigfig());

        match format {
            Format::Classic => write!(
                writer,
                "{:>12} {:>12} {:>12} {:>12}\n\n",
                "Value", "Percentile", "TotalCount", "1/(1-Percentile)"
            )?,
            Format::Csv => writeln!(
                writer,
                "{},{},{},{}",
                "Value", "Percentile", "TotalCount", "1/(1-Percentile)"
            )?,
        }

        for v in self.iter_percentiles(ticks_per_half_distance) {
            let value = v.highest_equivalent() as f64 / value_scale;
            let percentile = v.percentile_iterated_to() / 100.0;
            let total_count = v.cumulative_count();
            let inverted_percentile = 1.0 / (1.0 - percentile);

            match format {
                Format::Classic => writeln!(
                    writer,
                    "{:12.*} {:12.6} {:12} {:12.2}",
                    precision, value, percentile, total_count, inverted_percentile
                )?,
                Format::Csv => writeln!(
                    writer,
                    "{:.*},{:.6},{},{:.2}",
                    precision, value, percentile, total_count, inverted_percentile
                )?,
            }
        }

        if format == Format::Classic {
            writeln!(
                writer,
                "#[Mean    = {:12.3}, StdDeviation   = {:12.3}]",
                self.mean() / value_scale,
                self.stdev() / value_scale
            )?;
            writeln!(
                writer,
                "#[Max     = {:12.3}, Total count    = {:12}]",
                self.max() as f64 / value_scale,
                self.len()
            )?;
            writeln!(
                writer,
                "#[Buckets = {:12}, SubBuckets     = {:12}]",
                self.buckets(),
                self.sub_bucket_count()
            )?;
        }

        Ok(())
    }
}
