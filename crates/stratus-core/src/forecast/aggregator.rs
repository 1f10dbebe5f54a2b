//! Reduces the provider's 3-hour sample stream into the page's hourly and
//! daily sequences.
//!
//! ## Hourly
//!
//! The first `limits.hourly` samples, copied one-to-one. There is no
//! resampling: "hourly" has the cadence of the input.
//!
//! ## Daily
//!
//! A single streaming pass groups samples by local calendar date. Each group
//! keeps the extrema of temperature and precipitation probability and the
//! condition of its first sample. Groups are appended in the order their first
//! sample arrives; once `limits.daily` days are stored, later days are dropped.

use log::debug;

use super::model::{DailySummary, Forecast, HourlySummary, Sample};
use crate::bounded::BoundedVec;
use crate::config::ForecastLimits;
use crate::time::{CivilDate, TimeZone};

/// Day currently being accumulated
struct DayBucket {
    date: CivilDate,
    summary: DailySummary,
}

/// Stateless forecast reducer; every call to [`aggregate`](Self::aggregate)
/// starts from scratch.
#[derive(Debug, Clone, Copy)]
pub struct ForecastAggregator {
    limits: ForecastLimits,
    zone: TimeZone,
}

impl ForecastAggregator {
    pub const fn new(limits: ForecastLimits, zone: TimeZone) -> Self {
        Self { limits, zone }
    }

    pub const fn limits(&self) -> ForecastLimits {
        self.limits
    }

    /// Aggregate a chronological sample stream.
    ///
    /// Total over any input: an empty stream yields two empty sequences and an
    /// over-long one is truncated. Iteration stops early once both sequences
    /// are full, since no later sample can change the result.
    pub fn aggregate<I>(&self, samples: I) -> Forecast
    where
        I: IntoIterator<Item = Sample>,
    {
        let mut hourly = BoundedVec::with_capacity(self.limits.hourly);
        let mut daily = BoundedVec::with_capacity(self.limits.daily);
        let mut open: Option<DayBucket> = None;
        let mut consumed = 0usize;

        for sample in samples {
            if hourly.is_full() && daily.is_full() {
                break;
            }
            consumed += 1;

            if !hourly.is_full() {
                let _ = hourly.push(HourlySummary::from(&sample));
            }

            let date = self.zone.local_date(sample.timestamp);
            match open.as_mut() {
                Some(bucket) if bucket.date == date => bucket.summary.absorb(&sample),
                _ => {
                    if let Some(done) = open.take() {
                        Self::close_day(&mut daily, done);
                    }
                    open = Some(DayBucket {
                        date,
                        summary: DailySummary::seed(sample),
                    });
                }
            }
        }

        if let Some(done) = open.take() {
            Self::close_day(&mut daily, done);
        }

        debug!(
            "Aggregated {} samples into {} hourly / {} daily",
            consumed,
            hourly.len(),
            daily.len()
        );

        Forecast { hourly, daily }
    }

    fn close_day(daily: &mut BoundedVec<DailySummary>, bucket: DayBucket) {
        if daily.push(bucket.summary).is_err() {
            debug!(
                "Daily capacity reached, dropping {}-{:02}-{:02}",
                bucket.date.year, bucket.date.month, bucket.date.day
            );
        }
    }
}
