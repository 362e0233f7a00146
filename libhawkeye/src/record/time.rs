use chrono::{Datelike, Days, NaiveDate};
use tracing::warn;

/// Length of a GPS week in seconds
pub const GPS_WEEK_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Converts the seconds-of-week timestamps stored in a file into absolute time
///
/// A flightline can cross the end of a GPS week, after which the on-file timestamps restart
/// near zero. Any timestamp smaller than the first timestamp of the file is taken to belong to
/// the following week.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimeBase {
    /// Start of the GPS week the survey began in, seconds since the Unix epoch
    pub week_start: i64,
    /// Timestamp of the first record of the file
    pub start_gps_time: f64,
}

impl TimeBase {
    /// Creates a [`TimeBase`] for a survey flown on day `day` (1 based) of `year`
    ///
    /// Falls back to a week start of 0 if the date is not valid.
    #[must_use]
    pub fn from_survey_date(year: u16, day: u16, start_gps_time: f64) -> Self {
        let week_start = gps_week_start(year, day).unwrap_or_else(|| {
            warn!("Invalid survey date {year}/{day}, absolute times will be relative to the epoch");
            0
        });
        Self {
            week_start,
            start_gps_time,
        }
    }

    /// Returns the absolute time of a raw record timestamp as `(seconds, nanoseconds)`
    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn absolute(&self, raw: f64) -> (i64, i64) {
        let offset = if raw < self.start_gps_time {
            self.week_start + GPS_WEEK_SECONDS
        } else {
            self.week_start
        };
        let whole = raw.floor();
        let mut sec = offset + whole as i64;
        let mut nsec = ((raw - whole) * 1.0e9).round() as i64;
        if nsec >= 1_000_000_000 {
            sec += 1;
            nsec -= 1_000_000_000;
        }
        (sec, nsec)
    }
}

/// Unix time of 00:00 UTC on the Sunday starting the week that holds `year`/`day`
fn gps_week_start(year: u16, day: u16) -> Option<i64> {
    let date = NaiveDate::from_yo_opt(i32::from(year), u32::from(day))?;
    let sunday = date.checked_sub_days(Days::new(u64::from(
        date.weekday().num_days_from_sunday(),
    )))?;
    Some(sunday.and_hms_opt(0, 0, 0)?.and_utc().timestamp())
}
