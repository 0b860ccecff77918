//! History read ranges: the user-facing range shortcuts (`today`,
//! `yesterday`, dates, datetimes and pairs of either) and their
//! resolution to half-open time intervals.

use crate::err::ParseError;
use crate::tz;
use crate::value::Value;
use crate::zinc;
use chrono::{DateTime, Duration, LocalResult, NaiveDate, SecondsFormat, TimeZone, Utc};
use chrono_tz::Tz;
use log::debug;

/// Represents the different time range queries that can be sent as
/// part of the `hisRead` Haystack operation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum HisReadRange {
    /// No bounds at all.
    Unbounded,
    /// History values from today.
    Today,
    /// History values from yesterday.
    Yesterday,
    /// History values on a particular date.
    Date(NaiveDate),
    /// History values between two dates, end exclusive.
    DateSpan { start: NaiveDate, end: NaiveDate },
    /// History values at a particular instant (a point query).
    DateTime(DateTime<Tz>),
    /// History values between two instants, end exclusive.
    DateTimeSpan {
        start: DateTime<Tz>,
        end: DateTime<Tz>,
    },
}

/// A half-open interval `[start, end)` over instants. A `None` bound
/// is unbounded on that side.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn unbounded() -> Self {
        DateRange {
            start: None,
            end: None,
        }
    }

    /// Returns true when the instant lies within the interval.
    pub fn contains<T: TimeZone>(&self, instant: &DateTime<T>) -> bool {
        let instant = instant.with_timezone(&Utc);
        let after_start = match self.start {
            Some(start) => instant >= start,
            None => true,
        };
        let before_end = match self.end {
            Some(end) => instant < end,
            None => true,
        };
        after_start && before_end
    }
}

const DATE_FMT: &str = "%Y-%m-%d";

impl HisReadRange {
    /// Parse a range token. An empty or absent token is the unbounded
    /// range; datetime tokens use the zinc literal form.
    pub fn parse(s: Option<&str>) -> Result<Self, ParseError> {
        let s = match s {
            Some(s) if !s.trim().is_empty() => s.trim(),
            _ => return Ok(Self::Unbounded),
        };
        match s {
            "today" => return Ok(Self::Today),
            "yesterday" => return Ok(Self::Yesterday),
            _ => {}
        }
        if let Some((start_token, end_token)) = split_pair(s) {
            let start = parse_point(start_token)?;
            let end = parse_point(end_token)?;
            return match (start, end) {
                (Point::Date(start), Point::Date(end)) => Ok(Self::DateSpan { start, end }),
                (Point::DateTime(start), Point::DateTime(end)) => {
                    Ok(Self::DateTimeSpan { start, end })
                }
                _ => Err(ParseError::no_pos(format!(
                    "range '{}' mixes dates and datetimes",
                    s
                ))),
            };
        }
        match parse_point(s)? {
            Point::Date(date) => Ok(Self::Date(date)),
            Point::DateTime(date_time) => Ok(Self::DateTime(date_time)),
        }
    }

    /// Resolve this range against the current wall clock in the given
    /// time zone.
    pub fn resolve(&self, tz: Tz) -> DateRange {
        self.resolve_at(Utc::now().with_timezone(&tz))
    }

    /// Resolve this range with an explicit "now", which pins what
    /// `today` and `yesterday` mean.
    pub fn resolve_at(&self, now: DateTime<Tz>) -> DateRange {
        let tz = now.timezone();
        let range = match self {
            Self::Unbounded => DateRange::unbounded(),
            Self::Today => day_range(now.date_naive(), tz),
            Self::Yesterday => day_range(now.date_naive() - Duration::days(1), tz),
            Self::Date(date) => day_range(*date, tz),
            Self::DateSpan { start, end } => DateRange {
                start: Some(day_start(*start, tz)),
                end: Some(day_start(*end, tz)),
            },
            Self::DateTime(date_time) => {
                let start = date_time.with_timezone(&Utc);
                DateRange {
                    start: Some(start),
                    end: Some(start + Duration::seconds(1)),
                }
            }
            Self::DateTimeSpan { start, end } => DateRange {
                start: Some(start.with_timezone(&Utc)),
                end: Some(end.with_timezone(&Utc)),
            },
        };
        debug!("resolved range {:?} to {:?}", self, range);
        range
    }

    /// The wire token for this range, as used in `hisRead` request
    /// grids. The unbounded range is the empty string.
    pub fn to_range_string(&self) -> String {
        match self {
            Self::Unbounded => String::new(),
            Self::Today => "today".to_owned(),
            Self::Yesterday => "yesterday".to_owned(),
            Self::Date(date) => date.format(DATE_FMT).to_string(),
            Self::DateSpan { start, end } => {
                format!("{},{}", start.format(DATE_FMT), end.format(DATE_FMT))
            }
            Self::DateTime(date_time) => date_time_token(date_time),
            Self::DateTimeSpan { start, end } => {
                format!("{},{}", date_time_token(start), date_time_token(end))
            }
        }
    }
}

enum Point {
    Date(NaiveDate),
    DateTime(DateTime<Tz>),
}

fn parse_point(token: &str) -> Result<Point, ParseError> {
    match zinc::parse_scalar(token.trim())? {
        Value::Date(date) => Ok(Point::Date(date)),
        Value::DateTime(date_time) => Ok(Point::DateTime(date_time)),
        _ => Err(ParseError::no_pos(format!(
            "expected a date or datetime, found '{}'",
            token
        ))),
    }
}

fn split_pair(s: &str) -> Option<(&str, &str)> {
    let comma = s.find(',')?;
    Some((&s[..comma], &s[comma + 1..]))
}

fn day_range(date: NaiveDate, tz: Tz) -> DateRange {
    DateRange {
        start: Some(day_start(date, tz)),
        end: Some(day_start(date + Duration::days(1), tz)),
    }
}

/// Local midnight of the given date, in UTC. On days when midnight
/// does not exist (a DST gap) the first existing instant is used.
fn day_start(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let midnight = date.and_hms(0, 0, 0);
    let local = match tz.from_local_datetime(&midnight) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(first, _) => first,
        LocalResult::None => tz
            .from_local_datetime(&(midnight + Duration::hours(1)))
            .earliest()
            .expect("one hour past midnight exists in every IANA zone"),
    };
    local.with_timezone(&Utc)
}

fn date_time_token(date_time: &DateTime<Tz>) -> String {
    format!(
        "{} {}",
        date_time.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        tz::short_name(&date_time.timezone()),
    )
}
