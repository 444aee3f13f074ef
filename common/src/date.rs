//! Calendar [`Date`] definitions.

use std::{fmt, str::FromStr};

use derive_more::{Display, Error};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use time::{macros::format_description, util::days_in_year_month, Month};

/// Calendar date in the [ISO 8601] `YYYY-MM-DD` form.
///
/// [ISO 8601]: https://en.wikipedia.org/wiki/ISO_8601
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Date(time::Date);

impl Date {
    /// Creates a new [`Date`] from the provided calendar components.
    ///
    /// [`None`] is returned if the components do not form a valid date.
    #[must_use]
    pub fn from_ymd(year: i32, month: u8, day: u8) -> Option<Self> {
        let month = Month::try_from(month).ok()?;
        time::Date::from_calendar_date(year, month, day).ok().map(Self)
    }

    /// Returns the year of this [`Date`].
    #[must_use]
    pub const fn year(self) -> i32 {
        self.0.year()
    }

    /// Returns the month of this [`Date`], `1` being January.
    #[must_use]
    pub const fn month(self) -> u8 {
        self.0.month() as u8
    }

    /// Returns the day of month of this [`Date`].
    #[must_use]
    pub const fn day(self) -> u8 {
        self.0.day()
    }

    /// Indicates whether this [`Date`] is the last day of its month.
    #[must_use]
    pub fn is_month_end(self) -> bool {
        self.day() == days_in_year_month(self.year(), self.0.month())
    }

    /// Returns the day before this [`Date`].
    #[must_use]
    pub const fn previous_day(self) -> Option<Self> {
        match self.0.previous_day() {
            Some(d) => Some(Self(d)),
            None => None,
        }
    }

    /// Adds the provided number of calendar `months` to this [`Date`].
    ///
    /// The day of month is clamped to the last day of the resulting month, so
    /// January 31st plus one month is the last day of February.
    #[must_use]
    pub fn add_months(self, months: u32) -> Option<Self> {
        let index = i64::from(self.year()) * 12
            + i64::from(self.month())
            - 1
            + i64::from(months);
        let year = i32::try_from(index.div_euclid(12)).ok()?;
        let month =
            Month::try_from(u8::try_from(index.rem_euclid(12) + 1).ok()?)
                .ok()?;
        let day = self.day().min(days_in_year_month(year, month));
        time::Date::from_calendar_date(year, month, day).ok().map(Self)
    }

    /// Returns the number of whole months covered by the inclusive
    /// `self..=end` range.
    ///
    /// The range covers `n` whole months when `end` is the day before this
    /// [`Date`] plus `n` months (e.g. `2024-01-01..=2024-12-31` covers `12`).
    /// A range starting at a month end also covers `n` whole months when it
    /// ends at the end of the `n`th month after (e.g. `2024-03-31..=2024-04-30`
    /// covers `1`). [`None`] is returned for reversed ranges and ranges ending
    /// in the middle of a month.
    #[must_use]
    pub fn whole_months_until(self, end: Self) -> Option<u32> {
        if end < self {
            return None;
        }

        let approx = (i64::from(end.year()) - i64::from(self.year())) * 12
            + i64::from(end.month())
            - i64::from(self.month());
        [approx, approx + 1]
            .into_iter()
            .filter_map(|n| u32::try_from(n).ok())
            .filter(|n| *n > 0)
            .find(|n| {
                self.add_months(*n).is_some_and(|next| {
                    next.previous_day() == Some(end)
                        || (self.is_month_end()
                            && end.is_month_end()
                            && (next.year(), next.month())
                                == (end.year(), end.month()))
                })
            })
    }
}

impl From<time::Date> for Date {
    fn from(date: time::Date) -> Self {
        Self(date)
    }
}

impl From<Date> for time::Date {
    fn from(date: Date) -> Self {
        date.0
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}",
            self.year(),
            self.month(),
            self.day(),
        )
    }
}

impl FromStr for Date {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        time::Date::parse(s, format_description!("[year]-[month]-[day]"))
            .map(Self)
            .map_err(ParseError)
    }
}

/// Error of parsing a [`Date`] from a string.
#[derive(Clone, Copy, Debug, Display, Error)]
#[display("invalid `YYYY-MM-DD` date: {_0}")]
pub struct ParseError(time::error::Parse);

impl Serialize for Date {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Date {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod spec {
    use super::Date;

    fn date(s: &str) -> Date {
        s.parse().unwrap()
    }

    #[test]
    fn parses_and_formats() {
        assert_eq!(date("2024-01-05"), Date::from_ymd(2024, 1, 5).unwrap());
        assert_eq!(date("2024-01-05").to_string(), "2024-01-05");

        assert!("2024-13-01".parse::<Date>().is_err());
        assert!("2024-02-30".parse::<Date>().is_err());
        assert!("05/01/2024".parse::<Date>().is_err());
        assert!("".parse::<Date>().is_err());
    }

    #[test]
    fn adds_months() {
        assert_eq!(date("2024-01-15").add_months(0), Some(date("2024-01-15")));
        assert_eq!(date("2024-01-15").add_months(1), Some(date("2024-02-15")));
        assert_eq!(date("2024-11-30").add_months(3), Some(date("2025-02-28")));
        assert_eq!(date("2024-01-31").add_months(1), Some(date("2024-02-29")));
        assert_eq!(date("2024-05-01").add_months(24), Some(date("2026-05-01")));
    }

    #[test]
    fn counts_whole_months() {
        let start = date("2024-01-01");

        assert_eq!(start.whole_months_until(date("2024-12-31")), Some(12));
        assert_eq!(start.whole_months_until(date("2024-01-31")), Some(1));
        assert_eq!(
            date("2024-03-15").whole_months_until(date("2025-03-14")),
            Some(12),
        );
        assert_eq!(
            date("2023-12-01").whole_months_until(date("2024-02-29")),
            Some(3),
        );
    }

    #[test]
    fn counts_whole_months_from_month_end() {
        let months = |start, end| date(start).whole_months_until(date(end));

        assert_eq!(months("2024-03-31", "2024-04-30"), Some(1));
        assert_eq!(months("2024-03-31", "2024-04-29"), Some(1));
        assert_eq!(months("2024-01-31", "2024-02-29"), Some(1));
        assert_eq!(months("2024-08-31", "2025-02-28"), Some(6));
        assert_eq!(months("2024-02-29", "2024-03-31"), Some(1));
        assert_eq!(months("2024-04-30", "2024-05-31"), Some(1));
        assert_eq!(months("2024-04-30", "2024-05-29"), Some(1));
        assert_eq!(months("2024-03-31", "2024-04-15"), None);
        assert_eq!(months("2024-03-30", "2024-04-30"), None);

        assert!(date("2024-02-29").is_month_end());
        assert!(!date("2024-02-28").is_month_end());
    }

    #[test]
    fn rejects_partial_months() {
        let start = date("2024-01-01");

        assert_eq!(start.whole_months_until(date("2024-12-30")), None);
        assert_eq!(start.whole_months_until(date("2025-01-01")), None);
        assert_eq!(start.whole_months_until(start), None);
        assert_eq!(start.whole_months_until(date("2023-12-31")), None);
    }

    #[test]
    fn serializes_as_iso_string() {
        assert_eq!(
            serde_json::to_string(&date("2024-03-01")).unwrap(),
            r#""2024-03-01""#,
        );
        assert_eq!(
            serde_json::from_str::<Date>(r#""2024-03-01""#).unwrap(),
            date("2024-03-01"),
        );
        assert!(serde_json::from_str::<Date>(r#""2024-3-1""#).is_err());
    }
}
