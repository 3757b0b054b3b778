//! Months as the menu site names them.

use std::fmt;

use chrono::{Datelike, NaiveDate};

static MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// The three letter abbreviation of a month, `None` outside of `1..=12`.
pub fn month_abbrev(month: u32) -> Option<&'static str> {
    let index = usize::try_from(month).ok()?.checked_sub(1)?;
    MONTHS.get(index).copied()
}

/// The page name of a school's menu for one month, e.g. `sre-jan-23`.
///
/// Changing this function is a breaking change, event ids are derived from it!
pub fn calendar_name(school: &str, month: u32, year: i32) -> Option<String> {
    let month = month_abbrev(month)?;
    let year = year.rem_euclid(100);
    Some(format!("{school}-{month}-{year:02}"))
}

/// A single month of a single year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        month_abbrev(month).map(|_| Self { year, month })
    }

    /// The period a date falls into.
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The following month, rolling over into January of the next year.
    pub fn next(self) -> Self {
        if self.month >= 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn abbrev(self) -> Option<&'static str> {
        month_abbrev(self.month)
    }

    pub fn calendar_name(self, school: &str) -> Option<String> {
        calendar_name(school, self.month, self.year)
    }

    /// The date of a day in this period, `None` if the day does not exist.
    pub fn date(self, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, day)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashSet, str::FromStr};

    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn test_month_abbrev() {
        assert_eq!(month_abbrev(1), Some("jan"));
        assert_eq!(month_abbrev(12), Some("dec"));
        assert_eq!(month_abbrev(0), None);
        assert_eq!(month_abbrev(13), None);
        let abbrevs: HashSet<&str> = (1..=12).filter_map(month_abbrev).collect();
        assert_eq!(abbrevs.len(), 12);
    }

    #[test]
    fn test_calendar_name() {
        assert_eq!(calendar_name("sre", 1, 2023).unwrap(), "sre-jan-23");
        assert_eq!(calendar_name("css", 10, 2009).unwrap(), "css-oct-09");
        assert_eq!(calendar_name("css", 13, 2009), None);
    }

    #[test]
    fn test_next() {
        let period = Period::new(2023, 1).unwrap();
        assert_eq!(period.next(), Period::new(2023, 2).unwrap());
        let period = Period::new(2023, 12).unwrap();
        assert_eq!(period.next(), Period::new(2024, 1).unwrap());
    }

    #[test]
    fn test_containing_and_date() {
        let period = Period::containing(NaiveDate::from_str("2024-02-15").unwrap());
        assert_eq!(period, Period::new(2024, 2).unwrap());
        assert_eq!(period.date(29), NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(period.date(30), None);
        assert_eq!(period.to_string(), "2024-02");
    }
}
