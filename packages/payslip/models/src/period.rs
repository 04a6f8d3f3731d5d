//! Billing periods (`Janeiro/2023`) and their chronological order.
//!
//! A [`PeriodKey`] serializes as its display form so it can be used as a
//! JSON object key in reports.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter};

/// Calendar month, displayed with its Portuguese name.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter, AsRefStr,
)]
pub enum Month {
    #[strum(serialize = "Janeiro")]
    January = 1,
    #[strum(serialize = "Fevereiro")]
    February = 2,
    #[strum(serialize = "Março")]
    March = 3,
    #[strum(serialize = "Abril")]
    April = 4,
    #[strum(serialize = "Maio")]
    May = 5,
    #[strum(serialize = "Junho")]
    June = 6,
    #[strum(serialize = "Julho")]
    July = 7,
    #[strum(serialize = "Agosto")]
    August = 8,
    #[strum(serialize = "Setembro")]
    September = 9,
    #[strum(serialize = "Outubro")]
    October = 10,
    #[strum(serialize = "Novembro")]
    November = 11,
    #[strum(serialize = "Dezembro")]
    December = 12,
}

impl Month {
    /// Ordinal from 1 (January) to 12 (December).
    #[must_use]
    pub const fn number(self) -> u32 {
        self as u32
    }

    /// Looks a month up by its Portuguese name, case-insensitively.
    ///
    /// Accepts the full name (with or without the cedilla in `Março`) and
    /// the three-letter abbreviation, optionally followed by a dot
    /// (`jan`, `Fev.`, `MAR`).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let wanted = fold(name.trim().trim_end_matches('.'));
        if wanted.len() < 3 {
            return None;
        }
        Self::iter().find(|m| {
            let full = fold(m.as_ref());
            wanted == full || full.get(..3) == Some(wanted.as_str())
        })
    }

    /// The following month, and whether the year rolled over.
    #[must_use]
    pub const fn succ(self) -> (Self, bool) {
        match self {
            Self::January => (Self::February, false),
            Self::February => (Self::March, false),
            Self::March => (Self::April, false),
            Self::April => (Self::May, false),
            Self::May => (Self::June, false),
            Self::June => (Self::July, false),
            Self::July => (Self::August, false),
            Self::August => (Self::September, false),
            Self::September => (Self::October, false),
            Self::October => (Self::November, false),
            Self::November => (Self::December, false),
            Self::December => (Self::January, true),
        }
    }
}

fn fold(name: &str) -> String {
    name.chars()
        .flat_map(char::to_lowercase)
        .map(|c| if c == 'ç' { 'c' } else { c })
        .collect()
}

/// One month/year billing cycle.
///
/// Ordered by `(year, month)`; the field order below is what the derived
/// `Ord` relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeriodKey {
    pub year: i32,
    pub month: Month,
}

impl PeriodKey {
    #[must_use]
    pub const fn new(month: Month, year: i32) -> Self {
        Self { year, month }
    }

    /// The next calendar period.
    #[must_use]
    pub const fn next(self) -> Self {
        let (month, rolled) = self.month.succ();
        Self {
            year: if rolled { self.year + 1 } else { self.year },
            month,
        }
    }

    /// Numeric rendering, e.g. `01/2023`.
    #[must_use]
    pub fn numeric(&self) -> String {
        format!("{:02}/{}", self.month.number(), self.year)
    }

    /// Every period from `first` to `last`, both inclusive.
    ///
    /// Empty when `last` precedes `first`.
    #[must_use]
    pub fn range_inclusive(first: Self, last: Self) -> Vec<Self> {
        let mut out = Vec::new();
        let mut current = first;
        while current <= last {
            out.push(current);
            current = current.next();
        }
        out
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.month, self.year)
    }
}

/// Failure to parse a `Month/Year` string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid period '{0}', expected Month/Year")]
pub struct ParsePeriodError(pub String);

impl FromStr for PeriodKey {
    type Err = ParsePeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParsePeriodError(s.to_owned());
        let (month, year) = s.split_once('/').ok_or_else(err)?;
        let month = Month::from_name(month).ok_or_else(err)?;
        let year = year.trim().parse::<i32>().map_err(|_| err())?;
        Ok(Self::new(month, year))
    }
}

impl Serialize for PeriodKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PeriodKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_names_resolve_case_insensitively() {
        assert_eq!(Month::from_name("janeiro"), Some(Month::January));
        assert_eq!(Month::from_name("MARÇO"), Some(Month::March));
        assert_eq!(Month::from_name("Marco"), Some(Month::March));
        assert_eq!(Month::from_name("dez."), Some(Month::December));
        assert_eq!(Month::from_name("Set"), Some(Month::September));
        assert_eq!(Month::from_name("ja"), None);
        assert_eq!(Month::from_name("Janeir"), None);
    }

    #[test]
    fn orders_by_year_then_month() {
        let dec_2022 = PeriodKey::new(Month::December, 2022);
        let jan_2023 = PeriodKey::new(Month::January, 2023);
        let feb_2023 = PeriodKey::new(Month::February, 2023);
        assert!(dec_2022 < jan_2023);
        assert!(jan_2023 < feb_2023);
    }

    #[test]
    fn next_rolls_over_the_year() {
        let dec = PeriodKey::new(Month::December, 2022);
        assert_eq!(dec.next(), PeriodKey::new(Month::January, 2023));
    }

    #[test]
    fn range_covers_gap_months() {
        let range = PeriodKey::range_inclusive(
            PeriodKey::new(Month::November, 2022),
            PeriodKey::new(Month::February, 2023),
        );
        let labels: Vec<String> = range.iter().map(ToString::to_string).collect();
        assert_eq!(
            labels,
            ["Novembro/2022", "Dezembro/2022", "Janeiro/2023", "Fevereiro/2023"]
        );
    }

    #[test]
    fn renders_numeric_form() {
        assert_eq!(PeriodKey::new(Month::March, 2021).numeric(), "03/2021");
    }

    #[test]
    fn parses_and_serializes_as_string() {
        let key: PeriodKey = "Março/2021".parse().unwrap();
        assert_eq!(key, PeriodKey::new(Month::March, 2021));
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"Março/2021\"");
        assert!("2021".parse::<PeriodKey>().is_err());
    }
}
