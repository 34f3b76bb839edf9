use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use super::types::SimulationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, SimulationError> {
        if !(1..=12).contains(&month) {
            return Err(SimulationError::MonthOutOfRange(month));
        }
        Ok(Self { year, month })
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u32 {
        self.month
    }

    pub fn to_elapsed_months(self) -> i64 {
        self.year as i64 * 12 + self.month as i64
    }

    pub fn from_elapsed_months(elapsed: i64) -> Self {
        let year = (elapsed - 1).div_euclid(12);
        let month = (elapsed - 1).rem_euclid(12) + 1;
        Self {
            year: year as i32,
            month: month as u32,
        }
    }

    pub fn add_months(self, months: i32) -> Self {
        Self::from_elapsed_months(self.to_elapsed_months() + months as i64)
    }

    pub fn months_since(self, earlier: YearMonth) -> i64 {
        self.to_elapsed_months() - earlier.to_elapsed_months()
    }

    pub fn parse(s: &str) -> Result<Self, SimulationError> {
        let invalid = || SimulationError::InvalidYearMonth(s.to_string());
        let (year_part, month_part) = s.split_once('-').ok_or_else(invalid)?;
        if year_part.len() != 4
            || month_part.len() != 2
            || !year_part.bytes().all(|b| b.is_ascii_digit())
            || !month_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }
        let year = year_part.parse::<i32>().map_err(|_| invalid())?;
        let month = month_part.parse::<u32>().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }
        Ok(Self { year, month })
    }
}

// Birthday-passed rule: the birth month itself already counts toward the
// new age in its calendar year.
pub fn age_at(birth: YearMonth, at: YearMonth) -> i32 {
    let mut age = at.year - birth.year;
    if at.month < birth.month {
        age -= 1;
    }
    age
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
