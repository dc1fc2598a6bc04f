//! Evaluation cycles (e.g. a quarter or half-year).

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::types::{Date, EntityId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cycle {
    pub id: EntityId,
    pub name: String,
    pub start_date: Date,
    pub end_date: Date,
    #[serde(default)]
    pub is_active: bool,
}

/// A calendar month, used for monthly series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(date: Date) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn next(self) -> Self {
        if self.month == 12 {
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

    /// First day of the month, or `None` for an out-of-range month value.
    pub fn first_day(self) -> Option<Date> {
        Date::from_ymd_opt(self.year, self.month, 1)
    }

    /// First day of the following month.
    pub fn first_day_of_next(self) -> Option<Date> {
        self.next().first_day()
    }

    /// Short label such as `"Mar 2026"`.
    pub fn label(self) -> String {
        match self.first_day() {
            Some(d) => d.format("%b %Y").to_string(),
            None => format!("{:04}-{:02}", self.year, self.month),
        }
    }
}

impl Cycle {
    pub fn contains(&self, date: Date) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// Calendar months spanned by the cycle, in order.
    pub fn months(&self) -> Vec<YearMonth> {
        let last = YearMonth::of(self.end_date);
        let mut current = YearMonth::of(self.start_date);
        let mut months = Vec::new();
        while current <= last {
            months.push(current);
            current = current.next();
        }
        months
    }
}

/// The active cycle. The data model does not enforce uniqueness, so when
/// several cycles are flagged active the one starting latest wins.
pub fn active_cycle(cycles: &[Cycle]) -> Option<&Cycle> {
    cycles
        .iter()
        .filter(|c| c.is_active)
        .max_by_key(|c| c.start_date)
}
