//! Program blackout calendar.

use std::collections::BTreeSet;

use chrono::NaiveDate;

/// Predicate the scanner consults once per date before issuing any request.
pub trait BlackoutCheck {
    fn is_blackout(&self, date: NaiveDate) -> bool;
}

impl<F> BlackoutCheck for F
where
    F: Fn(NaiveDate) -> bool,
{
    fn is_blackout(&self, date: NaiveDate) -> bool {
        self(date)
    }
}

/// Fixed set of calendar dates on which the fare program does not apply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlackoutCalendar {
    dates: BTreeSet<NaiveDate>,
}

impl BlackoutCalendar {
    #[must_use]
    pub fn new(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            dates: dates.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

impl BlackoutCheck for BlackoutCalendar {
    fn is_blackout(&self, date: NaiveDate) -> bool {
        self.contains(date)
    }
}
