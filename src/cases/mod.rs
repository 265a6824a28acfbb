//! Typed access to cumulative COVID-19 case counts.

mod rki;

pub use rki::{RkiArchive, RkiCaseTable};

use crate::error::CovmobError;
use chrono::NaiveDate;

/// First reporting date with a consistent RKI column layout.
pub fn default_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 6, 1).unwrap_or(NaiveDate::MIN)
}

/// Filter for a case count lookup. Both dates are inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Federal state, e.g. `Bayern`
    pub state: Option<String>,
    /// RKI age band, e.g. `A15-A34`
    pub age_group: Option<String>,
}

impl CaseQuery {
    /// All cases reported from 2020-06-01 up to and including `end`.
    pub fn until(end: NaiveDate) -> Self {
        Self {
            start: default_start(),
            end,
            state: None,
            age_group: None,
        }
    }

    pub fn from(mut self, start: NaiveDate) -> Self {
        self.start = start;
        self
    }

    pub fn state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn age_group(mut self, age_group: impl Into<String>) -> Self {
        self.age_group = Some(age_group.into());
        self
    }

    pub(crate) fn matches(&self, date: NaiveDate, state: &str, age_group: &str) -> bool {
        date >= self.start
            && date <= self.end
            && self.state.as_deref().is_none_or(|s| s == state)
            && self.age_group.as_deref().is_none_or(|a| a == age_group)
    }
}

/// Cumulative counts within a query window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaseCounts {
    pub infected: i64,
    pub recovered: i64,
    pub dead: i64,
}

impl CaseCounts {
    /// Cases neither recovered nor dead.
    pub fn currently_infected(&self) -> i64 {
        self.infected - self.recovered - self.dead
    }
}

/// A queryable source of case counts.
pub trait CaseSource {
    fn counts(&self, query: &CaseQuery) -> Result<CaseCounts, CovmobError>;

    fn currently_infected(&self, query: &CaseQuery) -> Result<i64, CovmobError> {
        Ok(self.counts(query)?.currently_infected())
    }
}
