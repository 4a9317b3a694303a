//! Rebalance frequency and schedule derivation.

use crate::domain::alignment::AlignedTable;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Calendar period whose last trading day triggers a rebalance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RebalanceFrequency {
    /// Monday to Sunday weeks.
    Weekly,
    #[default]
    Monthly,
    Quarterly,
    Annual,
}

impl RebalanceFrequency {
    pub fn code(&self) -> &'static str {
        match self {
            RebalanceFrequency::Weekly => "W",
            RebalanceFrequency::Monthly => "M",
            RebalanceFrequency::Quarterly => "Q",
            RebalanceFrequency::Annual => "A",
        }
    }

    fn period_key(&self, date: NaiveDate) -> (i32, u32) {
        match self {
            RebalanceFrequency::Weekly => {
                let week = date.iso_week();
                (week.year(), week.week())
            }
            RebalanceFrequency::Monthly => (date.year(), date.month()),
            RebalanceFrequency::Quarterly => (date.year(), (date.month() - 1) / 3),
            RebalanceFrequency::Annual => (date.year(), 0),
        }
    }
}

impl fmt::Display for RebalanceFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RebalanceFrequency::Weekly => "weekly",
            RebalanceFrequency::Monthly => "monthly",
            RebalanceFrequency::Quarterly => "quarterly",
            RebalanceFrequency::Annual => "annual",
        };
        f.write_str(name)
    }
}

impl FromStr for RebalanceFrequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "w" | "weekly" => Ok(RebalanceFrequency::Weekly),
            "m" | "monthly" => Ok(RebalanceFrequency::Monthly),
            "q" | "quarterly" => Ok(RebalanceFrequency::Quarterly),
            "a" | "y" | "annual" | "yearly" => Ok(RebalanceFrequency::Annual),
            other => Err(format!(
                "unknown rebalance frequency '{other}' (expected W, M, Q or A)"
            )),
        }
    }
}

/// The set of dates on which a scheduled rebalance happens.
///
/// Holds the last aligned trading day of every calendar period covered by
/// the table, so each member is a date of the table itself.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RebalanceSchedule {
    dates: BTreeSet<NaiveDate>,
}

impl RebalanceSchedule {
    pub fn derive(table: &AlignedTable, frequency: RebalanceFrequency) -> Self {
        Self::from_dates(table.dates(), frequency)
    }

    /// Derives the schedule from ascending trading dates.
    pub fn from_dates(
        dates: impl IntoIterator<Item = NaiveDate>,
        frequency: RebalanceFrequency,
    ) -> Self {
        let mut scheduled = BTreeSet::new();
        let mut last_in_period: Option<NaiveDate> = None;

        for date in dates {
            if let Some(prev) = last_in_period {
                if frequency.period_key(prev) != frequency.period_key(date) {
                    scheduled.insert(prev);
                }
            }
            last_in_period = Some(date);
        }
        if let Some(last) = last_in_period {
            scheduled.insert(last);
        }

        Self { dates: scheduled }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.dates.iter().copied()
    }
}
