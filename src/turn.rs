//! Calendar-based turn clock.
//!
//! One turn is one week; four weeks make a month and twelve months a year.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const WEEKS_PER_MONTH: u8 = 4;
pub const MONTHS_PER_YEAR: u8 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

const MONTHS: [Month; MONTHS_PER_YEAR as usize] = [
    Month::January,
    Month::February,
    Month::March,
    Month::April,
    Month::May,
    Month::June,
    Month::July,
    Month::August,
    Month::September,
    Month::October,
    Month::November,
    Month::December,
];

impl Month {
    /// Zero-based index, January = 0.
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Month for a zero-based index; wraps past December.
    pub fn from_index(index: u8) -> Self {
        MONTHS[(index % MONTHS_PER_YEAR) as usize]
    }

    pub fn name(self) -> &'static str {
        match self {
            Month::January => "January",
            Month::February => "February",
            Month::March => "March",
            Month::April => "April",
            Month::May => "May",
            Month::June => "June",
            Month::July => "July",
            Month::August => "August",
            Month::September => "September",
            Month::October => "October",
            Month::November => "November",
            Month::December => "December",
        }
    }

    pub fn season(self) -> Season {
        match self {
            Month::December | Month::January | Month::February => Season::Winter,
            Month::March | Month::April | Month::May => Season::Spring,
            Month::June | Month::July | Month::August => Season::Summer,
            Month::September | Month::October | Month::November => Season::Autumn,
        }
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

impl Season {
    /// Seasons in which vegetation regrows.
    pub fn is_growing(self) -> bool {
        matches!(self, Season::Spring | Season::Summer)
    }
}

/// Immutable snapshot of "what turn is it".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnInfo {
    pub week: u8,
    pub month: Month,
    pub year: u32,
}

impl TurnInfo {
    pub fn season(&self) -> Season {
        self.month.season()
    }

    /// Turns elapsed since week 1 of January, year 1.
    /// Week 0 and year 0 are counted as week 1 and year 1.
    pub fn ordinal(&self) -> u64 {
        let years = u64::from(self.year.saturating_sub(1));
        let months = years * u64::from(MONTHS_PER_YEAR) + u64::from(self.month.index());
        months * u64::from(WEEKS_PER_MONTH) + u64::from(self.week.saturating_sub(1))
    }
}

impl Default for TurnInfo {
    fn default() -> Self {
        Self {
            week: 1,
            month: Month::January,
            year: 1,
        }
    }
}

impl fmt::Display for TurnInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "week {} of {}, year {}", self.week, self.month, self.year)
    }
}

/// Turn counter. Advancing never fails and has no side effects beyond the
/// counters; broadcasting the new turn is left to the caller.
#[derive(Debug, Clone)]
pub struct TurnClock {
    week: u8,
    month: u8,
    year: u32,
}

impl TurnClock {
    pub fn new() -> Self {
        Self::starting_at(TurnInfo::default())
    }

    pub fn starting_at(turn: TurnInfo) -> Self {
        debug_assert!(
            (1..=WEEKS_PER_MONTH).contains(&turn.week),
            "week out of range: {}",
            turn.week
        );
        debug_assert!(turn.year >= 1, "year out of range: {}", turn.year);
        Self {
            week: turn.week,
            month: turn.month.index(),
            year: turn.year,
        }
    }

    pub fn advance(&mut self) -> TurnInfo {
        self.week += 1;
        if self.week > WEEKS_PER_MONTH {
            self.week = 1;
            self.month += 1;
        }
        if self.month >= MONTHS_PER_YEAR {
            self.month = 0;
            self.year += 1;
        }
        self.current()
    }

    pub fn current(&self) -> TurnInfo {
        TurnInfo {
            week: self.week,
            month: Month::from_index(self.month),
            year: self.year,
        }
    }
}

impl Default for TurnClock {
    fn default() -> Self {
        Self::new()
    }
}
