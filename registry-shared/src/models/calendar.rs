use serde::{Deserialize, Serialize};

use super::Patient;

/// One cell of a month grid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDay {
    pub date: u32,
    pub month: u32,
    pub year: i32,
    pub is_current_month: bool,
    #[serde(default)]
    pub patients: Vec<Patient>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CalendarWeek {
    #[serde(default)]
    pub days: Vec<CalendarDay>,
}

/// A month grid as returned by `calendar?month=&year=`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CalendarData {
    pub month: String,
    pub year: i32,
    pub month_number: u32,
    #[serde(default)]
    pub weeks: Vec<CalendarWeek>,
}

impl CalendarData {
    /// All cells of the grid, week by week.
    pub fn days(&self) -> impl Iterator<Item = &CalendarDay> {
        self.weeks.iter().flat_map(|week| week.days.iter())
    }

    /// Cells belonging to the month itself, skipping leading/trailing padding.
    pub fn month_days(&self) -> impl Iterator<Item = &CalendarDay> {
        self.days().filter(|day| day.is_current_month)
    }
}

/// `calendar/current` payload: a flat list of days.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CurrentCalendar {
    pub calendar: Vec<CalendarDay>,
    pub current_month: u32,
    pub current_year: i32,
}

/// `calendar/multiple` payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MultiMonthCalendar {
    pub calendars: Vec<CalendarData>,
    pub year: i32,
    pub start_month: u32,
    pub end_month: u32,
}
