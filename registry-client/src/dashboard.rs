//! Dashboard overview: latest registrations, totals, and the month at a glance.

use shared::models::{CalendarDay, Patient, PatientStatistics};
use tracing::debug;

use crate::{error::GatewayError, gateway::HttpGateway, patients::PatientQuery};

/// How many recent registrations the dashboard lists.
pub const RECENT_PATIENTS: u32 = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSummary {
    /// Newest registrations first.
    pub recent_patients: Vec<Patient>,
    pub total_patients: u64,
    pub statistics: PatientStatistics,
    pub month: u32,
    pub year: i32,
    /// Days of the month itself, without the grid padding.
    pub calendar_days: Vec<CalendarDay>,
}

impl DashboardSummary {
    /// Fetch the three dashboard sources concurrently.
    ///
    /// # Errors
    /// Fails if any of the three requests fails.
    pub async fn load(gateway: &HttpGateway, month: u32, year: i32) -> Result<Self, GatewayError> {
        let recent = PatientQuery::recent(RECENT_PATIENTS);
        let (page, report, calendar) = tokio::try_join!(
            gateway.list_patients(&recent),
            gateway.patient_statistics(),
            gateway.calendar(month, year),
        )?;
        debug!(
            recent = page.patients.len(),
            total = report.total_patients,
            "dashboard loaded"
        );

        Ok(Self {
            recent_patients: page.patients,
            total_patients: report.total_patients,
            statistics: report.statistics,
            month: calendar.month_number,
            year: calendar.year,
            calendar_days: calendar.month_days().cloned().collect(),
        })
    }

    /// Registrations recorded on the month's days.
    #[must_use]
    pub fn registrations_this_month(&self) -> usize {
        self.calendar_days.iter().map(|day| day.patients.len()).sum()
    }

    /// Day of the month with the most registrations, earliest on ties.
    #[must_use]
    pub fn busiest_day(&self) -> Option<&CalendarDay> {
        self.calendar_days
            .iter()
            .filter(|day| !day.patients.is_empty())
            .fold(None, |best: Option<&CalendarDay>, day| match best {
                Some(best) if best.patients.len() >= day.patients.len() => Some(best),
                _ => Some(day),
            })
    }
}
