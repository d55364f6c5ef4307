//! Read-only summaries: statistics, calendar, dashboard.

use anyhow::{Result, bail};
use chrono::{Datelike, Local};
use registry_client::DashboardSummary;
use serde_json::json;

use super::{Context, output};

pub async fn statistics(ctx: &Context) -> Result<()> {
    ctx.require_session().await?;
    let report = ctx.call(|gateway| gateway.patient_statistics()).await?;
    if ctx.json {
        return output::print_json(&report);
    }
    output::print_statistics(&report);
    Ok(())
}

pub async fn calendar(
    ctx: &Context,
    month: Option<u32>,
    year: Option<i32>,
    until: Option<u32>,
) -> Result<()> {
    ctx.require_session().await?;

    if month.is_none() && year.is_none() {
        let current = ctx.call(|gateway| gateway.current_calendar()).await?;
        if ctx.json {
            return output::print_json(&current);
        }
        println!("{:04}-{:02}", current.current_year, current.current_month);
        output::print_calendar_days(
            current
                .calendar
                .iter()
                .filter(|day| day.month == current.current_month),
        );
        return Ok(());
    }

    let (month, year) = resolve_month(month, year)?;
    if let Some(end) = until {
        check_month(end)?;
        if end < month {
            bail!("--until must not be before --month");
        }
        let range = ctx
            .call(|gateway| gateway.calendar_range(year, month, end))
            .await?;
        if ctx.json {
            return output::print_json(&range);
        }
        for calendar in &range.calendars {
            println!("{} {}", calendar.month, calendar.year);
            output::print_calendar_days(calendar.month_days());
        }
        return Ok(());
    }

    let calendar = ctx.call(|gateway| gateway.calendar(month, year)).await?;
    if ctx.json {
        return output::print_json(&calendar);
    }
    println!("{} {}", calendar.month, calendar.year);
    output::print_calendar_days(calendar.month_days());
    Ok(())
}

pub async fn dashboard(ctx: &Context, month: Option<u32>, year: Option<i32>) -> Result<()> {
    let user = ctx.require_session().await?;
    let (month, year) = resolve_month(month, year)?;
    let summary = ctx
        .call(|gateway| DashboardSummary::load(gateway, month, year))
        .await?;

    if ctx.json {
        return output::print_json(&json!({
            "recentPatients": summary.recent_patients,
            "totalPatients": summary.total_patients,
            "statistics": summary.statistics,
            "month": summary.month,
            "year": summary.year,
            "calendar": summary.calendar_days,
        }));
    }

    println!("Welcome, {}", user.label());
    println!();
    println!("Total patients: {}", summary.total_patients);
    println!(
        "Registered in {:04}-{:02}: {}",
        summary.year,
        summary.month,
        summary.registrations_this_month()
    );
    if let Some(day) = summary.busiest_day() {
        println!(
            "Busiest day: {:04}-{:02}-{:02} ({} patients)",
            day.year,
            day.month,
            day.date,
            day.patients.len()
        );
    }
    println!();
    println!("Recent registrations:");
    if summary.recent_patients.is_empty() {
        println!("  none");
    }
    for patient in &summary.recent_patients {
        println!("  {}", output::patient_row(patient));
    }
    Ok(())
}

/// Fill in the current month/year for whatever was not given.
fn resolve_month(month: Option<u32>, year: Option<i32>) -> Result<(u32, i32)> {
    let today = Local::now().date_naive();
    let month = month.unwrap_or_else(|| today.month());
    check_month(month)?;
    Ok((month, year.unwrap_or_else(|| today.year())))
}

fn check_month(month: u32) -> Result<()> {
    if !(1..=12).contains(&month) {
        bail!("month must be between 1 and 12, got {month}");
    }
    Ok(())
}
