//! Plain-text rendering of API results.

use anyhow::Result;
use serde::Serialize;
use shared::models::{CalendarDay, Pagination, Patient, PatientPage, StatisticsReport, User};

/// Print `value` as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_user(user: &User) {
    println!("{} <{}>", user.label(), user.email);
    println!("  id:       {}", user.id);
    println!("  role:     {}", user.role);
    if let Some(verified) = user.is_verified {
        println!("  verified: {}", if verified { "yes" } else { "no" });
    }
    if let Some(avatar) = &user.avatar {
        println!("  avatar:   {}", avatar.url);
    }
    if let Some(created) = &user.created_at {
        println!("  joined:   {created}");
    }
}

pub fn print_patient(patient: &Patient) {
    println!("{} ({})", patient.name, patient.registration_number);
    println!("  id:          {}", patient.id);
    println!("  address:     {}", patient.address);
    println!(
        "  born:        {}, {}",
        patient.birth_place,
        patient.birth_day.0.format("%Y-%m-%d")
    );
    if let Some(created) = &patient.created_at {
        println!("  registered:  {created}");
    }
}

/// One line per patient.
pub fn patient_row(patient: &Patient) -> String {
    format!(
        "{:<14} {:<28} {:<30} {}",
        patient.registration_number,
        truncate(&patient.name, 28),
        truncate(&patient.address, 30),
        patient.id
    )
}

pub fn print_patient_page(page: &PatientPage) {
    if page.patients.is_empty() {
        println!("No patients found.");
    } else {
        println!("{:<14} {:<28} {:<30} ID", "REG. NUMBER", "NAME", "ADDRESS");
        for patient in &page.patients {
            println!("{}", patient_row(patient));
        }
    }
    println!("{}", pagination_line(&page.pagination));
    if let Some(summary) = &page.summary {
        if summary.is_filtered {
            println!(
                "{} of {} patients match",
                summary.total_search_results, summary.total_patients_in_database
            );
        }
    }
}

pub fn print_users(users: &[User], pagination: &Pagination) {
    println!("{:<26} {:<32} {:<6} NAME", "ID", "EMAIL", "ROLE");
    for user in users {
        println!(
            "{:<26} {:<32} {:<6} {}",
            user.id,
            truncate(&user.email, 32),
            user.role,
            user.name.as_deref().unwrap_or("-")
        );
    }
    println!("{}", pagination_line(pagination));
}

pub fn pagination_line(pagination: &Pagination) -> String {
    format!(
        "page {}/{} ({} total)",
        pagination.current_page,
        pagination.total_pages.max(1),
        pagination.total_items
    )
}

pub fn print_statistics(report: &StatisticsReport) {
    let stats = &report.statistics;
    println!("Total patients: {}", report.total_patients);
    println!("Average age:    {:.1}", stats.average_age);
    if let Some(address) = &stats.most_common_address {
        println!("Most common address: {address}");
    }
    if !stats.common_addresses.is_empty() {
        println!("Addresses:");
        for entry in &stats.common_addresses {
            println!("  {:<30} {}", truncate(&entry.address, 30), entry.count);
        }
    }
    if !stats.registration_trends.is_empty() {
        println!("Registrations:");
        for (period, count) in &stats.registration_trends {
            println!("  {period:<10} {count}");
        }
    }
}

/// Days that have registrations, one line each.
pub fn print_calendar_days<'a>(days: impl IntoIterator<Item = &'a CalendarDay>) {
    let mut any = false;
    for day in days {
        if day.patients.is_empty() {
            continue;
        }
        any = true;
        let names: Vec<&str> = day.patients.iter().map(|p| p.name.as_str()).collect();
        println!(
            "{:04}-{:02}-{:02}  {:>3}  {}",
            day.year,
            day.month,
            day.date,
            day.patients.len(),
            names.join(", ")
        );
    }
    if !any {
        println!("No registrations.");
    }
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        value.to_string()
    } else {
        let mut cut: String = value.chars().take(width.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("Budi", 10), "Budi");
        assert_eq!(truncate("Jalan Merdeka", 6), "Jalan…");
        assert_eq!(truncate("ÄÖÜäöü", 3), "ÄÖ…");
    }

    #[test]
    fn test_pagination_line() {
        let pagination: Pagination = serde_json::from_value(serde_json::json!({
            "currentPage": 2,
            "totalPages": 5,
            "totalPatients": 48
        }))
        .unwrap();
        assert_eq!(pagination_line(&pagination), "page 2/5 (48 total)");
    }
}
