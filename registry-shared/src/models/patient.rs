use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Timestamp;

/// Patient record as stored by the registry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub address: String,
    pub registration_number: String,
    pub birth_place: String,
    pub birth_day: Timestamp,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

/// Fields required to register a new patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewPatient {
    pub name: String,
    pub address: String,
    pub registration_number: String,
    pub birth_place: String,
    pub birth_day: Option<NaiveDate>,
}

/// Partial patient change.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PatientUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_place: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_day: Option<NaiveDate>,
}

impl PatientUpdate {
    /// `true` when no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.address.is_none()
            && self.registration_number.is_none()
            && self.birth_place.is_none()
            && self.birth_day.is_none()
    }
}

/// Page position reported by list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    #[serde(rename = "totalPatients", alias = "totalUsers", default)]
    pub total_items: u64,
    #[serde(rename = "patientsPerPage", alias = "usersPerPage", default)]
    pub per_page: u32,
    #[serde(default)]
    pub has_next_page: bool,
    #[serde(default)]
    pub has_prev_page: bool,
    #[serde(default)]
    pub next_page: Option<u32>,
    #[serde(default)]
    pub prev_page: Option<u32>,
}

/// Result counts for the current filter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PatientSummary {
    pub total_patients_in_database: u64,
    pub total_search_results: u64,
    pub showing_results: u64,
    pub is_filtered: bool,
}

/// One page of patients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatientPage {
    pub patients: Vec<Patient>,
    pub pagination: Pagination,
    #[serde(default)]
    pub summary: Option<PatientSummary>,
}

/// `data` payload carrying one patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatientPayload {
    pub patient: Patient,
}

/// How often an address occurs among patients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AddressCount {
    #[serde(rename = "_id")]
    pub address: String,
    pub count: u64,
}

/// Aggregates computed by the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PatientStatistics {
    #[serde(default)]
    pub average_age: f64,
    #[serde(default)]
    pub gender_distribution: BTreeMap<String, u64>,
    #[serde(default)]
    pub common_addresses: Vec<AddressCount>,
    #[serde(default)]
    pub registration_trends: BTreeMap<String, u64>,
    #[serde(default)]
    pub most_common_address: Option<String>,
}

/// `data` payload of `patients/total`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsReport {
    pub total_patients: u64,
    pub statistics: PatientStatistics,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_patient_page_deserializes() {
        let page: PatientPage = serde_json::from_value(json!({
            "patients": [{
                "_id": "p1",
                "name": "Budi",
                "address": "Jl. Merdeka 1",
                "registrationNumber": "01.02.03.04",
                "birthPlace": "Bandung",
                "birthDay": "1990-05-01T00:00:00.000Z",
                "createdAt": "2025-01-01T00:00:00.000Z",
                "updatedAt": "2025-01-01T00:00:00.000Z"
            }],
            "pagination": {
                "currentPage": 1,
                "totalPages": 3,
                "totalPatients": 25,
                "patientsPerPage": 10,
                "hasNextPage": true,
                "hasPrevPage": false,
                "nextPage": 2
            }
        }))
        .unwrap();

        assert_eq!(page.patients[0].registration_number, "01.02.03.04");
        assert_eq!(page.pagination.total_items, 25);
        assert_eq!(page.pagination.next_page, Some(2));
        assert!(page.summary.is_none());
    }

    #[test]
    fn test_user_pagination_alias() {
        let pagination: Pagination = serde_json::from_value(json!({
            "currentPage": 2,
            "totalPages": 2,
            "totalUsers": 12,
            "usersPerPage": 10
        }))
        .unwrap();
        assert_eq!(pagination.total_items, 12);
        assert_eq!(pagination.per_page, 10);
        assert!(!pagination.has_next_page);
    }

    #[test]
    fn test_new_patient_serializes_iso_date() {
        let patient = NewPatient {
            name: "Budi".to_string(),
            address: "Jl. Merdeka 1".to_string(),
            registration_number: "01.02.03.04".to_string(),
            birth_place: "Bandung".to_string(),
            birth_day: NaiveDate::from_ymd_opt(1990, 5, 1),
        };
        let value = serde_json::to_value(&patient).unwrap();
        assert_eq!(value["birthDay"], "1990-05-01");
        assert_eq!(value["registrationNumber"], "01.02.03.04");
    }

    #[test]
    fn test_patient_update_only_sends_changes() {
        let update = PatientUpdate {
            address: Some("Jl. Baru 2".to_string()),
            ..PatientUpdate::default()
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({ "address": "Jl. Baru 2" })
        );
        assert!(PatientUpdate::default().is_empty());
    }

    #[test]
    fn test_statistics_report() {
        let report: StatisticsReport = serde_json::from_value(json!({
            "totalPatients": 42,
            "statistics": {
                "averageAge": 33.5,
                "genderDistribution": {},
                "commonAddresses": [{ "_id": "Bandung", "count": 7 }],
                "registrationTrends": { "2025-01": 4 },
                "mostCommonAddress": "Bandung"
            }
        }))
        .unwrap();

        assert_eq!(report.total_patients, 42);
        assert_eq!(report.statistics.common_addresses[0].count, 7);
        assert_eq!(report.statistics.registration_trends["2025-01"], 4);
    }
}
