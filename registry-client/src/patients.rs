//! Patient list queries and registration-number handling.
//!
//! The list view pages through patients ten at a time and can narrow the
//! listing by name, address, or initial letter. [`PatientLookup`] picks the
//! endpoint for each mode; [`PatientQuery`] turns the optional knobs of the
//! general listing into query pairs.
//!
//! Registration numbers look like `01.02.03.04`, `01.02.03.045`, optionally
//! followed by one capital letter. [`format_registration_number`] is the
//! as-you-type mask and [`is_valid_registration_number`] the final check.

use regex::Regex;
use shared::models::NewPatient;
use std::{fmt, str::FromStr, sync::LazyLock};

/// Rows per page in the patient list.
pub const PAGE_SIZE: u32 = 10;

static REGISTRATION_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{2}\.\d{2}\.\d{2}\.\d{2,3}[A-Z]?$").expect("registration number pattern")
});

/// Sort direction for the general listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("unknown sort order '{other}'")),
        }
    }
}

/// Parameters of `GET patients`. Unset fields are left out of the URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatientQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
}

impl PatientQuery {
    /// Query string pairs in a stable order.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        if let Some(sort_by) = &self.sort_by {
            pairs.push(("sortBy", sort_by.clone()));
        }
        if let Some(order) = self.sort_order {
            pairs.push(("sortOrder", order.as_str().to_string()));
        }
        pairs
    }

    /// Newest registrations first.
    #[must_use]
    pub fn recent(limit: u32) -> Self {
        Self {
            page: Some(1),
            limit: Some(limit),
            sort_by: Some("createdAt".to_string()),
            sort_order: Some(SortOrder::Desc),
            ..Self::default()
        }
    }
}

/// How the list view narrows the patient listing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PatientLookup {
    #[default]
    All,
    Name(String),
    Address(String),
    Alphabet(char),
}

/// Endpoint path plus query pairs for one page of a lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupRoute {
    pub path: &'static str,
    pub params: Vec<(&'static str, String)>,
}

impl PatientLookup {
    /// Route for `page`. Blank name/address searches fall back to the full
    /// listing ordered by registration number.
    #[must_use]
    pub fn route(&self, page: u32, limit: u32) -> LookupRoute {
        let paging = [("page", page.to_string()), ("limit", limit.to_string())];
        match self {
            Self::Name(name) if !name.trim().is_empty() => LookupRoute {
                path: "patients/search/name",
                params: with_paging(("name", name.trim().to_string()), paging),
            },
            Self::Address(address) if !address.trim().is_empty() => LookupRoute {
                path: "patients/search/address",
                params: with_paging(("address", address.trim().to_string()), paging),
            },
            Self::Alphabet(letter) => LookupRoute {
                path: "patients/search/alphabet",
                params: with_paging(("letter", letter.to_string()), paging),
            },
            _ => LookupRoute {
                path: "patients",
                params: PatientQuery {
                    page: Some(page),
                    limit: Some(limit),
                    sort_by: Some("registrationNumber".to_string()),
                    sort_order: Some(SortOrder::Asc),
                    ..PatientQuery::default()
                }
                .to_pairs(),
            },
        }
    }
}

fn with_paging(
    first: (&'static str, String),
    paging: [(&'static str, String); 2],
) -> Vec<(&'static str, String)> {
    let mut params = vec![first];
    params.extend(paging);
    params
}

/// Mask free-form input into the registration number layout.
///
/// Keeps at most nine digits and the first capital letter. Up to eight
/// digits are grouped in pairs; a ninth digit joins the last group. The
/// letter, if any, is appended at the end.
#[must_use]
pub fn format_registration_number(value: &str) -> String {
    let letter = value.chars().find(char::is_ascii_uppercase);
    let digits: Vec<char> = value.chars().filter(char::is_ascii_digit).take(9).collect();

    let groups: Vec<String> = if digits.len() <= 8 {
        digits.chunks(2).map(|pair| pair.iter().collect()).collect()
    } else {
        [&digits[0..2], &digits[2..4], &digits[4..6], &digits[6..9]]
            .iter()
            .map(|group| group.iter().collect())
            .collect()
    };

    let mut formatted = groups.join(".");
    if let Some(letter) = letter {
        formatted.push(letter);
    }
    formatted
}

/// `true` for `XX.XX.XX.XX` or `XX.XX.XX.XXX`, optionally with a capital
/// letter suffix.
#[must_use]
pub fn is_valid_registration_number(value: &str) -> bool {
    REGISTRATION_NUMBER.is_match(value)
}

/// Every problem with a new-patient form, in field order.
#[must_use]
pub fn validate_new_patient(patient: &NewPatient) -> Vec<String> {
    let mut errors = Vec::new();
    if patient.name.trim().is_empty() {
        errors.push("Name is required".to_string());
    }
    if patient.address.trim().is_empty() {
        errors.push("Address is required".to_string());
    }
    if patient.registration_number.trim().is_empty() {
        errors.push("Registration number is required".to_string());
    }
    if patient.birth_place.trim().is_empty() {
        errors.push("Birth place is required".to_string());
    }
    if patient.birth_day.is_none() {
        errors.push("Birth date is required".to_string());
    }
    if !patient.registration_number.is_empty()
        && !is_valid_registration_number(&patient.registration_number)
    {
        errors.push(
            "Registration number must look like XX.XX.XX.XX, XX.XX.XX.XXX, XX.XX.XX.XX[A-Z] or XX.XX.XX.XXX[A-Z]"
                .to_string(),
        );
    }
    errors
}
