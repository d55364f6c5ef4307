//! Patient, calendar, and account endpoints outside the session contract.

use reqwest::multipart::{Form, Part};
use shared::models::{
    ApiResponse, CalendarData, CurrentCalendar, MultiMonthCalendar, NewPatient, PasswordUpdate,
    Patient, PatientPage, PatientPayload, PatientUpdate, RoleUpdate, StatisticsReport, UserPage,
};

use super::{HttpGateway, fallback, http::CallKind};
use crate::{
    error::GatewayError,
    patients::{PatientLookup, PatientQuery},
};

const EXCEL_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

impl HttpGateway {
    async fn get_data<T: serde::de::DeserializeOwned>(
        &self,
        url: url::Url,
        params: &[(&'static str, String)],
        fallback: &str,
    ) -> Result<T, GatewayError> {
        let body: ApiResponse<T> = self
            .call(
                self.client().get(url).query(params),
                CallKind::Standard,
                fallback,
            )
            .await?;
        Ok(body.into_data(fallback)?)
    }

    /// List patients with optional paging, search, and sorting.
    pub async fn list_patients(&self, query: &PatientQuery) -> Result<PatientPage, GatewayError> {
        let url = self.api_url("patients")?;
        self.get_data(url, &query.to_pairs(), fallback::PATIENTS)
            .await
    }

    /// One page of the list view for `lookup`.
    pub async fn lookup_patients(
        &self,
        lookup: &PatientLookup,
        page: u32,
        limit: u32,
    ) -> Result<PatientPage, GatewayError> {
        let route = lookup.route(page, limit);
        let url = self.api_url(route.path)?;
        self.get_data(url, &route.params, fallback::PATIENTS).await
    }

    /// Free-text search across patient fields.
    pub async fn search_patients(
        &self,
        search: Option<&str>,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> Result<PatientPage, GatewayError> {
        let url = self.api_url("patients/search")?;
        let query = PatientQuery {
            page,
            limit,
            search: search.map(str::to_string),
            ..PatientQuery::default()
        };
        self.get_data(url, &query.to_pairs(), fallback::PATIENTS)
            .await
    }

    pub async fn search_patients_by_name(
        &self,
        name: &str,
        page: u32,
        limit: u32,
    ) -> Result<PatientPage, GatewayError> {
        let url = self.api_url("patients/search/name")?;
        let params = [
            ("name", name.to_string()),
            ("page", page.to_string()),
            ("limit", limit.to_string()),
        ];
        self.get_data(url, &params, fallback::PATIENTS).await
    }

    pub async fn search_patients_by_address(
        &self,
        address: &str,
        page: u32,
        limit: u32,
    ) -> Result<PatientPage, GatewayError> {
        let url = self.api_url("patients/search/address")?;
        let params = [
            ("address", address.to_string()),
            ("page", page.to_string()),
            ("limit", limit.to_string()),
        ];
        self.get_data(url, &params, fallback::PATIENTS).await
    }

    /// Patients whose name starts with `letter`.
    pub async fn patients_by_alphabet(
        &self,
        letter: char,
        page: u32,
        limit: u32,
    ) -> Result<PatientPage, GatewayError> {
        self.lookup_patients(&PatientLookup::Alphabet(letter), page, limit)
            .await
    }

    pub async fn get_patient(&self, id: &str) -> Result<Patient, GatewayError> {
        let url = self.api_url_with("patients", id)?;
        let payload: PatientPayload = self.get_data(url, &[], fallback::PATIENTS).await?;
        Ok(payload.patient)
    }

    pub async fn create_patient(&self, patient: &NewPatient) -> Result<Patient, GatewayError> {
        let url = self.api_url("patients/create")?;
        let body: ApiResponse<PatientPayload> = self
            .call(
                self.client().post(url).json(patient),
                CallKind::Standard,
                fallback::REQUEST,
            )
            .await?;
        Ok(body.into_data(fallback::REQUEST)?.patient)
    }

    pub async fn update_patient(
        &self,
        id: &str,
        update: &PatientUpdate,
    ) -> Result<Patient, GatewayError> {
        let url = self.api_url_with("patients", id)?;
        let body: ApiResponse<PatientPayload> = self
            .call(
                self.client().put(url).json(update),
                CallKind::Standard,
                fallback::REQUEST,
            )
            .await?;
        Ok(body.into_data(fallback::REQUEST)?.patient)
    }

    pub async fn delete_patient(&self, id: &str) -> Result<(), GatewayError> {
        let url = self.api_url_with("patients", id)?;
        let body: ApiResponse<serde_json::Value> = self
            .call(self.client().delete(url), CallKind::Standard, fallback::REQUEST)
            .await?;
        Ok(body.into_ack(fallback::REQUEST)?)
    }

    /// Totals and aggregates for the dashboard.
    pub async fn patient_statistics(&self) -> Result<StatisticsReport, GatewayError> {
        let url = self.api_url("patients/total")?;
        self.get_data(url, &[], fallback::PATIENTS).await
    }

    /// Every patient as an Excel workbook.
    pub async fn export_patients(&self) -> Result<Vec<u8>, GatewayError> {
        let url = self.api_url("patients/excel/export")?;
        self.call_bytes(self.client().get(url), fallback::EXPORT)
            .await
    }

    /// Empty workbook with the import columns.
    pub async fn download_template(&self) -> Result<Vec<u8>, GatewayError> {
        let url = self.api_url("patients/excel/template")?;
        self.call_bytes(self.client().get(url), fallback::TEMPLATE)
            .await
    }

    /// Upload a workbook of patients; returns the server's summary message.
    pub async fn import_patients(
        &self,
        file_name: &str,
        contents: Vec<u8>,
    ) -> Result<String, GatewayError> {
        let url = self.api_url("patients/excel/import")?;
        let part = Part::bytes(contents)
            .file_name(file_name.to_string())
            .mime_str(EXCEL_MIME)
            .map_err(|err| GatewayError::Request(err.to_string()))?;
        let form = Form::new().part("excelFile", part);
        let body: ApiResponse<serde_json::Value> = self
            .call(
                self.client().post(url).multipart(form),
                CallKind::Standard,
                fallback::IMPORT,
            )
            .await?;
        let message = body.message.clone();
        body.into_ack(fallback::IMPORT)?;
        Ok(message.unwrap_or_else(|| "Import completed".to_string()))
    }

    pub async fn current_calendar(&self) -> Result<CurrentCalendar, GatewayError> {
        let url = self.api_url("calendar/current")?;
        self.get_data(url, &[], fallback::REQUEST).await
    }

    /// Month grid for `month` (1-12) of `year`.
    pub async fn calendar(&self, month: u32, year: i32) -> Result<CalendarData, GatewayError> {
        let url = self.api_url("calendar")?;
        let params = [("month", month.to_string()), ("year", year.to_string())];
        self.get_data(url, &params, fallback::REQUEST).await
    }

    /// Month grids from `start_month` through `end_month` of `year`.
    pub async fn calendar_range(
        &self,
        year: i32,
        start_month: u32,
        end_month: u32,
    ) -> Result<MultiMonthCalendar, GatewayError> {
        let url = self.api_url("calendar/multiple")?;
        let params = [
            ("year", year.to_string()),
            ("startMonth", start_month.to_string()),
            ("endMonth", end_month.to_string()),
        ];
        self.get_data(url, &params, fallback::REQUEST).await
    }

    pub async fn update_password(&self, update: &PasswordUpdate) -> Result<(), GatewayError> {
        let url = self.api_url("users/update-password")?;
        let body: ApiResponse<serde_json::Value> = self
            .call(
                self.client().put(url).json(update),
                CallKind::Standard,
                fallback::PASSWORD_UPDATE,
            )
            .await?;
        Ok(body.into_ack(fallback::PASSWORD_UPDATE)?)
    }

    /// Admin only: every account, paged.
    pub async fn all_users(&self, page: u32, limit: u32) -> Result<UserPage, GatewayError> {
        let url = self.api_url("users/all-users")?;
        let params = [("page", page.to_string()), ("limit", limit.to_string())];
        self.get_data(url, &params, fallback::REQUEST).await
    }

    /// Admin only.
    pub async fn delete_user(&self, id: &str) -> Result<(), GatewayError> {
        let url = self.api_url_with("users/delete", id)?;
        let body: ApiResponse<serde_json::Value> = self
            .call(self.client().delete(url), CallKind::Standard, fallback::REQUEST)
            .await?;
        Ok(body.into_ack(fallback::REQUEST)?)
    }

    /// Admin only.
    pub async fn update_user_role(&self, update: &RoleUpdate) -> Result<(), GatewayError> {
        let url = self.api_url("users/update-role")?;
        let body: ApiResponse<serde_json::Value> = self
            .call(
                self.client().put(url).json(update),
                CallKind::Standard,
                fallback::REQUEST,
            )
            .await?;
        Ok(body.into_ack(fallback::REQUEST)?)
    }
}
