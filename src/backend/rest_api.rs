use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::backend::report::{ReportFilter, ReportRow};
use crate::schedule::{AppointmentUpdate, NewAppointment, Professional, ProfessionalId, RawAppointment, WeekWindow};
use crate::storage::config::{Config, TablesConfig};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Request error: {0}")]
    RequestError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Rate limit exceeded")]
    RateLimited,
    #[error("Authentication failed")]
    AuthenticationFailed,
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Client configuration error: {0}")]
    Config(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

impl From<&WeekWindow> for DateRange {
    fn from(window: &WeekWindow) -> Self {
        Self::new(window.start(), window.end())
    }
}

pub(crate) fn iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AppointmentSource: Send + Sync {
    async fn fetch_appointments(
        &self,
        professional_id: ProfessionalId,
        range: Option<DateRange>,
    ) -> Result<Vec<RawAppointment>, ApiError>;

    async fn create_appointment(&self, appointment: &NewAppointment) -> Result<RawAppointment, ApiError>;

    async fn update_appointment(&self, update: &AppointmentUpdate) -> Result<RawAppointment, ApiError>;

    async fn cancel_appointment(
        &self,
        appointment_id: i64,
        cancelled_at: DateTime<Utc>,
    ) -> Result<RawAppointment, ApiError>;

    async fn fetch_report(&self, filter: &ReportFilter) -> Result<Vec<ReportRow>, ApiError>;

    async fn fetch_professionals(&self) -> Result<Vec<Professional>, ApiError>;
}

pub struct RestBackendClient {
    base_url: String,
    api_key: String,
    tables: TablesConfig,
    client: reqwest::Client,
}

impl RestBackendClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            base_url,
            api_key,
            tables: Config::default().tables,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.backend.request_timeout_seconds))
            .build()
            .map_err(|e| ApiError::Config(e.to_string()))?;

        Ok(Self {
            base_url: config.backend.url.clone(),
            api_key: config.backend.api_key.clone(),
            tables: config.tables.clone(),
            client,
        })
    }

    pub fn with_tables(mut self, tables: TablesConfig) -> Self {
        self.tables = tables;
        self
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url.trim_end_matches('/'), table)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn checked(response: Response, subject: &str) -> Result<Response, ApiError> {
        let status = response.status();
        tracing::debug!("Response status for {}: {}", subject, status);

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            tracing::error!("Authentication failed for {}", subject);
            return Err(ApiError::AuthenticationFailed);
        }

        if status == StatusCode::NOT_FOUND {
            tracing::error!("Not found: {}", subject);
            return Err(ApiError::NotFound(subject.to_string()));
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!("Rate limit exceeded");
            return Err(ApiError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await?;
            tracing::error!("Request for {} failed. Status: {}, Body: {}", subject, status, body);
            return Err(ApiError::RequestError(format!("Status {}: {}", status, body)));
        }

        Ok(response)
    }

    async fn rows<T: DeserializeOwned>(response: Response) -> Result<Vec<T>, ApiError> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ApiError::ParseError(e.to_string()))
    }

    async fn single_row(response: Response, subject: &str) -> Result<RawAppointment, ApiError> {
        Self::rows::<RawAppointment>(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::NotFound(subject.to_string()))
    }

    async fn patch_appointment(
        &self,
        appointment_id: i64,
        body: &serde_json::Value,
    ) -> Result<RawAppointment, ApiError> {
        let subject = format!("appointment {}", appointment_id);
        let id_filter = format!("eq.{}", appointment_id);

        let response = self
            .authorized(self.client.patch(self.table_url(&self.tables.appointments)))
            .header("Prefer", "return=representation")
            .query(&[("id", id_filter.as_str())])
            .json(body)
            .send()
            .await?;

        let response = Self::checked(response, &subject).await?;
        Self::single_row(response, &subject).await
    }
}

#[async_trait]
impl AppointmentSource for RestBackendClient {
    async fn fetch_appointments(
        &self,
        professional_id: ProfessionalId,
        range: Option<DateRange>,
    ) -> Result<Vec<RawAppointment>, ApiError> {
        let mut query = vec![
            ("select".to_string(), "*".to_string()),
            ("profissional_id".to_string(), format!("eq.{}", professional_id)),
            ("cancelado".to_string(), "eq.false".to_string()),
        ];
        if let Some(range) = range {
            query.push(("data".to_string(), format!("gte.{}", iso_date(range.start))));
            query.push(("data".to_string(), format!("lte.{}", iso_date(range.end))));
        }
        query.push(("order".to_string(), "data.asc,hora_inicio.asc".to_string()));

        tracing::info!("Fetching appointments for professional {} ({:?})", professional_id, range);

        let response = self
            .authorized(self.client.get(self.table_url(&self.tables.appointments)))
            .query(&query)
            .send()
            .await?;

        let subject = format!("appointments of professional {}", professional_id);
        let response = Self::checked(response, &subject).await?;
        let rows: Vec<RawAppointment> = Self::rows(response).await?;

        tracing::info!("Fetched {} appointments successfully", rows.len());
        Ok(rows)
    }

    async fn create_appointment(&self, appointment: &NewAppointment) -> Result<RawAppointment, ApiError> {
        tracing::info!(
            "Creating appointment '{}' on {} for professional {}",
            appointment.title,
            appointment.date,
            appointment.professional_id
        );
        tracing::debug!("POST payload: {:?}", appointment);

        let response = self
            .authorized(self.client.post(self.table_url(&self.tables.appointments)))
            .header("Prefer", "return=representation")
            .json(appointment)
            .send()
            .await?;

        let response = Self::checked(response, "new appointment").await?;
        let created = Self::rows::<RawAppointment>(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::RequestError("Insert returned no rows".to_string()))?;

        tracing::info!("Appointment created with ID {}", created.id);
        Ok(created)
    }

    async fn update_appointment(&self, update: &AppointmentUpdate) -> Result<RawAppointment, ApiError> {
        if update.id <= 0 {
            return Err(ApiError::RequestError("Appointment id is required".to_string()));
        }
        let update = update.trimmed();
        if update.is_empty() {
            return Err(ApiError::RequestError(format!("Nothing to update on appointment {}", update.id)));
        }

        tracing::info!("Updating appointment {}", update.id);
        let body = serde_json::to_value(&update).map_err(|e| ApiError::ParseError(e.to_string()))?;
        self.patch_appointment(update.id, &body).await
    }

    async fn cancel_appointment(
        &self,
        appointment_id: i64,
        cancelled_at: DateTime<Utc>,
    ) -> Result<RawAppointment, ApiError> {
        tracing::info!("Cancelling appointment {}", appointment_id);
        let body = serde_json::json!({
            "cancelado": true,
            "cancelado_as": cancelled_at.to_rfc3339(),
        });
        self.patch_appointment(appointment_id, &body).await
    }

    async fn fetch_report(&self, filter: &ReportFilter) -> Result<Vec<ReportRow>, ApiError> {
        tracing::info!("Fetching appointments report with {:?}", filter);

        let response = self
            .authorized(self.client.get(self.table_url(&self.tables.appointments_report)))
            .query(&filter.query_pairs())
            .send()
            .await?;

        let response = Self::checked(response, "appointments report").await?;
        let rows: Vec<ReportRow> = Self::rows(response).await?;

        tracing::info!("Report returned {} rows", rows.len());
        Ok(rows)
    }

    async fn fetch_professionals(&self) -> Result<Vec<Professional>, ApiError> {
        let rpc = &self.tables.professionals_rpc;
        tracing::info!("Calling RPC {}", rpc);

        let response = self
            .authorized(self.client.post(self.table_url(&format!("rpc/{}", rpc))))
            .json(&serde_json::json!({}))
            .send()
            .await?;

        let response = Self::checked(response, "professionals").await?;
        let professionals: Vec<Professional> = Self::rows(response).await?;

        tracing::info!("Fetched {} professionals", professionals.len());
        Ok(professionals)
    }
}
