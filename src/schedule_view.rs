use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::app::{FetchStatus, ScheduleState};
use crate::backend::{ApiError, AppointmentSource, DateRange};
use crate::schedule::draft::DEFAULT_ZONE_SUFFIX;
use crate::schedule::{
    Appointment, AppointmentDraft, AppointmentFormatter, AppointmentUpdate, DraftIssue, FormatIssue,
    ProfessionalId, RawAppointment, WeekWindow,
};
use crate::storage::{CacheKey, Config};

pub const FETCH_ERROR_MESSAGE: &str = "Erro ao carregar agendamentos";

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("Failed to reach backend: {0}")]
    Backend(#[from] ApiError),
    #[error("Invalid appointment: {}", describe_issues(.0))]
    InvalidDraft(Vec<DraftIssue>),
}

fn describe_issues(issues: &[DraftIssue]) -> String {
    issues
        .iter()
        .map(|issue| issue.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Default)]
struct KeyGeneration {
    current: u64,
    in_flight: usize,
}

#[derive(Debug)]
struct Inner {
    state: ScheduleState,
    // Only the newest request may publish appointments or status.
    view_generation: u64,
    // Only keys with a remote fetch in flight have an entry. Only the newest
    // fetch for a key, not overtaken by invalidation, may write the cache.
    key_generations: HashMap<CacheKey, KeyGeneration>,
}

impl Inner {
    fn begin_fetch(&mut self, key: CacheKey) -> u64 {
        let generation = self.key_generations.entry(key).or_default();
        generation.current += 1;
        generation.in_flight += 1;
        generation.current
    }

    fn finish_fetch(&mut self, key: CacheKey, fetched: u64) -> bool {
        let Some(generation) = self.key_generations.get_mut(&key) else {
            return false;
        };
        let is_current = generation.current == fetched;
        generation.in_flight = generation.in_flight.saturating_sub(1);
        if generation.in_flight == 0 {
            self.key_generations.remove(&key);
        }
        is_current
    }

    fn invalidate(&mut self, professional_id: Option<ProfessionalId>) {
        self.state.cache.invalidate(professional_id);
        self.key_generations.retain(|_, generation| generation.in_flight > 0);
        for (key, generation) in self.key_generations.iter_mut() {
            if professional_id.is_none_or(|id| key.professional_id == id) {
                generation.current += 1;
            }
        }
    }
}

pub struct ScheduleView {
    source: Arc<dyn AppointmentSource>,
    formatter: AppointmentFormatter,
    zone_suffix: String,
    inner: Mutex<Inner>,
}

impl ScheduleView {
    pub fn new(source: Arc<dyn AppointmentSource>) -> Self {
        Self::with_state(source, ScheduleState::new())
    }

    pub fn with_state(source: Arc<dyn AppointmentSource>, state: ScheduleState) -> Self {
        Self {
            source,
            formatter: AppointmentFormatter::default(),
            zone_suffix: DEFAULT_ZONE_SUFFIX.to_string(),
            inner: Mutex::new(Inner {
                state,
                view_generation: 0,
                key_generations: HashMap::new(),
            }),
        }
    }

    pub fn from_config(source: Arc<dyn AppointmentSource>, config: &Config) -> Self {
        let mut view = Self::new(source);
        view.formatter = AppointmentFormatter::new(config.display.format_defaults());
        view.zone_suffix = config.display.time_zone_suffix.clone();
        view
    }

    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.inner.get_mut().state.reference_date = date;
        self
    }

    pub fn with_formatter(mut self, formatter: AppointmentFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    fn now() -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn report_issues(issues: &[FormatIssue]) {
        for issue in issues {
            tracing::warn!("Appointment {} formatted with fallback: {}", issue.appointment_id, issue.error);
        }
    }

    fn format_rows(&self, rows: &[RawAppointment]) -> Vec<Appointment> {
        let outcome = self.formatter.format(rows, Self::now());
        Self::report_issues(&outcome.issues);
        outcome.appointments
    }

    /// Returns the appointments of `professional_id` between the first and
    /// last of the seven `days`, inclusive.
    ///
    /// A zero professional id or a list that is not seven days long yields
    /// an empty list without touching the backend. Unless `force_refresh` is
    /// set, a cached week is returned without a remote call.
    pub async fn fetch_week(
        &self,
        professional_id: ProfessionalId,
        days: &[NaiveDate],
        force_refresh: bool,
    ) -> Result<Vec<Appointment>, ViewError> {
        if professional_id == 0 {
            tracing::debug!("Ignoring week fetch without a professional");
            return Ok(Vec::new());
        }
        let Some(window) = WeekWindow::from_days(days) else {
            tracing::debug!("Ignoring week fetch over {} days", days.len());
            return Ok(Vec::new());
        };
        let key = CacheKey::new(professional_id, &window);

        let (view_generation, key_generation) = {
            let mut inner = self.inner.lock().await;
            inner.view_generation += 1;

            if !force_refresh {
                let cached = inner.state.cache.get(professional_id, &window).map(<[_]>::to_vec);
                if let Some(cached) = cached {
                    tracing::info!("Cache hit for {}", key);
                    inner.state.appointments = cached.clone();
                    inner.state.status = FetchStatus::Idle;
                    return Ok(cached);
                }
            }

            inner.state.status = FetchStatus::Loading;
            (inner.view_generation, inner.begin_fetch(key))
        };

        tracing::info!("Fetching {} from backend", key);
        let result = self
            .source
            .fetch_appointments(professional_id, Some(DateRange::from(&window)))
            .await;

        let mut inner = self.inner.lock().await;
        let publishes = inner.view_generation == view_generation;
        let writes_cache = inner.finish_fetch(key, key_generation);

        match result {
            Ok(rows) => {
                let appointments = self.format_rows(&rows);

                if writes_cache {
                    inner.state.cache.put(professional_id, &window, appointments.clone());
                } else {
                    tracing::debug!("Discarding superseded result for {}", key);
                }
                if publishes {
                    inner.state.appointments = appointments.clone();
                    inner.state.status = FetchStatus::Idle;
                }

                Ok(appointments)
            }
            Err(e) => {
                tracing::error!("Failed to fetch {}: {}", key, e);
                if publishes {
                    inner.state.status = FetchStatus::Error(FETCH_ERROR_MESSAGE.to_string());
                }
                Err(ViewError::Backend(e))
            }
        }
    }

    pub async fn refresh_selected_week(&self, force_refresh: bool) -> Result<Vec<Appointment>, ViewError> {
        let (professional_id, days) = {
            let inner = self.inner.lock().await;
            (inner.state.selected_professional, inner.state.week_days())
        };

        match professional_id {
            Some(id) => self.fetch_week(id, &days, force_refresh).await,
            None => Ok(Vec::new()),
        }
    }

    pub async fn clear_cache(&self, professional_id: Option<ProfessionalId>) {
        self.inner.lock().await.invalidate(professional_id);
    }

    pub async fn advance_week(&self) {
        self.inner.lock().await.state.advance_week();
    }

    pub async fn retreat_week(&self) {
        self.inner.lock().await.state.retreat_week();
    }

    pub async fn set_selected_professional(&self, professional_id: Option<ProfessionalId>) {
        self.inner.lock().await.state.set_selected_professional(professional_id);
    }

    pub async fn selected_professional(&self) -> Option<ProfessionalId> {
        self.inner.lock().await.state.selected_professional
    }

    pub async fn week_days(&self) -> Vec<NaiveDate> {
        self.inner.lock().await.state.week_days()
    }

    pub async fn appointments(&self) -> Vec<Appointment> {
        self.inner.lock().await.state.appointments.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.inner.lock().await.state.is_loading()
    }

    pub async fn error(&self) -> Option<String> {
        self.inner.lock().await.state.error().map(str::to_string)
    }

    pub async fn create_appointment(
        &self,
        professional_id: ProfessionalId,
        draft: &AppointmentDraft,
    ) -> Result<Appointment, ViewError> {
        let insert = draft
            .to_insert(professional_id, &self.zone_suffix)
            .map_err(ViewError::InvalidDraft)?;

        let created = self.source.create_appointment(&insert).await?;
        self.clear_cache(Some(professional_id)).await;

        Ok(self.written(created))
    }

    pub async fn update_appointment(&self, update: &AppointmentUpdate) -> Result<Appointment, ViewError> {
        let updated = self.source.update_appointment(update).await?;
        self.clear_cache(updated.professional_id).await;

        Ok(self.written(updated))
    }

    pub async fn cancel_appointment(
        &self,
        appointment_id: i64,
        cancelled_at: Option<DateTime<Utc>>,
    ) -> Result<Appointment, ViewError> {
        let cancelled = self
            .source
            .cancel_appointment(appointment_id, cancelled_at.unwrap_or_else(Utc::now))
            .await?;
        self.clear_cache(cancelled.professional_id).await;

        Ok(self.written(cancelled))
    }

    fn written(&self, row: RawAppointment) -> Appointment {
        let mut issues = Vec::new();
        let appointment = self.formatter.format_one(&row, Self::now(), &mut issues);
        Self::report_issues(&issues);
        appointment
    }
}
