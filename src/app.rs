use chrono::{Local, NaiveDate};

use crate::schedule::week::shift_weeks;
use crate::schedule::{Appointment, ProfessionalId, WeekWindow};
use crate::storage::WeeklyCache;

#[derive(Debug, Clone, PartialEq)]
pub enum FetchStatus {
    Idle,
    Loading,
    Error(String),
}

#[derive(Debug)]
pub struct ScheduleState {
    pub reference_date: NaiveDate,
    pub selected_professional: Option<ProfessionalId>,
    pub appointments: Vec<Appointment>,
    pub status: FetchStatus,
    pub cache: WeeklyCache,
}

impl ScheduleState {
    pub fn new() -> Self {
        Self::starting_at(Local::now().date_naive())
    }

    pub fn starting_at(reference_date: NaiveDate) -> Self {
        Self {
            reference_date,
            selected_professional: None,
            appointments: Vec::new(),
            status: FetchStatus::Idle,
            cache: WeeklyCache::new(),
        }
    }

    pub fn week_window(&self) -> WeekWindow {
        WeekWindow::containing(self.reference_date)
    }

    pub fn week_days(&self) -> Vec<NaiveDate> {
        self.week_window().days()
    }

    pub fn advance_week(&mut self) {
        self.reference_date = shift_weeks(self.reference_date, 1);
    }

    pub fn retreat_week(&mut self) {
        self.reference_date = shift_weeks(self.reference_date, -1);
    }

    pub fn set_selected_professional(&mut self, professional_id: Option<ProfessionalId>) {
        self.selected_professional = professional_id;
    }

    pub fn is_loading(&self) -> bool {
        self.status == FetchStatus::Loading
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            FetchStatus::Error(message) => Some(message),
            _ => None,
        }
    }
}

impl Default for ScheduleState {
    fn default() -> Self {
        Self::new()
    }
}
