use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use std::sync::OnceLock;

use super::appointment::{ClientId, NewAppointment, ProfessionalId};
use super::formatter::DEFAULT_COLOR;

pub const DEFAULT_DRAFT_TITLE: &str = "Consulta";
pub const DEFAULT_ZONE_SUFFIX: &str = "-03";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftField {
    Client,
    Title,
    Date,
    StartTime,
    EndTime,
    Color,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftIssue {
    pub field: DraftField,
    pub message: String,
}

impl DraftIssue {
    fn new(field: DraftField, message: &str) -> Self {
        Self { field, message: message.to_string() }
    }
}

impl std::fmt::Display for DraftIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.field, self.message)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppointmentDraft {
    pub client_id: Option<ClientId>,
    pub title: String,
    pub description: String,
    pub date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub color: String,
}

impl Default for AppointmentDraft {
    fn default() -> Self {
        Self {
            client_id: None,
            title: DEFAULT_DRAFT_TITLE.to_string(),
            description: String::new(),
            date: None,
            start_time: None,
            end_time: None,
            color: DEFAULT_COLOR.to_string(),
        }
    }
}

fn hex_color() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("static pattern is valid"))
}

pub fn parse_form_time(input: &str) -> Option<NaiveTime> {
    let input = input.trim();
    NaiveTime::parse_from_str(input, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(input, "%H:%M"))
        .ok()
}

impl AppointmentDraft {
    pub fn validate(&self) -> Result<(), Vec<DraftIssue>> {
        let mut issues = Vec::new();

        if self.client_id.is_none_or(|id| id <= 0) {
            issues.push(DraftIssue::new(DraftField::Client, "Cliente é obrigatório"));
        }
        if self.title.trim().is_empty() {
            issues.push(DraftIssue::new(DraftField::Title, "Título é obrigatório"));
        }
        if self.date.is_none() {
            issues.push(DraftIssue::new(DraftField::Date, "Data é obrigatória"));
        }
        if self.start_time.is_none() {
            issues.push(DraftIssue::new(DraftField::StartTime, "Hora de início é obrigatória"));
        }
        if self.end_time.is_none() {
            issues.push(DraftIssue::new(DraftField::EndTime, "Hora de fim é obrigatória"));
        }
        if let (Some(start), Some(end)) = (self.start_time, self.end_time)
            && end <= start
        {
            issues.push(DraftIssue::new(
                DraftField::EndTime,
                "Hora de fim deve ser maior que hora de início",
            ));
        }
        if !hex_color().is_match(self.color.trim()) {
            issues.push(DraftIssue::new(DraftField::Color, "Cor inválida"));
        }

        if issues.is_empty() { Ok(()) } else { Err(issues) }
    }

    pub fn to_insert(
        &self,
        professional_id: ProfessionalId,
        zone_suffix: &str,
    ) -> Result<NewAppointment, Vec<DraftIssue>> {
        self.validate()?;

        let (Some(client_id), Some(date), Some(start), Some(end)) =
            (self.client_id, self.date, self.start_time, self.end_time)
        else {
            unreachable!("validated draft has every required field");
        };

        Ok(NewAppointment {
            professional_id,
            client_id,
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            date: date.format("%Y-%m-%d").to_string(),
            start_time: format!("{}{}", start.format("%H:%M:%S"), zone_suffix),
            end_time: format!("{}{}", end.format("%H:%M:%S"), zone_suffix),
            color: self.color.trim().to_string(),
        })
    }
}
