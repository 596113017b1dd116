use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

pub type ProfessionalId = i64;
pub type ClientId = i64;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawAppointment {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, rename = "profissional_id")]
    pub professional_id: Option<ProfessionalId>,
    #[serde(default, rename = "cliente_id")]
    pub client_id: Option<ClientId>,
    #[serde(default, rename = "data")]
    pub date: Option<String>,
    #[serde(default, rename = "hora_inicio")]
    pub start_time: Option<String>,
    #[serde(default, rename = "hora_fim")]
    pub end_time: Option<String>,
    #[serde(default, rename = "titulo")]
    pub title: Option<String>,
    #[serde(default, rename = "descricao")]
    pub description: Option<String>,
    #[serde(default, rename = "cancelado")]
    pub cancelled: Option<bool>,
    #[serde(default, rename = "cancelado_as")]
    pub cancelled_at: Option<String>,
    #[serde(default, rename = "cor")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub title: String,
    pub description: String,
    pub client_id: Option<ClientId>,
    pub professional_id: Option<ProfessionalId>,
    pub color: String,
    pub cancelled: Option<bool>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Appointment {
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    pub fn overlaps(&self, other: &Appointment) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.unwrap_or(false)
    }
}

pub fn appointments_on(appointments: &[Appointment], date: NaiveDate) -> Vec<&Appointment> {
    let mut on_day: Vec<&Appointment> = appointments.iter().filter(|a| a.start.date() == date).collect();
    on_day.sort_by_key(|a| a.start);
    on_day
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewAppointment {
    #[serde(rename = "profissional_id")]
    pub professional_id: ProfessionalId,
    #[serde(rename = "cliente_id")]
    pub client_id: ClientId,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "data")]
    pub date: String,
    #[serde(rename = "hora_inicio")]
    pub start_time: String,
    #[serde(rename = "hora_fim")]
    pub end_time: String,
    #[serde(rename = "cor")]
    pub color: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AppointmentUpdate {
    #[serde(skip)]
    pub id: i64,
    #[serde(rename = "titulo", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "descricao", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "cor", skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl AppointmentUpdate {
    pub fn trimmed(&self) -> Self {
        let trim = |value: &Option<String>| value.as_ref().map(|v| v.trim().to_string());
        Self {
            id: self.id,
            title: trim(&self.title),
            description: trim(&self.description),
            color: trim(&self.color),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.color.is_none()
    }
}
