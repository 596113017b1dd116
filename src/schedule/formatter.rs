use chrono::{DateTime, NaiveDateTime, Utc};
use thiserror::Error;

use super::appointment::{Appointment, RawAppointment};

pub const DEFAULT_TITLE: &str = "Sem título";
pub const DEFAULT_DESCRIPTION: &str = "Sem descrição";
pub const DEFAULT_COLOR: &str = "#DBE9FE";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormatError {
    #[error("Missing field: {0}")]
    MissingField(&'static str),
    #[error("Invalid timestamp for {field}: '{value}'")]
    InvalidTimestamp { field: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormatIssue {
    pub appointment_id: i64,
    pub error: FormatError,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FormatOutcome {
    pub appointments: Vec<Appointment>,
    pub issues: Vec<FormatIssue>,
}

impl FormatOutcome {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormatDefaults {
    pub title: String,
    pub description: String,
    pub color: String,
}

impl Default for FormatDefaults {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            color: DEFAULT_COLOR.to_string(),
        }
    }
}

/// Drops a trailing zone suffix such as `-03` or `+05:30`. The suffix is
/// discarded, not applied.
pub fn strip_zone_suffix(time: &str) -> &str {
    match time.split(['+', '-']).next() {
        Some(head) if !head.is_empty() => head,
        _ => time,
    }
}

pub fn combine_date_time(
    field: &'static str,
    date: Option<&str>,
    time: Option<&str>,
) -> Result<NaiveDateTime, FormatError> {
    let date = date.filter(|d| !d.is_empty()).ok_or(FormatError::MissingField("data"))?;
    let time = time
        .map(strip_zone_suffix)
        .filter(|t| !t.is_empty())
        .ok_or(FormatError::MissingField(field))?;

    let combined = format!("{}T{}", date, time);
    NaiveDateTime::parse_from_str(&combined, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(&combined, "%Y-%m-%dT%H:%M"))
        .map_err(|_| FormatError::InvalidTimestamp { field, value: combined })
}

pub fn parse_cancelled_at(value: &str) -> Result<DateTime<Utc>, FormatError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").map(|dt| dt.and_utc())
        })
        .or_else(|_| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f").map(|dt| dt.and_utc())
        })
        .map_err(|_| FormatError::InvalidTimestamp {
            field: "cancelado_as",
            value: value.to_string(),
        })
}

fn text_or(value: &Option<String>, fallback: &str) -> String {
    match value.as_deref() {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => fallback.to_string(),
    }
}

impl Appointment {
    pub fn try_from_row(row: &RawAppointment, defaults: &FormatDefaults) -> Result<Self, FormatError> {
        let start = combine_date_time("hora_inicio", row.date.as_deref(), row.start_time.as_deref())?;
        let end = combine_date_time("hora_fim", row.date.as_deref(), row.end_time.as_deref())?;
        let cancelled_at = row
            .cancelled_at
            .as_deref()
            .filter(|v| !v.is_empty())
            .map(parse_cancelled_at)
            .transpose()?;

        Ok(build(row, start, end, cancelled_at, defaults))
    }
}

fn build(
    row: &RawAppointment,
    start: NaiveDateTime,
    end: NaiveDateTime,
    cancelled_at: Option<DateTime<Utc>>,
    defaults: &FormatDefaults,
) -> Appointment {
    Appointment {
        id: row.id,
        start,
        end,
        title: text_or(&row.title, &defaults.title),
        description: text_or(&row.description, &defaults.description),
        client_id: row.client_id,
        professional_id: row.professional_id,
        color: text_or(&row.color, &defaults.color),
        cancelled: row.cancelled,
        cancelled_at,
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppointmentFormatter {
    defaults: FormatDefaults,
}

impl AppointmentFormatter {
    pub fn new(defaults: FormatDefaults) -> Self {
        Self { defaults }
    }

    pub fn defaults(&self) -> &FormatDefaults {
        &self.defaults
    }

    pub fn format(&self, rows: &[RawAppointment], now: NaiveDateTime) -> FormatOutcome {
        let mut outcome = FormatOutcome::default();

        for row in rows {
            let appointment = self.format_one(row, now, &mut outcome.issues);
            outcome.appointments.push(appointment);
        }

        outcome
    }

    pub fn format_one(
        &self,
        row: &RawAppointment,
        now: NaiveDateTime,
        issues: &mut Vec<FormatIssue>,
    ) -> Appointment {
        let mut note = |error: FormatError| {
            issues.push(FormatIssue { appointment_id: row.id, error });
        };

        let start = combine_date_time("hora_inicio", row.date.as_deref(), row.start_time.as_deref())
            .unwrap_or_else(|e| {
                note(e);
                now
            });
        let end = combine_date_time("hora_fim", row.date.as_deref(), row.end_time.as_deref())
            .unwrap_or_else(|e| {
                note(e);
                now
            });
        let cancelled_at = match row.cancelled_at.as_deref().filter(|v| !v.is_empty()) {
            Some(value) => parse_cancelled_at(value).map_err(&mut note).ok(),
            None => None,
        };

        build(row, start, end, cancelled_at, &self.defaults)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use pretty_assertions::assert_eq;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 5).unwrap().and_hms_opt(8, 15, 0).unwrap()
    }

    fn row(id: i64, date: &str, start: &str, end: &str) -> RawAppointment {
        RawAppointment {
            id,
            professional_id: Some(4),
            client_id: Some(9),
            date: Some(date.to_string()),
            start_time: Some(start.to_string()),
            end_time: Some(end.to_string()),
            cancelled: Some(false),
            ..Default::default()
        }
    }

    fn parse(value: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S").unwrap()
    }

    #[test]
    fn strips_negative_zone_suffix() {
        assert_eq!(strip_zone_suffix("09:00:00-03"), "09:00:00");
    }

    #[test]
    fn strips_positive_zone_suffix() {
        assert_eq!(strip_zone_suffix("18:30:00+05:30"), "18:30:00");
    }

    #[test]
    fn keeps_time_without_suffix() {
        assert_eq!(strip_zone_suffix("07:45:00"), "07:45:00");
    }

    #[test]
    fn keeps_original_when_suffix_is_everything() {
        assert_eq!(strip_zone_suffix("-03"), "-03");
    }

    #[test]
    fn zone_suffix_is_discarded_not_interpreted() {
        let formatter = AppointmentFormatter::default();
        let rows = vec![row(1, "2025-10-30", "09:00:00-03", "10:00:00-03")];

        let outcome = formatter.format(&rows, now());

        assert!(outcome.is_clean());
        assert_eq!(outcome.appointments[0].start, parse("2025-10-30T09:00:00"));
        assert_eq!(outcome.appointments[0].end, parse("2025-10-30T10:00:00"));
    }

    #[test]
    fn accepts_minutes_only_and_fractional_seconds() {
        let formatter = AppointmentFormatter::default();
        let rows = vec![row(1, "2025-10-30", "09:30", "10:00:00.250")];

        let outcome = formatter.format(&rows, now());

        assert!(outcome.is_clean());
        assert_eq!(outcome.appointments[0].start, parse("2025-10-30T09:30:00"));
        assert_eq!(outcome.appointments[0].end.format("%H:%M:%S%.3f").to_string(), "10:00:00.250");
    }

    #[test]
    fn applies_text_defaults() {
        let formatter = AppointmentFormatter::default();
        let mut raw = row(1, "2025-10-30", "09:00:00", "10:00:00");
        raw.title = Some(String::new());

        let appointment = &formatter.format(&[raw], now()).appointments[0];

        assert_eq!(appointment.title, "Sem título");
        assert_eq!(appointment.description, "Sem descrição");
        assert_eq!(appointment.color, "#DBE9FE");
    }

    #[test]
    fn keeps_present_text_fields() {
        let formatter = AppointmentFormatter::default();
        let mut raw = row(1, "2025-10-30", "09:00:00", "10:00:00");
        raw.title = Some("Reiki".to_string());
        raw.description = Some("Primeira sessão".to_string());
        raw.color = Some("#FFE4E6".to_string());

        let appointment = &formatter.format(&[raw], now()).appointments[0];

        assert_eq!(appointment.title, "Reiki");
        assert_eq!(appointment.description, "Primeira sessão");
        assert_eq!(appointment.color, "#FFE4E6");
    }

    #[test]
    fn custom_defaults_are_used() {
        let formatter = AppointmentFormatter::new(FormatDefaults {
            title: "Untitled".to_string(),
            description: "-".to_string(),
            color: "#000000".to_string(),
        });

        let appointment = &formatter
            .format(&[row(1, "2025-10-30", "09:00:00", "10:00:00")], now())
            .appointments[0];

        assert_eq!(appointment.title, "Untitled");
        assert_eq!(appointment.color, "#000000");
    }

    #[test]
    fn missing_date_falls_back_to_now_and_reports_issue() {
        let formatter = AppointmentFormatter::default();
        let mut raw = row(3, "", "09:00:00", "10:00:00");
        raw.date = None;

        let outcome = formatter.format(&[raw], now());

        assert_eq!(outcome.appointments.len(), 1);
        assert_eq!(outcome.appointments[0].start, now());
        assert_eq!(outcome.appointments[0].end, now());
        assert_eq!(
            outcome.issues,
            vec![
                FormatIssue { appointment_id: 3, error: FormatError::MissingField("data") },
                FormatIssue { appointment_id: 3, error: FormatError::MissingField("data") },
            ]
        );
    }

    #[test]
    fn unparseable_time_falls_back_to_now() {
        let formatter = AppointmentFormatter::default();
        let rows = vec![row(8, "2025-10-30", "nove horas", "10:00:00")];

        let outcome = formatter.format(&rows, now());

        assert_eq!(outcome.appointments[0].start, now());
        assert_eq!(outcome.appointments[0].end, parse("2025-10-30T10:00:00"));
        assert_eq!(outcome.issues.len(), 1);
        assert!(matches!(
            outcome.issues[0].error,
            FormatError::InvalidTimestamp { field: "hora_inicio", .. }
        ));
    }

    #[test]
    fn parses_cancellation_timestamp() {
        let formatter = AppointmentFormatter::default();
        let mut raw = row(1, "2025-10-30", "09:00:00", "10:00:00");
        raw.cancelled = Some(true);
        raw.cancelled_at = Some("2025-10-29T14:00:00.123+00:00".to_string());

        let appointment = &formatter.format(&[raw], now()).appointments[0];

        let expected = Utc.with_ymd_and_hms(2025, 10, 29, 14, 0, 0).unwrap()
            + chrono::Duration::milliseconds(123);
        assert_eq!(appointment.cancelled_at, Some(expected));
        assert_eq!(appointment.cancelled, Some(true));
    }

    #[test]
    fn unparseable_cancellation_timestamp_becomes_none() {
        let formatter = AppointmentFormatter::default();
        let mut raw = row(1, "2025-10-30", "09:00:00", "10:00:00");
        raw.cancelled_at = Some("ontem".to_string());

        let outcome = formatter.format(&[raw], now());

        assert_eq!(outcome.appointments[0].cancelled_at, None);
        assert_eq!(outcome.issues.len(), 1);
    }

    #[test]
    fn preserves_row_order_and_count() {
        let formatter = AppointmentFormatter::default();
        let rows = vec![
            row(1, "2025-10-27", "08:00:00-03", "09:00:00-03"),
            row(2, "2025-10-27", "10:00:00-03", "11:00:00-03"),
            row(3, "2025-10-28", "08:00:00-03", "09:00:00-03"),
        ];

        let ids: Vec<i64> = formatter.format(&rows, now()).appointments.iter().map(|a| a.id).collect();

        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn strict_conversion_rejects_missing_time() {
        let mut raw = row(1, "2025-10-30", "09:00:00", "10:00:00");
        raw.end_time = None;

        let result = Appointment::try_from_row(&raw, &FormatDefaults::default());

        assert_eq!(result, Err(FormatError::MissingField("hora_fim")));
    }

    #[test]
    fn strict_conversion_accepts_valid_row() {
        let raw = row(1, "2025-10-30", "09:00:00-03", "10:00:00-03");

        let appointment = Appointment::try_from_row(&raw, &FormatDefaults::default()).unwrap();

        assert_eq!(appointment.start, parse("2025-10-30T09:00:00"));
        assert_eq!(appointment.client_id, Some(9));
        assert_eq!(appointment.professional_id, Some(4));
    }
}
