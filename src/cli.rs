use std::{
    env,
    io::{self, Write},
    process::{Command, Stdio},
    sync::Arc,
};

use anyhow::Context;
use chrono::{Datelike, Local, NaiveDate, Weekday};

use clinic_agenda::{
    backend::{AppointmentSource, ReportFilter, ReportRow, ReportSummary, RestBackendClient},
    professional_directory::ProfessionalDirectory,
    schedule::{
        Appointment, Professional, ProfessionalId, appointments_on, formatter::strip_zone_suffix, week::shift_weeks,
    },
    schedule_view::ScheduleView,
    storage::config::Config,
};

#[derive(Debug, Clone, PartialEq)]
pub enum CliMode {
    Week {
        professional_id: ProfessionalId,
        date: NaiveDate,
        offset_weeks: i64,
        refresh: bool,
    },
    Report(ReportFilter),
    Cancel(i64),
    Professionals,
}

pub const USAGE: &str = "Usage: clinic-agenda --professional ID [--week YYYY/MM/DD] [--next N] [--prev N] [--refresh]\n       clinic-agenda --report [--from YYYY/MM/DD] [--to YYYY/MM/DD] [--professional ID] [--client ID] [--include-cancelled]\n       clinic-agenda --cancel ID\n       clinic-agenda --professionals";

const INVALID_OFFSET: &str = "Invalid offset: too many weeks";

pub fn parse_cli_mode() -> Result<CliMode, String> {
    parse_args(env::args().skip(1), Local::now().date_naive())
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y/%m/%d")
        .map_err(|_| format!("Invalid date '{}'. Use YYYY/MM/DD.", value))
}

fn parse_number(flag: &str, value: Option<String>) -> Result<i64, String> {
    let value = value.ok_or_else(|| format!("{} expects a value", flag))?;
    value
        .parse::<i64>()
        .map_err(|_| format!("Invalid number '{}' for {}", value, flag))
}

pub fn parse_args<I>(args: I, today: NaiveDate) -> Result<CliMode, String>
where
    I: IntoIterator<Item = String>,
{
    let mut professional_id = None;
    let mut client_id = None;
    let mut date = today;
    let mut offset_weeks = 0i64;
    let mut refresh = false;
    let mut report = false;
    let mut include_cancelled = false;
    let mut from = None;
    let mut to = None;
    let mut cancel = None;
    let mut professionals = false;
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--professional" => professional_id = Some(parse_number(&arg, args.next())?),
            "--client" => client_id = Some(parse_number(&arg, args.next())?),
            "--week" => {
                let value = args.next().ok_or("--week expects a date")?;
                date = parse_date(&value)?;
            }
            "--next" => {
                let weeks = parse_number(&arg, args.next())?;
                offset_weeks = offset_weeks.checked_add(weeks).ok_or(INVALID_OFFSET)?;
            }
            "--prev" => {
                let weeks = parse_number(&arg, args.next())?;
                offset_weeks = offset_weeks.checked_sub(weeks).ok_or(INVALID_OFFSET)?;
            }
            "--refresh" => refresh = true,
            "--report" => report = true,
            "--include-cancelled" => include_cancelled = true,
            "--from" => {
                let value = args.next().ok_or("--from expects a date")?;
                from = Some(parse_date(&value)?);
            }
            "--to" => {
                let value = args.next().ok_or("--to expects a date")?;
                to = Some(parse_date(&value)?);
            }
            "--cancel" => cancel = Some(parse_number(&arg, args.next())?),
            "--professionals" => professionals = true,
            "--help" => {
                println!("{}", USAGE);
                std::process::exit(0);
            }
            _ => return Err(format!("Unknown argument: {}", arg)),
        }
    }

    if let Some(id) = cancel {
        return Ok(CliMode::Cancel(id));
    }

    if professionals {
        return Ok(CliMode::Professionals);
    }

    if report {
        return Ok(CliMode::Report(ReportFilter {
            professional_id,
            client_id,
            from,
            to,
            include_cancelled,
        }));
    }

    match professional_id {
        Some(professional_id) => Ok(CliMode::Week { professional_id, date, offset_weeks, refresh }),
        None => Err("--professional is required".to_string()),
    }
}

pub async fn run(mode: CliMode) -> anyhow::Result<()> {
    let config = Config::load_or_create().context("loading configuration")?;
    let client = RestBackendClient::from_config(&config).context("building backend client")?;
    let source: Arc<dyn AppointmentSource> = Arc::new(client);

    let text = match mode {
        CliMode::Week { professional_id, date, offset_weeks, refresh } => {
            render_week(source, &config, professional_id, date, offset_weeks, refresh).await?
        }
        CliMode::Report(filter) => {
            let rows = source.fetch_report(&filter).await.context("fetching report")?;
            format_report_text(&rows)
        }
        CliMode::Cancel(id) => {
            let view = ScheduleView::from_config(source, &config);
            let cancelled = view.cancel_appointment(id, None).await?;
            format!("Agendamento {} cancelado: {}", cancelled.id, cancelled.title)
        }
        CliMode::Professionals => {
            let directory = ProfessionalDirectory::new(source);
            let professionals = directory.professionals(false).await.context("fetching professionals")?;
            format_professionals_text(&professionals)
        }
    };

    display_with_pager(&text)?;
    Ok(())
}

pub async fn render_week(
    source: Arc<dyn AppointmentSource>,
    config: &Config,
    professional_id: ProfessionalId,
    date: NaiveDate,
    offset_weeks: i64,
    refresh: bool,
) -> anyhow::Result<String> {
    let heading = professional_heading(&ProfessionalDirectory::new(source.clone()), professional_id).await;
    let view = ScheduleView::from_config(source, config).with_reference_date(shift_weeks(date, offset_weeks));
    view.set_selected_professional(Some(professional_id)).await;

    let appointments = view
        .refresh_selected_week(refresh)
        .await
        .context("loading week")?;
    let days = view.week_days().await;

    Ok(format_week_text(&heading, &days, &appointments))
}

async fn professional_heading(directory: &ProfessionalDirectory, professional_id: ProfessionalId) -> String {
    match directory.lookup(professional_id).await {
        Ok(Some(professional)) => professional.label(),
        Ok(None) => format!("profissional {}", professional_id),
        Err(e) => {
            tracing::warn!("Could not resolve professional {}: {}", professional_id, e);
            format!("profissional {}", professional_id)
        }
    }
}

fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Sun => "Domingo",
        Weekday::Mon => "Segunda-feira",
        Weekday::Tue => "Terça-feira",
        Weekday::Wed => "Quarta-feira",
        Weekday::Thu => "Quinta-feira",
        Weekday::Fri => "Sexta-feira",
        Weekday::Sat => "Sábado",
    }
}

pub fn format_week_text(
    heading: &str,
    days: &[NaiveDate],
    appointments: &[Appointment],
) -> String {
    let mut lines = Vec::new();
    if let (Some(first), Some(last)) = (days.first(), days.last()) {
        lines.push(format!(
            "Agenda – {} – {} a {}",
            heading,
            first.format("%d/%m/%Y"),
            last.format("%d/%m/%Y")
        ));
    }

    for day in days {
        lines.push(String::new());
        lines.push(format!("{}, {}", weekday_name(day.weekday()), day.format("%d/%m")));

        let on_day = appointments_on(appointments, *day);

        if on_day.is_empty() {
            lines.push("  Nenhum agendamento.".to_string());
        }
        for appointment in on_day {
            lines.push(format!("  - {}", build_agenda_line(appointment)));
        }
    }

    lines.join("\n")
}

fn build_agenda_line(appointment: &Appointment) -> String {
    let time_label = format!(
        "{}-{}",
        appointment.start.format("%H:%M"),
        appointment.end.format("%H:%M")
    );

    let mut line = format!("{:<11} {}", time_label, appointment.title);
    if let Some(client) = appointment.client_id {
        line.push_str(&format!(" (cliente {})", client));
    }
    line
}

pub fn format_professionals_text(professionals: &[Professional]) -> String {
    if professionals.is_empty() {
        return "Nenhum profissional encontrado.".to_string();
    }

    let mut lines = vec!["Profissionais".to_string(), String::new()];
    for professional in professionals {
        lines.push(format!("{:>5}  {}", professional.id, professional.label()));
    }
    lines.join("\n")
}

pub fn format_report_text(rows: &[ReportRow]) -> String {
    let mut lines = vec!["Relatório de agendamentos".to_string(), String::new()];

    if rows.is_empty() {
        lines.push("Nenhum agendamento encontrado.".to_string());
        return lines.join("\n");
    }

    for row in rows {
        let status = if row.cancelled.unwrap_or(false) { " [cancelado]" } else { "" };
        lines.push(format!(
            "{} {}  {}  {} / {}{}",
            row.date.as_deref().unwrap_or("----------"),
            row.start_time.as_deref().map(strip_zone_suffix).unwrap_or("--:--"),
            row.title.as_deref().unwrap_or("Sem título"),
            row.professional_name.as_deref().unwrap_or("N/A"),
            row.client_name.as_deref().unwrap_or("N/A"),
            status,
        ));
    }

    let summary = ReportSummary::from_rows(rows);
    lines.push(String::new());
    lines.push(format!(
        "Total: {}  Cancelados: {}  Clientes únicos: {}",
        summary.total, summary.cancelled, summary.unique_clients
    ));
    for (professional, count) in &summary.per_professional {
        lines.push(format!("  {}: {}", professional, count));
    }

    lines.join("\n")
}

fn display_with_pager(text: &str) -> Result<(), io::Error> {
    let pager_value = env::var("PAGER").unwrap_or_else(|_| "less".to_string());
    let mut parts = pager_value.split_whitespace();
    let cmd = match parts.next() {
        Some(c) => c,
        None => {
            println!("{text}");
            return Ok(());
        }
    };
    let args: Vec<&str> = parts.collect();

    match Command::new(cmd)
        .args(&args)
        .stdin(Stdio::piped())
        .spawn()
    {
        Ok(mut child) => {
            if let Some(stdin) = child.stdin.as_mut() {
                stdin.write_all(text.as_bytes())?;
            }
            let _ = child.wait();
        }
        Err(_) => {
            println!("{text}");
        }
    }

    Ok(())
}
