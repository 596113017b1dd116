pub mod appointment;
pub mod draft;
pub mod formatter;
pub mod professional;
pub mod week;

pub use appointment::{
    Appointment, AppointmentUpdate, ClientId, NewAppointment, ProfessionalId, RawAppointment,
    appointments_on,
};
pub use draft::{AppointmentDraft, DraftField, DraftIssue};
pub use formatter::{AppointmentFormatter, FormatDefaults, FormatError, FormatIssue, FormatOutcome};
pub use professional::Professional;
pub use week::WeekWindow;
