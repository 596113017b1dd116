pub mod app;
pub mod backend;
pub mod professional_directory;
pub mod schedule;
pub mod schedule_view;
pub mod storage;

pub use app::{FetchStatus, ScheduleState};
pub use professional_directory::ProfessionalDirectory;
pub use schedule::{Appointment, Professional, RawAppointment, WeekWindow};
pub use schedule_view::{ScheduleView, ViewError};
