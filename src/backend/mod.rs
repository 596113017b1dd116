pub mod report;
pub mod rest_api;

pub use report::{ReportFilter, ReportRow, ReportSummary};
pub use rest_api::{ApiError, AppointmentSource, DateRange, RestBackendClient};
