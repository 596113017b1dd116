pub mod cache;
pub mod config;

pub use cache::{CacheKey, WeeklyCache};
pub use config::Config;
