mod config;
mod window;

pub use config::{ConfigId, ConfigSummary, Configuration};
pub use window::{WindowRecord, WindowSnapshot};
