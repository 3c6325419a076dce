mod api;
mod desktops;
mod enumerator;
mod error;
mod models;
mod platform;
mod replay;
mod store;

pub use api::Backend;
pub use desktops::DesktopMapper;
pub use enumerator::WindowEnumerator;
pub use error::Error;
pub use models::{ConfigId, ConfigSummary, Configuration, WindowRecord, WindowSnapshot};
pub use platform::{fake, native_window_system, RawWindow, WindowHandle, WindowSystem};
pub use replay::{
    FailureReason, RecordOutcome, RecordReport, ReplayEngine, ReplayOptions, ReplayReport,
};
pub use store::ConfigStore;

/// Initialize logging (reads RUST_LOG env var). Called once by the shell
/// embedding this engine.
pub fn init_logging() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();
}

/// Default catalog location under the per-user application data directory.
pub fn default_data_dir() -> Option<std::path::PathBuf> {
    dirs::data_dir().map(|dir| dir.join("vdesk"))
}
