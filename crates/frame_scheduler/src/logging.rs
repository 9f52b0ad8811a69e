//! Logging setup

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system
///
/// Panics if a logger is already installed; use [`try_init`] where that can
/// happen, such as in tests.
pub fn init() {
    env_logger::init();
}

/// Initialize the logging system unless a logger is already installed
pub fn try_init() -> Result<(), log::SetLoggerError> {
    env_logger::try_init()
}
