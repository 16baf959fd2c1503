#![cfg_attr(not(test), no_std)]

#[cfg(all(feature = "defmt", feature = "log"))]
compile_error!("features `defmt` and `log` are mutually exclusive");

// This must go first so the macros are visible in the other modules.
#[macro_use]
mod fmt;

pub mod bootstrap;
pub mod feedback;
pub mod logging;

pub use bootstrap::init;
pub use feedback::FeedbackLoop;
pub use logging::{FlightLogger, LOG_CHANNEL, LogEntry, LogQueue};
