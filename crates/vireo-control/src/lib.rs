#![cfg_attr(not(test), no_std)]

pub mod arming;
pub mod filter;
pub mod mixer;
pub mod setpoint;
pub mod state;
pub mod yaw;

// Re-export commonly used types
pub use arming::ArmState;
pub use filter::DiscreteFilter;
pub use mixer::Mixer;
pub use setpoint::Setpoint;
pub use state::CoreState;
pub use yaw::YawTracker;
