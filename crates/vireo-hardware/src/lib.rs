//! Contracts between the controller core and the platform.
//!
//! The core never talks to peripherals directly. Platform glue implements
//! these traits and hands the implementations to the bootstrap, which wires
//! them into the feedback loop; the platform's IMU interrupt then drives
//! `FeedbackLoop::tick`. Every call made from inside the tick must be
//! non-blocking.

#![no_std]

use vireo_config::Settings;
use vireo_control::{ArmState, Setpoint};
use vireo_error::ConfigError;

/// One fused attitude sample, delivered at `SAMPLE_RATE_HZ`.
///
/// `tait_bryan` is `(x, y, z)` in radians with `z` wrapped to (-pi, pi].
/// The core treats `y` as roll and `x` as pitch (axis swap for NED).
#[derive(Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ImuSample {
    pub tait_bryan: [f32; 3],
    pub v_batt: f32,
}

/// Attitude and pack-voltage source. `sample` returns the latest fused
/// estimate without blocking; the platform guarantees one fresh sample per
/// tick.
pub trait ImuSource {
    fn sample(&mut self) -> ImuSample;
}

/// Refreshes the setpoint at the start of every tick. Implementations own
/// the pilot-facing fields but must leave `yaw` and `altitude` alone while
/// the respective control modes integrate them in place.
pub trait SetpointSource {
    fn refresh(&mut self, setpoint: &mut Setpoint, arm_state: ArmState);
}

/// System-wide run state maintained outside the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RunState {
    Running,
    Paused,
}

pub trait RunStateSource {
    fn run_state(&self) -> RunState;
}

/// Persistent configuration, read once at bootstrap.
pub trait SettingsProvider {
    fn load(&self) -> Result<Settings, ConfigError>;
}

/// ESC output. `channel` is 1-based; `value` is a normalized pulse in
/// [-1, 1], where slightly negative values keep the ESC awake without
/// spinning the motor. Must not block or fail out of the ISR.
pub trait EscDriver {
    fn send_pulse_normalized(&mut self, channel: usize, value: f32);
}

/// Annunciator LEDs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LedColor {
    Red,
    Green,
}

pub trait Annunciator {
    fn set_led(&mut self, color: LedColor, on: bool);
}
