//! Controller setpoint, refreshed by the setpoint source every tick.

/// Targets for the feedback loop. Angles in radians, throttles normalized.
///
/// NED convention: `z_throttle` is negative-down, usable range [-1, 0].
///
/// The setpoint source owns the pilot-facing fields; the feedback loop
/// integrates `yaw` (from `yaw_rate`) and, in altitude-hold, `altitude`
/// (from `altitude_rate`) in place. Sources must tolerate those writes.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Setpoint {
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub yaw_rate: f32,
    pub z_throttle: f32,
    pub x_throttle: f32,
    pub y_throttle: f32,
    pub altitude: f32,
    pub altitude_rate: f32,
    pub en_rpy_ctrl: bool,
    pub en_alt_ctrl: bool,
    pub en_6dof: bool,
}

impl Setpoint {
    pub const fn neutral() -> Self {
        Self {
            roll: 0.0,
            pitch: 0.0,
            yaw: 0.0,
            yaw_rate: 0.0,
            z_throttle: 0.0,
            x_throttle: 0.0,
            y_throttle: 0.0,
            altitude: 0.0,
            altitude_rate: 0.0,
            en_rpy_ctrl: false,
            en_alt_ctrl: false,
            en_6dof: false,
        }
    }
}

impl Default for Setpoint {
    fn default() -> Self {
        Self::neutral()
    }
}
