#![cfg_attr(not(test), no_std)]

pub mod layout;

pub use layout::*;

// Feedback loop timing. The IMU interrupt drives the loop at exactly this
// rate; every discrete compensator below is designed against DT.
pub const SAMPLE_RATE_HZ: u32 = 200;
pub const DT: f32 = 1.0 / SAMPLE_RATE_HZ as f32; // 5ms

// Rotor limits
pub const MAX_ROTORS: usize = 8;
pub const MIX_AXES: usize = 6; // thrust, roll, pitch, yaw, X, Y

// Safety parameters
pub const TIP_ANGLE: f32 = 1.2; // rad, disarm when |roll| or |pitch| exceeds this
pub const ESC_IDLE_PULSE: f32 = -0.1; // keeps ESCs awake without spinning motors

// Soft start ramp applied to compensator gains after arming
pub const SOFT_START_SECONDS: f32 = 0.3;

// Thrust component limits. NED convention: thrust commands are negative
// (Z points down), so the usable band is [-MAX, -MIN].
pub const MIN_THRUST_COMPONENT: f32 = 0.05;
pub const MAX_THRUST_COMPONENT: f32 = 0.8;

// Per-axis control authority limits
pub const MAX_ROLL_COMPONENT: f32 = 0.4;
pub const MAX_PITCH_COMPONENT: f32 = 0.4;
pub const MAX_YAW_COMPONENT: f32 = 0.4;
pub const MAX_X_COMPONENT: f32 = 0.3;
pub const MAX_Y_COMPONENT: f32 = 0.3;

// Altitude-hold setpoint band around the current altitude estimate
pub const ALT_BOUND_U: f32 = 1.0; // m above
pub const ALT_BOUND_D: f32 = 0.5; // m below

// Battery parameters
pub const V_NOMINAL: f32 = 11.1; // 3S pack, reference for gain scheduling

// Compensator limits
pub const MAX_FILTER_ORDER: usize = 3;
pub const MAX_FILTER_TAPS: usize = MAX_FILTER_ORDER + 1;

// Flight log
pub const LOG_QUEUE_DEPTH: usize = 32;

/// Discrete SISO compensator specification: a transfer function in
/// coefficient form plus an initial gain. Loaded from persistent settings
/// at bootstrap and immutable afterwards.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FilterSpec {
    pub gain: f32,
    pub num: [f32; MAX_FILTER_TAPS],
    pub den: [f32; MAX_FILTER_TAPS],
    pub num_len: usize,
    pub den_len: usize,
}

impl FilterSpec {
    /// Build a spec from raw numerator/denominator coefficients
    /// (newest-first). Slices longer than `MAX_FILTER_TAPS` are truncated;
    /// real validation happens when the filter is constructed.
    pub const fn from_coeffs(gain: f32, num: &[f32], den: &[f32]) -> Self {
        let mut spec = Self {
            gain,
            num: [0.0; MAX_FILTER_TAPS],
            den: [0.0; MAX_FILTER_TAPS],
            num_len: num.len(),
            den_len: den.len(),
        };
        let mut i = 0;
        while i < num.len() && i < MAX_FILTER_TAPS {
            spec.num[i] = num[i];
            i += 1;
        }
        let mut i = 0;
        while i < den.len() && i < MAX_FILTER_TAPS {
            spec.den[i] = den[i];
            i += 1;
        }
        spec
    }

    /// Discrete parallel PID with a first-order roll-off on the derivative
    /// term (time constant `tau`, backward-Euler discretization at `dt`).
    /// The resulting denominator carries an integrator pole, so the filter
    /// preserves a constant output for zero input and prefills exactly.
    pub fn pid(kp: f32, ki: f32, kd: f32, tau: f32, dt: f32) -> Self {
        let a = if tau > 0.0 { tau / (tau + dt) } else { 0.0 };
        let b = kd / (tau + dt);
        Self::from_coeffs(
            1.0,
            &[
                kp + ki * dt + b,
                -kp * (1.0 + a) - ki * dt * a - 2.0 * b,
                kp * a + b,
            ],
            &[1.0, -(1.0 + a), a],
        )
    }
}

/// Controller settings, pulled from the settings provider once at bootstrap
/// and immutable for the rest of the flight.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Settings {
    pub num_rotors: usize,
    pub layout: RotorLayout,
    pub v_nominal: f32,
    pub enable_logging: bool,
    pub roll_controller: FilterSpec,
    pub pitch_controller: FilterSpec,
    pub yaw_controller: FilterSpec,
    pub altitude_controller: FilterSpec,
}

impl Settings {
    /// Conservative defaults for a 3S quad in X configuration.
    pub fn quad_x_defaults() -> Self {
        Self {
            num_rotors: 4,
            layout: RotorLayout::QuadX,
            v_nominal: V_NOMINAL,
            enable_logging: true,
            roll_controller: FilterSpec::pid(0.12, 0.4, 0.004, 4.0 * DT, DT),
            pitch_controller: FilterSpec::pid(0.12, 0.4, 0.004, 4.0 * DT, DT),
            yaw_controller: FilterSpec::pid(0.3, 0.6, 0.0005, 4.0 * DT, DT),
            altitude_controller: FilterSpec::pid(0.25, 0.1, 0.15, 4.0 * DT, DT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pid_denominator_keeps_the_integrator_pole() {
        let spec = FilterSpec::pid(0.5, 0.2, 0.01, 4.0 * DT, DT);
        assert_eq!(spec.den_len, 3);
        let sum: f32 = spec.den[..spec.den_len].iter().sum();
        assert!(sum.abs() < 1e-6, "denominator must sum to zero, got {sum}");
    }

    #[test]
    fn pid_without_derivative_filter_matches_velocity_form() {
        let (kp, ki, kd) = (1.0, 2.0, 0.05);
        let spec = FilterSpec::pid(kp, ki, kd, 0.0, DT);
        assert!((spec.num[0] - (kp + ki * DT + kd / DT)).abs() < 1e-4);
        assert!((spec.num[1] - (-kp - 2.0 * kd / DT)).abs() < 1e-4);
        assert!((spec.num[2] - kd / DT).abs() < 1e-4);
        assert_eq!(spec.den[..3], [1.0, -1.0, 0.0]);
    }

    #[test]
    fn from_coeffs_truncates_overlong_slices() {
        let spec = FilterSpec::from_coeffs(1.0, &[1.0; 6], &[1.0; 6]);
        assert_eq!(spec.num_len, 6); // length reported as-is, caught at filter construction
        assert_eq!(spec.num, [1.0; MAX_FILTER_TAPS]);
    }
}
