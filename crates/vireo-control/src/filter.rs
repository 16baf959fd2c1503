//! Discrete SISO compensator with soft start, output saturation and
//! bumpless prefill.

use vireo_config::{DT, FilterSpec, MAX_FILTER_TAPS};
use vireo_error::{ConfigError, FilterWarning};

/// One discrete transfer-function compensator.
///
/// All three attitude axes (and the altitude branch) use this same type
/// with different coefficients; there is no per-axis specialization. The
/// delay lines are newest-first ring-free arrays sized for the maximum
/// supported order.
#[derive(Debug, Clone)]
pub struct DiscreteFilter {
    gain: f32,
    gain_orig: f32,
    num: [f32; MAX_FILTER_TAPS],
    den: [f32; MAX_FILTER_TAPS],
    num_len: usize,
    den_len: usize,
    // in_buf[i] = u[k-i], out_buf[i] = y[k-1-i]
    in_buf: [f32; MAX_FILTER_TAPS],
    out_buf: [f32; MAX_FILTER_TAPS],
    sat_enabled: bool,
    sat_min: f32,
    sat_max: f32,
    sat_hit: bool,
    // Soft start: ramp the effective gain from 0 to 1 over this many
    // seconds after a reset. 0 disables the ramp.
    soft_start_s: f32,
    soft_elapsed_s: f32,
}

impl DiscreteFilter {
    pub fn new(spec: &FilterSpec) -> Result<Self, ConfigError> {
        if spec.den_len == 0 || spec.den[0] == 0.0 {
            return Err(ConfigError::DegenerateDenominator);
        }
        if spec.den_len > MAX_FILTER_TAPS || spec.num_len > MAX_FILTER_TAPS {
            return Err(ConfigError::OrderTooHigh);
        }
        if spec.num_len == 0 || spec.num_len > spec.den_len {
            return Err(ConfigError::ImproperCompensator);
        }
        Ok(Self {
            gain: spec.gain,
            gain_orig: spec.gain,
            num: spec.num,
            den: spec.den,
            num_len: spec.num_len,
            den_len: spec.den_len,
            in_buf: [0.0; MAX_FILTER_TAPS],
            out_buf: [0.0; MAX_FILTER_TAPS],
            sat_enabled: false,
            sat_min: 0.0,
            sat_max: 0.0,
            sat_hit: false,
            soft_start_s: 0.0,
            soft_elapsed_s: 0.0,
        })
    }

    /// March one sample. Applies the current gain (scaled by the soft-start
    /// ramp), saturates to the enabled clamp window, and stores the clamped
    /// output in the delay line so the internal state never advances past
    /// the clamp.
    pub fn march(&mut self, err: f32) -> f32 {
        // shift the input delay line and insert the new sample
        let mut i = self.num_len;
        while i > 1 {
            self.in_buf[i - 1] = self.in_buf[i - 2];
            i -= 1;
        }
        self.in_buf[0] = err;

        let mut g = self.gain;
        if self.soft_start_s > 0.0 && self.soft_elapsed_s < self.soft_start_s {
            g *= self.soft_elapsed_s / self.soft_start_s;
            self.soft_elapsed_s += DT;
        }

        let mut y = 0.0;
        for i in 0..self.num_len {
            y += g * self.num[i] * self.in_buf[i];
        }
        for i in 1..self.den_len {
            y -= self.den[i] * self.out_buf[i - 1];
        }
        y /= self.den[0];

        if self.sat_enabled {
            if y > self.sat_max {
                y = self.sat_max;
                self.sat_hit = true;
            } else if y < self.sat_min {
                y = self.sat_min;
                self.sat_hit = true;
            } else {
                self.sat_hit = false;
            }
        }

        // shift the output delay line
        let mut i = MAX_FILTER_TAPS;
        while i > 1 {
            self.out_buf[i - 1] = self.out_buf[i - 2];
            i -= 1;
        }
        self.out_buf[0] = y;
        y
    }

    /// Zero both delay lines and re-arm the soft-start ramp.
    pub fn reset(&mut self) {
        self.in_buf = [0.0; MAX_FILTER_TAPS];
        self.out_buf = [0.0; MAX_FILTER_TAPS];
        self.soft_elapsed_s = 0.0;
        self.sat_hit = false;
    }

    /// Fill the output delay line so the next zero-input march returns
    /// `y0`. Exact when the denominator preserves a constant output (it
    /// sums to zero, i.e. the compensator carries an integrator pole);
    /// otherwise the fill is best-effort and a warning is reported once to
    /// the caller.
    pub fn prefill(&mut self, y0: f32) -> Result<(), FilterWarning> {
        for slot in self.out_buf.iter_mut() {
            *slot = y0;
        }
        let den_sum: f32 = self.den[..self.den_len].iter().sum();
        if den_sum.abs() > 1e-6 {
            return Err(FilterWarning::InexactPrefill);
        }
        Ok(())
    }

    /// Record the clamp window applied by subsequent `march` calls.
    /// `min` must not exceed `max`.
    pub fn enable_saturation(&mut self, min: f32, max: f32) {
        debug_assert!(min <= max);
        self.sat_enabled = true;
        self.sat_min = min;
        self.sat_max = max;
    }

    pub fn disable_saturation(&mut self) {
        self.sat_enabled = false;
    }

    /// Whether the last march hit the clamp window.
    pub fn saturated(&self) -> bool {
        self.sat_hit
    }

    /// Arm the soft-start ramp. Takes effect after the next `reset`.
    pub fn enable_soft_start(&mut self, seconds: f32) {
        self.soft_start_s = seconds;
    }

    // Gain scheduling hooks. `gain` is rescaled every tick from
    // `gain_orig`, which never changes after construction.
    pub fn set_gain(&mut self, gain: f32) {
        self.gain = gain;
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn gain_orig(&self) -> f32 {
        self.gain_orig
    }
}
