//! Axis-to-rotor mixing and per-channel headroom reporting.

use vireo_config::{MAX_ROTORS, MixAxis, MixTable, RotorLayout};
use vireo_error::ConfigError;

/// Maps per-axis commands onto per-rotor throttle contributions using the
/// airframe's mixing table, and reports how much command headroom a channel
/// has left given the rotors already committed by earlier axes.
#[derive(Debug, Clone)]
pub struct Mixer {
    table: &'static MixTable,
    num_rotors: usize,
}

impl Mixer {
    pub fn new(layout: RotorLayout, num_rotors: usize) -> Result<Self, ConfigError> {
        if num_rotors == 0 || num_rotors > MAX_ROTORS {
            return Err(ConfigError::RotorCountOutOfRange(num_rotors));
        }
        if num_rotors != layout.rotor_count() {
            return Err(ConfigError::LayoutMismatch);
        }
        Ok(Self {
            table: layout.table(),
            num_rotors,
        })
    }

    pub fn num_rotors(&self) -> usize {
        self.num_rotors
    }

    /// Add `u` through the axis column: `mot[i] += u * M[axis][i]`.
    pub fn add_mixed_input(&self, u: f32, axis: MixAxis, mot: &mut [f32]) {
        let row = &self.table[axis as usize];
        for i in 0..self.num_rotors {
            mot[i] += u * row[i];
        }
    }

    /// The exact interval `[min, max]` such that any `u` inside it, added
    /// through `add_mixed_input`, keeps every rotor within [0, 1] given the
    /// partial motor vector `mot`. Rotors the axis does not drive impose no
    /// bound. If some rotor is already out of range the interval collapses
    /// to `(0, 0)` and the axis gets no authority this tick.
    pub fn check_channel_saturation(&self, axis: MixAxis, mot: &[f32]) -> (f32, f32) {
        let row = &self.table[axis as usize];
        let mut min = f32::NEG_INFINITY;
        let mut max = f32::INFINITY;
        for i in 0..self.num_rotors {
            let m = row[i];
            if m == 0.0 {
                continue;
            }
            // 0 <= mot[i] + u*m <= 1, direction depends on the sign of m
            let to_floor = (0.0 - mot[i]) / m;
            let to_ceil = (1.0 - mot[i]) / m;
            let (lo, hi) = if m > 0.0 {
                (to_floor, to_ceil)
            } else {
                (to_ceil, to_floor)
            };
            if lo > min {
                min = lo;
            }
            if hi < max {
                max = hi;
            }
        }
        if min > max { (0.0, 0.0) } else { (min, max) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vireo_config::MAX_ROTORS;

    fn quad() -> Mixer {
        Mixer::new(RotorLayout::QuadX, 4).unwrap()
    }

    #[test]
    fn rejects_bad_rotor_counts() {
        assert_eq!(
            Mixer::new(RotorLayout::QuadX, 0).unwrap_err(),
            ConfigError::RotorCountOutOfRange(0)
        );
        assert_eq!(
            Mixer::new(RotorLayout::QuadX, 9).unwrap_err(),
            ConfigError::RotorCountOutOfRange(9)
        );
        assert_eq!(
            Mixer::new(RotorLayout::QuadX, 6).unwrap_err(),
            ConfigError::LayoutMismatch
        );
    }

    #[test]
    fn thrust_spreads_evenly_on_a_quad() {
        let mixer = quad();
        let mut mot = [0.0; MAX_ROTORS];
        mixer.add_mixed_input(-0.5, MixAxis::Thrust, &mut mot);
        for &m in &mot[..4] {
            assert!((m - 0.5).abs() < 1e-6);
        }
        assert_eq!(mot[4..], [0.0; 4]);
    }

    #[test]
    fn roll_headroom_is_symmetric_at_mid_throttle() {
        let mixer = quad();
        let mut mot = [0.0; MAX_ROTORS];
        mixer.add_mixed_input(-0.5, MixAxis::Thrust, &mut mot);
        // Rotors at 0.5, roll entries +-0.5: u in [-1, 1] exactly.
        let (min, max) = mixer.check_channel_saturation(MixAxis::Roll, &mot);
        assert!((min + 1.0).abs() < 1e-6);
        assert!((max - 1.0).abs() < 1e-6);
    }

    #[test]
    fn headroom_shrinks_as_earlier_axes_commit_rotors() {
        let mixer = quad();
        let mut mot = [0.0; MAX_ROTORS];
        mixer.add_mixed_input(-0.5, MixAxis::Thrust, &mut mot);
        mixer.add_mixed_input(0.4, MixAxis::Roll, &mut mot);
        // Rotors now at [0.7, 0.3, 0.3, 0.7]; pitch entries -+0.5 leave
        // 0.3 of rotor travel on the binding side.
        let (min, max) = mixer.check_channel_saturation(MixAxis::Pitch, &mot);
        assert!((min + 0.6).abs() < 1e-6);
        assert!((max - 0.6).abs() < 1e-6);
    }

    #[test]
    fn headroom_is_tight_against_the_rotor_ceiling() {
        let mixer = quad();
        let mut mot = [0.0; MAX_ROTORS];
        mixer.add_mixed_input(-0.9, MixAxis::Thrust, &mut mot);
        let (min, max) = mixer.check_channel_saturation(MixAxis::Yaw, &mot);
        // Adding exactly max through the yaw column must land on 1.0.
        let mut probe = mot;
        mixer.add_mixed_input(max, MixAxis::Yaw, &mut probe);
        let top = probe[..4].iter().fold(f32::MIN, |a, &b| a.max(b));
        assert!((top - 1.0).abs() < 1e-6);
        // At the other end of the interval some rotor is again exactly on a
        // bound and none leaves [0, 1].
        let mut probe = mot;
        mixer.add_mixed_input(min, MixAxis::Yaw, &mut probe);
        let top = probe[..4].iter().fold(f32::MIN, |a, &b| a.max(b));
        let bottom = probe[..4].iter().fold(f32::MAX, |a, &b| a.min(b));
        assert!(bottom >= -1e-6 && top <= 1.0 + 1e-6);
        assert!(top >= 1.0 - 1e-6 || bottom <= 1e-6);
    }

    #[test]
    fn grounded_rotors_allow_no_negative_roll_headroom() {
        // With every rotor at zero, any roll command would push half the
        // rotors below zero, so the interval is exactly [0, 0]..[0, 2]
        // intersected over signs, which collapses the lower side to 0.
        let mixer = quad();
        let mot = [0.0; MAX_ROTORS];
        let (min, max) = mixer.check_channel_saturation(MixAxis::Roll, &mot);
        assert_eq!(min, 0.0);
        assert!((max - 0.0).abs() < 1e-6);
    }

    #[test]
    fn out_of_range_rotor_collapses_the_interval() {
        let mixer = quad();
        let mut mot = [0.0; MAX_ROTORS];
        mot[0] = 1.2;
        let (min, max) = mixer.check_channel_saturation(MixAxis::Roll, &mot);
        assert_eq!((min, max), (0.0, 0.0));
    }

    #[test]
    fn lateral_axes_are_unbounded_on_planar_frames() {
        let mixer = quad();
        let mot = [0.0; MAX_ROTORS];
        let (min, max) = mixer.check_channel_saturation(MixAxis::X, &mot);
        assert_eq!(min, f32::NEG_INFINITY);
        assert_eq!(max, f32::INFINITY);
    }

    #[test]
    fn vectored_hex_has_lateral_authority() {
        let mixer = Mixer::new(RotorLayout::Hex6Dof, 6).unwrap();
        let mut mot = [0.0; MAX_ROTORS];
        mixer.add_mixed_input(-0.5, MixAxis::Thrust, &mut mot);
        let (min, max) = mixer.check_channel_saturation(MixAxis::Y, &mot);
        assert!(min.is_finite() && max.is_finite());
        assert!(min < 0.0 && max > 0.0);
    }
}
