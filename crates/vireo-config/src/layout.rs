//! Airframe mixing tables.
//!
//! Each table maps the six axis commands onto per-rotor throttle
//! contributions: `mot[i] += u[axis] * TABLE[axis][i]`. Thrust entries are
//! negative because commands follow the NED convention (Z down, so more
//! thrust is a more negative command). Rows beyond the airframe's rotor
//! count are zero and ignored.

use crate::{MAX_ROTORS, MIX_AXES};

/// Axis index into a mixing table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(usize)]
pub enum MixAxis {
    Thrust = 0,
    Roll = 1,
    Pitch = 2,
    Yaw = 3,
    X = 4,
    Y = 5,
}

pub type MixTable = [[f32; MAX_ROTORS]; MIX_AXES];

/// Supported airframe geometries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RotorLayout {
    QuadX,
    QuadPlus,
    HexX,
    /// Tilt-vectored hex with alternating motor cant, giving direct X/Y
    /// force authority for 6-DOF control.
    Hex6Dof,
}

impl RotorLayout {
    pub const fn rotor_count(self) -> usize {
        match self {
            Self::QuadX | Self::QuadPlus => 4,
            Self::HexX | Self::Hex6Dof => 6,
        }
    }

    pub const fn table(self) -> &'static MixTable {
        match self {
            Self::QuadX => &QUAD_X,
            Self::QuadPlus => &QUAD_PLUS,
            Self::HexX => &HEX_X,
            Self::Hex6Dof => &HEX_6DOF,
        }
    }
}

// Rotor numbering for the quad X frame: 0 front-left (CW), 1 front-right
// (CCW), 2 rear-right (CW), 3 rear-left (CCW). Positive roll drops the
// right side, positive pitch raises the nose, positive yaw is clockwise
// seen from above.
pub static QUAD_X: MixTable = [
    [-1.0, -1.0, -1.0, -1.0, 0.0, 0.0, 0.0, 0.0], // thrust
    [0.5, -0.5, -0.5, 0.5, 0.0, 0.0, 0.0, 0.0],   // roll
    [-0.5, -0.5, 0.5, 0.5, 0.0, 0.0, 0.0, 0.0],   // pitch
    [-0.5, 0.5, -0.5, 0.5, 0.0, 0.0, 0.0, 0.0],   // yaw
    [0.0; MAX_ROTORS],                             // X (no lateral authority)
    [0.0; MAX_ROTORS],                             // Y
];

// Quad + frame: 0 front (CW), 1 right (CCW), 2 rear (CW), 3 left (CCW).
pub static QUAD_PLUS: MixTable = [
    [-1.0, -1.0, -1.0, -1.0, 0.0, 0.0, 0.0, 0.0],
    [0.0, -0.5, 0.0, 0.5, 0.0, 0.0, 0.0, 0.0],
    [-0.5, 0.0, 0.5, 0.0, 0.0, 0.0, 0.0, 0.0],
    [-0.5, 0.5, -0.5, 0.5, 0.0, 0.0, 0.0, 0.0],
    [0.0; MAX_ROTORS],
    [0.0; MAX_ROTORS],
];

// Hex X frame, rotors clockwise from front-right at 30 degrees off the
// nose, alternating spin direction. Roll/pitch entries are the rotor arm
// projections onto the body axes.
pub static HEX_X: MixTable = [
    [-1.0, -1.0, -1.0, -1.0, -1.0, -1.0, 0.0, 0.0],
    [-0.25, -0.5, -0.25, 0.25, 0.5, 0.25, 0.0, 0.0],
    [-0.433, 0.0, 0.433, 0.433, 0.0, -0.433, 0.0, 0.0],
    [-0.5, 0.5, -0.5, 0.5, -0.5, 0.5, 0.0, 0.0],
    [0.0; MAX_ROTORS],
    [0.0; MAX_ROTORS],
];

// Same geometry as HEX_X with alternating 15 degree motor cant. The canted
// thrust lines give the lateral rows their authority.
pub static HEX_6DOF: MixTable = [
    [-1.0, -1.0, -1.0, -1.0, -1.0, -1.0, 0.0, 0.0],
    [-0.25, -0.5, -0.25, 0.25, 0.5, 0.25, 0.0, 0.0],
    [-0.433, 0.0, 0.433, 0.433, 0.0, -0.433, 0.0, 0.0],
    [-0.5, 0.5, -0.5, 0.5, -0.5, 0.5, 0.0, 0.0],
    [0.25, -0.25, 0.25, -0.25, 0.25, -0.25, 0.0, 0.0],
    [-0.25, 0.25, 0.25, -0.25, -0.25, 0.25, 0.0, 0.0],
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planar_layouts_have_no_lateral_authority() {
        for layout in [RotorLayout::QuadX, RotorLayout::QuadPlus, RotorLayout::HexX] {
            let table = layout.table();
            assert_eq!(table[MixAxis::X as usize], [0.0; MAX_ROTORS]);
            assert_eq!(table[MixAxis::Y as usize], [0.0; MAX_ROTORS]);
        }
    }

    #[test]
    fn attitude_rows_are_balanced() {
        // Pure roll/pitch/yaw commands must not change collective thrust.
        for layout in [
            RotorLayout::QuadX,
            RotorLayout::QuadPlus,
            RotorLayout::HexX,
            RotorLayout::Hex6Dof,
        ] {
            let table = layout.table();
            for axis in [MixAxis::Roll, MixAxis::Pitch, MixAxis::Yaw] {
                let sum: f32 = table[axis as usize][..layout.rotor_count()].iter().sum();
                assert!(sum.abs() < 1e-6, "{layout:?} {axis:?} row sums to {sum}");
            }
        }
    }

    #[test]
    fn rotor_counts_match_tables() {
        for layout in [RotorLayout::QuadX, RotorLayout::HexX] {
            let table = layout.table();
            for row in table {
                for &entry in &row[layout.rotor_count()..] {
                    assert_eq!(entry, 0.0);
                }
            }
        }
    }
}
