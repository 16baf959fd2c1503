/// Controller arm state. The feedback loop refuses to drive rotors unless
/// armed; everything else (state estimation, safety gates) runs regardless.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ArmState {
    #[default]
    Disarmed,
    Armed,
}

impl ArmState {
    pub fn is_armed(self) -> bool {
        self == Self::Armed
    }
}
