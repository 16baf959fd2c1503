use vireo_config::MAX_ROTORS;

/// Continuously updated vehicle state estimate. Written only by the
/// feedback loop; any other subsystem may read it.
///
/// `yaw` is continuous (unwrapped across revolutions); `roll` and `pitch`
/// stay in (-pi, pi]. `alt` is carried but not estimated in this core.
#[derive(Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CoreState {
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub alt: f32,
    pub v_batt: f32,
    /// Last commanded rotor values, recorded before the final [0, 1] clamp
    /// so saturation shows up in the logs.
    pub motors: [f32; MAX_ROTORS],
}
