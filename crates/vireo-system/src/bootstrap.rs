//! One-shot controller wiring.

use vireo_error::VireoResult;
use vireo_hardware::{
    Annunciator, EscDriver, ImuSource, RunStateSource, SetpointSource, SettingsProvider,
};

use crate::feedback::FeedbackLoop;
use crate::logging::LOG_CHANNEL;

/// Build the controller from persisted settings and the platform's
/// peripheral implementations. Call once at program start.
///
/// Settings problems abort here with a `ConfigError` before anything can
/// arm. On success the loop comes back disarmed with the red annunciator
/// lit; the platform then registers `FeedbackLoop::tick` as its IMU
/// interrupt handler and drains `LOG_CHANNEL` from the log consumer.
pub fn init<P, I, S, R, E, A>(
    provider: &P,
    imu: I,
    setpoints: S,
    run: R,
    esc: E,
    leds: A,
) -> VireoResult<FeedbackLoop<I, S, R, E, A>>
where
    P: SettingsProvider,
    I: ImuSource,
    S: SetpointSource,
    R: RunStateSource,
    E: EscDriver,
    A: Annunciator,
{
    let settings = provider.load()?;
    let mut feedback = FeedbackLoop::new(settings, imu, setpoints, run, esc, leds, &LOG_CHANNEL)?;

    // Make sure everything is disarmed before the interrupt starts firing.
    feedback.disarm();

    info!(
        "feedback controller ready: {} rotors, logging {}",
        settings.num_rotors, settings.enable_logging
    );
    Ok(feedback)
}
