//! The feedback controller itself.
//!
//! `FeedbackLoop::tick` is called by the platform's IMU interrupt at
//! `SAMPLE_RATE_HZ` until shutdown. Each tick runs state estimation,
//! safety gates, the compensator march, ESC output and the log append, in
//! that order. State estimation keeps running while disarmed so the rest
//! of the system always sees a live attitude.
//!
//! Sign conventions are NED throughout: Z points down, so thrust commands
//! are negative and the IMU heading is flipped before use.

use libm::{cosf, fabsf};
use vireo_config::{
    ALT_BOUND_D, ALT_BOUND_U, DT, ESC_IDLE_PULSE, MAX_PITCH_COMPONENT, MAX_ROLL_COMPONENT,
    MAX_ROTORS, MAX_THRUST_COMPONENT, MAX_X_COMPONENT, MAX_Y_COMPONENT, MAX_YAW_COMPONENT,
    MIN_THRUST_COMPONENT, MIX_AXES, MixAxis, SOFT_START_SECONDS, Settings, TIP_ANGLE,
};
use vireo_control::{ArmState, CoreState, DiscreteFilter, Mixer, Setpoint, YawTracker};
use vireo_error::{ArmError, ConfigError, VireoResult};
use vireo_hardware::{
    Annunciator, EscDriver, ImuSource, LedColor, RunState, RunStateSource, SetpointSource,
};

use crate::logging::{FlightLogger, LogEntry, LogQueue};

/// The controller context: compensators, estimators, arm state and the
/// injected platform collaborators, owned as one value so the ISR
/// trampoline has a single thing to close over.
pub struct FeedbackLoop<I, S, R, E, A>
where
    I: ImuSource,
    S: SetpointSource,
    R: RunStateSource,
    E: EscDriver,
    A: Annunciator,
{
    imu: I,
    setpoints: S,
    run: R,
    esc: E,
    leds: A,

    settings: Settings,
    mixer: Mixer,
    d_roll: DiscreteFilter,
    d_pitch: DiscreteFilter,
    d_yaw: DiscreteFilter,
    d_alt: DiscreteFilter,
    yaw: YawTracker,

    core: CoreState,
    sp: Setpoint,
    arm_state: ArmState,
    logger: FlightLogger,
    loop_index: u64,

    // Altitude hold needs setup when engaged mid-flight, so remember the
    // previous mode and the last direct throttle for the hand-off.
    last_alt_ctrl_en: bool,
    last_usr_thr: f32,
    prefill_warned: bool,

    // Per-axis outputs of the last march, kept for the log entry.
    u: [f32; MIX_AXES],
}

impl<I, S, R, E, A> FeedbackLoop<I, S, R, E, A>
where
    I: ImuSource,
    S: SetpointSource,
    R: RunStateSource,
    E: EscDriver,
    A: Annunciator,
{
    pub fn new(
        settings: Settings,
        imu: I,
        setpoints: S,
        run: R,
        esc: E,
        leds: A,
        log_queue: &'static LogQueue,
    ) -> VireoResult<Self> {
        if settings.num_rotors == 0 || settings.num_rotors > MAX_ROTORS {
            return Err(ConfigError::RotorCountOutOfRange(settings.num_rotors).into());
        }
        let mixer = Mixer::new(settings.layout, settings.num_rotors)?;

        let mut d_roll = DiscreteFilter::new(&settings.roll_controller)?;
        let mut d_pitch = DiscreteFilter::new(&settings.pitch_controller)?;
        let mut d_yaw = DiscreteFilter::new(&settings.yaw_controller)?;
        let d_alt = DiscreteFilter::new(&settings.altitude_controller)?;
        d_roll.enable_soft_start(SOFT_START_SECONDS);
        d_pitch.enable_soft_start(SOFT_START_SECONDS);
        d_yaw.enable_soft_start(SOFT_START_SECONDS);

        Ok(Self {
            imu,
            setpoints,
            run,
            esc,
            leds,
            settings,
            mixer,
            d_roll,
            d_pitch,
            d_yaw,
            d_alt,
            yaw: YawTracker::new(),
            core: CoreState::default(),
            sp: Setpoint::neutral(),
            arm_state: ArmState::Disarmed,
            logger: FlightLogger::new(log_queue),
            loop_index: 0,
            last_alt_ctrl_en: false,
            last_usr_thr: -MIN_THRUST_COMPONENT,
            prefill_warned: false,
            u: [0.0; MIX_AXES],
        })
    }

    pub fn arm_state(&self) -> ArmState {
        self.arm_state
    }

    pub fn core(&self) -> &CoreState {
        &self.core
    }

    pub fn loop_index(&self) -> u64 {
        self.loop_index
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Arm the controller. Outside callers use this; the safety gates in
    /// `tick` never arm on their own.
    pub fn arm(&mut self) -> Result<(), ArmError> {
        if self.arm_state.is_armed() {
            warn!("trying to arm when controller is already armed");
            return Err(ArmError::AlreadyArmed);
        }
        // Starting a log file can take a while, so do it before touching
        // anything else.
        if self.settings.enable_logging {
            self.logger.start();
        }
        self.zero_out();
        self.leds.set_led(LedColor::Red, false);
        self.leds.set_led(LedColor::Green, true);
        // flag as armed last
        self.arm_state = ArmState::Armed;
        Ok(())
    }

    /// Disarm the controller. Deliberately does not command the motors:
    /// this can be called from any context, and the ISR idles them on the
    /// next tick anyway, which keeps the pulse timing intact.
    pub fn disarm(&mut self) {
        self.arm_state = ArmState::Disarmed;
        self.leds.set_led(LedColor::Red, true);
        self.leds.set_led(LedColor::Green, false);
        self.logger.stop();
    }

    /// Clear all controller memory so a fresh arm starts from scratch.
    fn zero_out(&mut self) {
        self.d_roll.reset();
        self.d_pitch.reset();
        self.d_yaw.reset();
        self.d_alt.reset();

        // If altitude hold engages right after takeoff the hand-off starts
        // from the minimum thrust component.
        self.last_alt_ctrl_en = false;
        self.last_usr_thr = -MIN_THRUST_COMPONENT;

        // Yaw target is relative to wherever the vehicle points at arm.
        let heading = self.imu.sample().tait_bryan[2];
        self.yaw.reset(heading);
    }

    fn idle_motors(&mut self) {
        // Slightly negative throttle keeps the ESCs awake without spinning
        // the motors.
        for i in 1..=self.settings.num_rotors {
            self.esc.send_pulse_normalized(i, ESC_IDLE_PULSE);
        }
    }

    /// One controller step. Called by the IMU interrupt at `SAMPLE_RATE_HZ`.
    pub fn tick(&mut self) {
        let sample = self.imu.sample();

        // State estimation runs regardless of arm state. The IMU X and Y
        // axes are swapped to stay consistent with NED coordinates.
        self.core.roll = sample.tait_bryan[1];
        self.core.pitch = sample.tait_bryan[0];
        self.core.yaw = self.yaw.update(sample.tait_bryan[2]);
        self.core.v_batt = sample.v_batt;
        // TODO: altitude estimate

        self.setpoints.refresh(&mut self.sp, self.arm_state);

        // Check for all conditions that prevent normal running.
        let run = self.run.run_state();
        if run != RunState::Running && self.arm_state.is_armed() {
            // Shouldn't happen if the other subsystems behave; treat a
            // paused process as a safety event.
            warn!("process paused while armed, disarming");
            self.disarm();
        }

        if fabsf(self.core.roll) > TIP_ANGLE || fabsf(self.core.pitch) > TIP_ANGLE {
            if self.arm_state.is_armed() {
                warn!("tipover detected");
                self.disarm();
            }
            self.idle_motors();
            return;
        }

        if run != RunState::Running || !self.arm_state.is_armed() {
            self.idle_motors();
            return;
        }

        // March the individual SISO controllers, starting from zeroed
        // motor signals and adding from there.
        let mut mot = [0.0f32; MAX_ROTORS];
        self.u = [0.0; MIX_AXES];

        let tilt = cosf(self.core.roll) * cosf(self.core.pitch);
        let v_scale = self.settings.v_nominal / self.core.v_batt;

        // Throttle / altitude. When altitude hold engages, prefilling the
        // compensator with the last direct throttle makes the transition
        // smooth; arming sets the hand-off state up the same way for a
        // first takeoff in altitude mode.
        let alt_engaged = cfg!(feature = "altitude-hold") && self.sp.en_alt_ctrl;
        if alt_engaged {
            if !self.last_alt_ctrl_en {
                self.sp.altitude = self.core.alt;
                self.d_alt.reset();
                if self.d_alt.prefill(self.last_usr_thr).is_err() && !self.prefill_warned {
                    warn!("altitude compensator prefill is inexact");
                    self.prefill_warned = true;
                }
                self.last_alt_ctrl_en = true;
            }
            self.sp.altitude += self.sp.altitude_rate * DT;
            self.sp.altitude = self.sp.altitude.clamp(
                self.core.alt - ALT_BOUND_D,
                self.core.alt + ALT_BOUND_U,
            );
            self.d_alt.set_gain(self.d_alt.gain_orig() * v_scale);
            let tmp = self.d_alt.march(self.sp.altitude - self.core.alt) / tilt;
            let u_thr = tmp.clamp(-MAX_THRUST_COMPONENT, -MIN_THRUST_COMPONENT);
            self.u[MixAxis::Thrust as usize] = u_thr;
            self.mixer.add_mixed_input(u_thr, MixAxis::Thrust, &mut mot);
        } else {
            // Direct throttle, compensated for tilt so vertical authority
            // holds up while banked.
            let u_thr =
                (self.sp.z_throttle / tilt).clamp(-MAX_THRUST_COMPONENT, -MIN_THRUST_COMPONENT);
            self.u[MixAxis::Thrust as usize] = u_thr;
            self.mixer.add_mixed_input(u_thr, MixAxis::Thrust, &mut mot);
            // Remember the user throttle in case altitude hold engages.
            self.last_usr_thr = self.sp.z_throttle;
            self.last_alt_ctrl_en = false;
        }

        // Roll, pitch, yaw. The order matters: each axis sees the headroom
        // actually remaining after the axes before it.
        if self.sp.en_rpy_ctrl {
            self.u[MixAxis::Roll as usize] = march_axis(
                &mut self.d_roll,
                &self.mixer,
                MixAxis::Roll,
                MAX_ROLL_COMPONENT,
                v_scale,
                self.sp.roll - self.core.roll,
                &mut mot,
            );

            self.u[MixAxis::Pitch as usize] = march_axis(
                &mut self.d_pitch,
                &self.mixer,
                MixAxis::Pitch,
                MAX_PITCH_COMPONENT,
                v_scale,
                self.sp.pitch - self.core.pitch,
                &mut mot,
            );

            // The yaw target advances by the commanded rate, then the
            // compensator tracks it against the continuous estimate.
            self.sp.yaw += DT * self.sp.yaw_rate;
            self.u[MixAxis::Yaw as usize] = march_axis(
                &mut self.d_yaw,
                &self.mixer,
                MixAxis::Yaw,
                MAX_YAW_COMPONENT,
                v_scale,
                self.sp.yaw - self.core.yaw,
                &mut mot,
            );
        }

        // Lateral force inputs, only with 6-DOF authority enabled.
        if self.sp.en_6dof {
            self.u[MixAxis::Y as usize] = add_lateral(
                &self.mixer,
                MixAxis::Y,
                MAX_Y_COMPONENT,
                self.sp.y_throttle,
                &mut mot,
            );
            self.u[MixAxis::X as usize] = add_lateral(
                &self.mixer,
                MixAxis::X,
                MAX_X_COMPONENT,
                self.sp.x_throttle,
                &mut mot,
            );
        }

        // Send the ESC pulses immediately at the end of the march. The
        // unclamped values go to the core state first so saturation shows
        // up in the logs.
        for i in 0..self.settings.num_rotors {
            self.core.motors[i] = mot[i];
            let out = mot[i].clamp(0.0, 1.0);
            self.esc.send_pulse_normalized(i + 1, out);
        }

        self.logger.push(LogEntry {
            loop_index: self.loop_index,
            alt: self.core.alt,
            roll: self.core.roll,
            pitch: self.core.pitch,
            yaw: self.core.yaw,
            v_batt: self.core.v_batt,
            u_thr: self.u[MixAxis::Thrust as usize],
            u_roll: self.u[MixAxis::Roll as usize],
            u_pitch: self.u[MixAxis::Pitch as usize],
            u_yaw: self.u[MixAxis::Yaw as usize],
            u_x: self.u[MixAxis::X as usize],
            u_y: self.u[MixAxis::Y as usize],
            motors: self.core.motors,
        });

        self.loop_index += 1;
    }
}

/// One attitude axis: clamp the mixer headroom to the axis authority
/// limit, hand it to the compensator as the anti-windup window, rescale
/// the gain for battery sag, march, and mix the output in.
fn march_axis(
    filter: &mut DiscreteFilter,
    mixer: &Mixer,
    axis: MixAxis,
    limit: f32,
    v_scale: f32,
    err: f32,
    mot: &mut [f32; MAX_ROTORS],
) -> f32 {
    let (min, max) = clamped_headroom(mixer, axis, limit, mot);
    filter.enable_saturation(min, max);
    filter.set_gain(filter.gain_orig() * v_scale);
    let u = filter.march(err);
    mixer.add_mixed_input(u, axis, mot);
    u
}

/// Lateral axes pass the commanded force through the same headroom
/// bookkeeping without a compensator.
fn add_lateral(
    mixer: &Mixer,
    axis: MixAxis,
    limit: f32,
    cmd: f32,
    mot: &mut [f32; MAX_ROTORS],
) -> f32 {
    let (min, max) = clamped_headroom(mixer, axis, limit, mot);
    let u = if cmd < min {
        min
    } else if cmd > max {
        max
    } else {
        cmd
    };
    mixer.add_mixed_input(u, axis, mot);
    u
}

fn clamped_headroom(
    mixer: &Mixer,
    axis: MixAxis,
    limit: f32,
    mot: &[f32; MAX_ROTORS],
) -> (f32, f32) {
    let (mut min, mut max) = mixer.check_channel_saturation(axis, mot);
    if max > limit {
        max = limit;
    }
    if min < -limit {
        min = -limit;
    }
    if min > max {
        // Earlier axes consumed the whole channel; no authority this tick.
        min = 0.0;
        max = 0.0;
    }
    (min, max)
}
