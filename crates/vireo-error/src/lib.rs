//! Flash-efficient error handling using thiserror 2.0

#![no_std]

use thiserror::Error;

/// Configuration problems detected at bootstrap. Any of these aborts
/// initialization before the controller can arm.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    #[error("rotor count {0} outside supported range 1..=8")]
    RotorCountOutOfRange(usize),

    #[error("rotor count does not match the selected airframe layout")]
    LayoutMismatch,

    #[error("compensator denominator is empty or leads with zero")]
    DegenerateDenominator,

    #[error("compensator order exceeds the supported maximum")]
    OrderTooHigh,

    #[error("compensator is improper (numerator longer than denominator)")]
    ImproperCompensator,
}

/// Arming state machine errors.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ArmError {
    #[error("controller is already armed")]
    AlreadyArmed,
}

/// Non-fatal compensator warnings.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FilterWarning {
    #[error("prefill is inexact for this compensator; delay line filled best-effort")]
    InexactPrefill,
}

/// Main error type that encompasses all subsystem errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum VireoError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("arming error: {0}")]
    Arm(#[from] ArmError),
}

pub type VireoResult<T> = Result<T, VireoError>;
