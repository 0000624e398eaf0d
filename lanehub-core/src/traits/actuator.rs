//! Motion actuator trait
//!
//! A motion actuator issues one bounded filament move on a lane. It is the
//! only way the retraction controller touches the motor.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::stepper::StepperError;

/// Speed class of a single move
///
/// The actual feed rate for each class comes from lane configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SpeedClass {
    /// Fast move used for the bulk of the bowden travel
    Long,
    /// Slow move used near the expected stopping point
    Short,
}

/// Errors reported by a motion actuator
///
/// Any of these leaves the physical filament position unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ActuatorError {
    /// Move did not complete within the bounded timeout
    Timeout,
    /// Motor stall detected during the move
    Stalled,
    /// Emergency stop latched by a watchdog
    EmergencyStop,
    /// Driver refused the move (disabled, bad configuration)
    Rejected,
    /// Communication with the driver failed
    CommunicationError,
}

impl From<StepperError> for ActuatorError {
    fn from(e: StepperError) -> Self {
        match e {
            StepperError::CommunicationError => ActuatorError::CommunicationError,
            StepperError::StallDetected => ActuatorError::Stalled,
            StepperError::EmergencyStop => ActuatorError::EmergencyStop,
            StepperError::OverTemperature | StepperError::InvalidConfig => {
                ActuatorError::Rejected
            }
        }
    }
}

/// Trait for issuing bounded lane moves
///
/// `move_by` returns once the move has been carried out by the hardware
/// layer. It must not outlive a bounded timeout: a hang is reported as
/// [`ActuatorError::Timeout`], never as a pending future.
#[allow(async_fn_in_trait)]
pub trait MotionActuator {
    /// Move the lane filament by `distance_um` micrometres
    ///
    /// Negative distances retract toward the spool, positive distances feed
    /// toward the toolhead.
    async fn move_by(&mut self, distance_um: i32, speed: SpeedClass) -> Result<(), ActuatorError>;
}

impl<T: MotionActuator + ?Sized> MotionActuator for &mut T {
    async fn move_by(&mut self, distance_um: i32, speed: SpeedClass) -> Result<(), ActuatorError> {
        T::move_by(self, distance_um, speed).await
    }
}
