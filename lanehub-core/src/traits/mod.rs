//! Collaborator traits
//!
//! These traits define the interface between the lane logic and
//! hardware-specific implementations. The cooperative delay used between
//! moves is [`embedded_hal_async::delay::DelayNs`].

pub mod actuator;
pub mod sensor;
pub mod stepper;

pub use actuator::{ActuatorError, MotionActuator, SpeedClass};
pub use sensor::PresenceSensor;
pub use stepper::{LaneStepper, StepperError};
