//! Motion actuator implementations

pub mod stepper;

pub use stepper::{StepperActuator, StepperActuatorConfig};
