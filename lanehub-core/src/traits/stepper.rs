//! Lane stepper driver trait
//!
//! Abstracts the gear stepper that pushes and pulls filament through one
//! lane (TMC2209 over UART, step/dir drivers, etc.)

/// Errors that can occur with stepper operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StepperError {
    /// Communication error with driver (UART/SPI)
    CommunicationError,
    /// Motor stall detected
    StallDetected,
    /// Driver overtemperature
    OverTemperature,
    /// Invalid configuration
    InvalidConfig,
    /// Emergency stop is latched
    EmergencyStop,
}

/// Trait for lane gear steppers
///
/// Moves are relative and non-blocking: [`LaneStepper::start_move`] queues
/// the move and [`LaneStepper::is_moving`] reports completion.
pub trait LaneStepper {
    /// Enable or disable the motor driver
    ///
    /// When disabled, the motor is free to rotate and does not hold position.
    fn enable(&mut self, enabled: bool);

    /// Check if the motor is enabled
    fn is_enabled(&self) -> bool;

    /// Start a relative move of `distance_um` at `speed_mm_s`
    ///
    /// Negative distances retract filament.
    fn start_move(&mut self, distance_um: i32, speed_mm_s: u16) -> Result<(), StepperError>;

    /// Check if a move is in progress
    fn is_moving(&self) -> bool;

    /// Check if a stall has been detected
    fn is_stalled(&self) -> bool;

    /// Check if an emergency stop is latched
    fn is_emergency_stopped(&self) -> bool {
        false
    }

    /// Abort any move in progress
    fn stop(&mut self);
}
