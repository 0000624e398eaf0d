//! Stepper-backed motion actuator
//!
//! Drives a lane gear stepper one relative move at a time. The move is
//! started on the driver and then polled for completion; a move that runs
//! past its expected duration plus a margin is stopped and reported as a
//! timeout rather than left pending.

use embedded_hal_async::delay::DelayNs;
use lanehub_core::config::LaneConfig;
use lanehub_core::traits::{ActuatorError, LaneStepper, MotionActuator, SpeedClass};

/// Default completion poll interval
pub const DEFAULT_POLL_INTERVAL_MS: u32 = 10;

/// Stepper actuator configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepperActuatorConfig {
    /// Speed for [`SpeedClass::Long`] moves in mm/s
    pub long_speed_mm_s: u16,
    /// Speed for [`SpeedClass::Short`] moves in mm/s
    pub short_speed_mm_s: u16,
    /// Interval between completion checks
    pub poll_interval_ms: u32,
    /// Slack added to the nominal move duration before timing out
    pub timeout_margin_ms: u32,
}

impl Default for StepperActuatorConfig {
    fn default() -> Self {
        Self::from_lane(&LaneConfig::default())
    }
}

impl StepperActuatorConfig {
    /// Take speeds and timeout margin from a lane configuration
    pub fn from_lane(lane: &LaneConfig) -> Self {
        Self {
            long_speed_mm_s: lane.long_speed_mm_s,
            short_speed_mm_s: lane.short_speed_mm_s,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            timeout_margin_ms: lane.move_timeout_margin_ms,
        }
    }

    /// Speed for a speed class
    pub fn speed_mm_s(&self, speed: SpeedClass) -> u16 {
        match speed {
            SpeedClass::Long => self.long_speed_mm_s,
            SpeedClass::Short => self.short_speed_mm_s,
        }
    }

    /// Poll interval actually used, at least 1 ms so the timeout advances
    pub fn effective_poll_interval_ms(&self) -> u32 {
        self.poll_interval_ms.max(1)
    }

    /// Timeout for a move of `distance_um` at `speed_mm_s`
    ///
    /// um / (mm/s) is exactly milliseconds.
    pub fn move_timeout_ms(&self, distance_um: i32, speed_mm_s: u16) -> u32 {
        let nominal_ms = distance_um.unsigned_abs() / (speed_mm_s.max(1) as u32);
        nominal_ms.saturating_add(self.timeout_margin_ms)
    }
}

/// Motion actuator over a [`LaneStepper`]
pub struct StepperActuator<M, D> {
    stepper: M,
    delay: D,
    config: StepperActuatorConfig,
}

impl<M: LaneStepper, D: DelayNs> StepperActuator<M, D> {
    /// Create a new stepper actuator
    pub fn new(stepper: M, delay: D, config: StepperActuatorConfig) -> Self {
        Self {
            stepper,
            delay,
            config,
        }
    }

    /// Get access to the underlying stepper
    pub fn stepper(&self) -> &M {
        &self.stepper
    }

    /// Get mutable access to the underlying stepper
    pub fn stepper_mut(&mut self) -> &mut M {
        &mut self.stepper
    }

    /// Get the actuator configuration
    pub fn config(&self) -> &StepperActuatorConfig {
        &self.config
    }

    /// Stop the stepper and report `error`
    fn abort(&mut self, error: ActuatorError) -> Result<(), ActuatorError> {
        self.stepper.stop();
        Err(error)
    }
}

impl<M: LaneStepper, D: DelayNs> MotionActuator for StepperActuator<M, D> {
    async fn move_by(&mut self, distance_um: i32, speed: SpeedClass) -> Result<(), ActuatorError> {
        if self.stepper.is_emergency_stopped() {
            return Err(ActuatorError::EmergencyStop);
        }

        let speed_mm_s = self.config.speed_mm_s(speed);
        if speed_mm_s == 0 {
            return Err(ActuatorError::Rejected);
        }

        if !self.stepper.is_enabled() {
            debug!("Enabling lane stepper");
            self.stepper.enable(true);
        }

        self.stepper.start_move(distance_um, speed_mm_s)?;

        let timeout_ms = self.config.move_timeout_ms(distance_um, speed_mm_s);
        let poll_interval_ms = self.config.effective_poll_interval_ms();
        let mut waited_ms: u32 = 0;

        while self.stepper.is_moving() {
            if self.stepper.is_emergency_stopped() {
                warn!("Emergency stop during move of {} um", distance_um);
                return self.abort(ActuatorError::EmergencyStop);
            }
            if self.stepper.is_stalled() {
                warn!("Stall during move of {} um", distance_um);
                return self.abort(ActuatorError::Stalled);
            }
            if waited_ms >= timeout_ms {
                warn!("Move of {} um timed out after {} ms", distance_um, waited_ms);
                return self.abort(ActuatorError::Timeout);
            }

            self.delay.delay_ms(poll_interval_ms).await;
            waited_ms = waited_ms.saturating_add(poll_interval_ms);
        }

        // Stall flag can latch as the final steps complete
        if self.stepper.is_stalled() {
            return Err(ActuatorError::Stalled);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;
    use embassy_futures::block_on;
    use lanehub_core::traits::StepperError;

    /// Stepper that reports moving for a fixed number of polls
    #[derive(Default)]
    struct MockStepper {
        enabled: bool,
        polls_per_move: u32,
        polls_left: Cell<u32>,
        stall_on_poll: Option<u32>,
        polls: Cell<u32>,
        estop: bool,
        start_error: Option<StepperError>,
        stopped: bool,
        started: Vec<(i32, u16)>,
    }

    impl LaneStepper for MockStepper {
        fn enable(&mut self, enabled: bool) {
            self.enabled = enabled;
        }

        fn is_enabled(&self) -> bool {
            self.enabled
        }

        fn start_move(&mut self, distance_um: i32, speed_mm_s: u16) -> Result<(), StepperError> {
            if let Some(e) = self.start_error {
                return Err(e);
            }
            self.started.push((distance_um, speed_mm_s));
            self.polls_left.set(self.polls_per_move);
            self.polls.set(0);
            Ok(())
        }

        fn is_moving(&self) -> bool {
            let left = self.polls_left.get();
            if left == 0 {
                return false;
            }
            self.polls_left.set(left - 1);
            self.polls.set(self.polls.get() + 1);
            true
        }

        fn is_stalled(&self) -> bool {
            matches!(self.stall_on_poll, Some(at) if self.polls.get() >= at)
        }

        fn is_emergency_stopped(&self) -> bool {
            self.estop
        }

        fn stop(&mut self) {
            self.stopped = true;
            self.polls_left.set(0);
        }
    }

    #[derive(Default)]
    struct MockDelay {
        waited_ms: u32,
    }

    impl DelayNs for MockDelay {
        async fn delay_ns(&mut self, ns: u32) {
            self.waited_ms += ns / 1_000_000;
        }

        async fn delay_ms(&mut self, ms: u32) {
            self.waited_ms += ms;
        }
    }

    fn config() -> StepperActuatorConfig {
        StepperActuatorConfig {
            long_speed_mm_s: 100,
            short_speed_mm_s: 20,
            poll_interval_ms: 10,
            timeout_margin_ms: 50,
        }
    }

    fn actuator(stepper: MockStepper) -> StepperActuator<MockStepper, MockDelay> {
        StepperActuator::new(stepper, MockDelay::default(), config())
    }

    #[test]
    fn test_speed_mapping_and_timeout() {
        let config = config();
        assert_eq!(config.speed_mm_s(SpeedClass::Long), 100);
        assert_eq!(config.speed_mm_s(SpeedClass::Short), 20);
        // 40 mm at 100 mm/s = 400 ms nominal
        assert_eq!(config.move_timeout_ms(-40_000, 100), 450);
    }

    #[test]
    fn test_from_lane() {
        let lane = LaneConfig {
            long_speed_mm_s: 120,
            short_speed_mm_s: 30,
            move_timeout_margin_ms: 1500,
            ..LaneConfig::named("lane1")
        };
        let config = StepperActuatorConfig::from_lane(&lane);
        assert_eq!(config.long_speed_mm_s, 120);
        assert_eq!(config.short_speed_mm_s, 30);
        assert_eq!(config.timeout_margin_ms, 1500);
        assert_eq!(config.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
    }

    #[test]
    fn test_move_completes_and_enables_stepper() {
        let mut actuator = actuator(MockStepper {
            polls_per_move: 3,
            ..Default::default()
        });

        assert_eq!(block_on(actuator.move_by(-40_000, SpeedClass::Long)), Ok(()));
        assert!(actuator.stepper().enabled);
        assert_eq!(actuator.stepper().started, vec![(-40_000, 100)]);
        assert!(!actuator.stepper().stopped);
        assert_eq!(actuator.delay.waited_ms, 30);
    }

    #[test]
    fn test_short_speed_used_for_short_moves() {
        let mut actuator = actuator(MockStepper::default());

        assert_eq!(block_on(actuator.move_by(-5_000, SpeedClass::Short)), Ok(()));
        assert_eq!(actuator.stepper().started, vec![(-5_000, 20)]);
    }

    #[test]
    fn test_never_finishing_move_times_out() {
        let mut actuator = actuator(MockStepper {
            polls_per_move: u32::MAX,
            ..Default::default()
        });

        // 5 mm at 20 mm/s = 250 ms nominal + 50 ms margin
        assert_eq!(
            block_on(actuator.move_by(-5_000, SpeedClass::Short)),
            Err(ActuatorError::Timeout)
        );
        assert_eq!(actuator.delay.waited_ms, 300);
        assert!(actuator.stepper().stopped);
    }

    #[test]
    fn test_zero_poll_interval_still_times_out() {
        let mut actuator = StepperActuator::new(
            MockStepper {
                polls_per_move: u32::MAX,
                ..Default::default()
            },
            MockDelay::default(),
            StepperActuatorConfig {
                poll_interval_ms: 0,
                ..config()
            },
        );

        // 5 mm at 20 mm/s = 250 ms nominal + 50 ms margin, in 1 ms polls
        assert_eq!(
            block_on(actuator.move_by(-5_000, SpeedClass::Short)),
            Err(ActuatorError::Timeout)
        );
        assert_eq!(actuator.delay.waited_ms, 300);
        assert_eq!(actuator.stepper().polls.get(), 301);
        assert!(actuator.stepper().stopped);
    }

    #[test]
    fn test_stall_stops_move() {
        let mut actuator = actuator(MockStepper {
            polls_per_move: 10,
            stall_on_poll: Some(2),
            ..Default::default()
        });

        assert_eq!(
            block_on(actuator.move_by(-5_000, SpeedClass::Short)),
            Err(ActuatorError::Stalled)
        );
        assert!(actuator.stepper().stopped);
    }

    #[test]
    fn test_emergency_stop_refuses_move() {
        let mut actuator = actuator(MockStepper {
            estop: true,
            ..Default::default()
        });

        assert_eq!(
            block_on(actuator.move_by(-5_000, SpeedClass::Short)),
            Err(ActuatorError::EmergencyStop)
        );
        assert!(actuator.stepper().started.is_empty());
    }

    #[test]
    fn test_start_error_mapped() {
        let mut actuator = actuator(MockStepper {
            start_error: Some(StepperError::CommunicationError),
            ..Default::default()
        });

        assert_eq!(
            block_on(actuator.move_by(-5_000, SpeedClass::Short)),
            Err(ActuatorError::CommunicationError)
        );
    }

    #[test]
    fn test_zero_speed_rejected() {
        let mut actuator = StepperActuator::new(
            MockStepper::default(),
            MockDelay::default(),
            StepperActuatorConfig {
                short_speed_mm_s: 0,
                ..config()
            },
        );

        assert_eq!(
            block_on(actuator.move_by(-5_000, SpeedClass::Short)),
            Err(ActuatorError::Rejected)
        );
        assert!(actuator.stepper().started.is_empty());
    }
}
