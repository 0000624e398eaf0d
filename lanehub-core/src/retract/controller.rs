//! Retraction controller
//!
//! Closed-loop unload from the toolhead back through the hub:
//!
//! ```text
//!  coarse phase (LONG)        precision phase (SHORT)   fallback (SHORT)
//! |=====|=====|=====|=====|=|=|=|=|=|                  |-|-|-|
//! 0                       boundary                 max   cap
//! ```
//!
//! Each step is one move followed by a settle and a hub sensor read. The
//! loop stops at the first read that reports the hub clear. Worst-case
//! overshoot past the real clear point is one fine step once the precision
//! phase has begun.

use embedded_hal_async::delay::DelayNs;

use super::outcome::{AbortReason, RetractionOutcome};
use super::request::RetractionRequest;
use crate::traits::{MotionActuator, PresenceSensor, SpeedClass};

/// Retraction phase, derived from the distance already travelled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// Large steps, far from the expected stopping point
    Coarse,
    /// Small steps near the expected stopping point
    Precision,
    /// Bounded extra small steps past the configured ceiling
    Fallback,
}

impl Phase {
    /// Speed class used for moves in this phase
    pub fn speed(self) -> SpeedClass {
        match self {
            Phase::Coarse => SpeedClass::Long,
            Phase::Precision | Phase::Fallback => SpeedClass::Short,
        }
    }
}

/// Progress of one retraction, owned by the controller for one call
#[derive(Debug, Clone, Copy, Default)]
struct Progress {
    /// Total retracted distance, non-decreasing
    total_um: u32,
    /// Moves issued so far
    moves: u32,
}

impl Progress {
    /// Phase and step size of the next main-loop move
    ///
    /// Steps never exceed the remaining budget, so `total_um` never passes
    /// `max_distance_um` in the main loop.
    fn next_step(&self, request: &RetractionRequest) -> (Phase, u32) {
        let remaining = request.max_distance_um - self.total_um;
        if self.total_um < request.precision_boundary_um() {
            (Phase::Coarse, request.coarse_step_um.min(remaining))
        } else {
            (Phase::Precision, request.fine_step_um.min(remaining))
        }
    }

    fn advance(&mut self, step_um: u32) {
        self.total_um = self.total_um.saturating_add(step_um);
        self.moves += 1;
    }
}

/// Sensor-gated incremental retraction controller
///
/// Borrows one lane's actuator, hub sensor and delay source for the
/// duration of a retraction; exclusive borrows keep a single controller
/// active per lane. Holds no state between calls.
pub struct RetractionController<'a, A, S, D> {
    actuator: &'a mut A,
    sensor: &'a mut S,
    delay: &'a mut D,
}

impl<'a, A, S, D> RetractionController<'a, A, S, D>
where
    A: MotionActuator,
    S: PresenceSensor,
    D: DelayNs,
{
    /// Create a controller over one lane's collaborators
    pub fn new(actuator: &'a mut A, sensor: &'a mut S, delay: &'a mut D) -> Self {
        Self {
            actuator,
            sensor,
            delay,
        }
    }

    /// Retract until the hub sensor clears, the budget runs out, or a move fails
    ///
    /// Runs to completion; there is no cancellation. An emergency stop
    /// surfaces as an actuator failure on the next move.
    pub async fn retract(&mut self, request: &RetractionRequest) -> RetractionOutcome {
        let outcome = match self.run(request).await {
            Ok(outcome) => outcome,
            Err(reason) => RetractionOutcome::Aborted { reason },
        };
        log_outcome(&outcome);
        outcome
    }

    async fn run(&mut self, request: &RetractionRequest) -> Result<RetractionOutcome, AbortReason> {
        request.validate()?;

        let mut progress = Progress::default();

        // First read happens before any motion, no settle needed
        let mut present = self.sensor.is_present();
        if !present {
            debug!("Hub already clear, no retraction needed");
        }

        while present && progress.total_um < request.max_distance_um {
            let (phase, step_um) = progress.next_step(request);
            self.step(phase, step_um, &progress).await?;
            progress.advance(step_um);
            present = self.settle(request).await;
        }

        if !present {
            return Ok(RetractionOutcome::ClearedBySensor {
                distance_um: progress.total_um,
            });
        }

        debug!(
            "Ceiling of {} um reached with filament at hub, starting fallback",
            request.max_distance_um
        );

        for _ in 0..request.fallback_cap() {
            self.step(Phase::Fallback, request.fine_step_um, &progress).await?;
            progress.advance(request.fine_step_um);

            if !self.settle(request).await {
                return Ok(RetractionOutcome::ClearedBySensor {
                    distance_um: progress.total_um,
                });
            }
        }

        Ok(RetractionOutcome::ClearedAtLimit {
            distance_um: progress.total_um,
        })
    }

    /// Issue one retract move
    async fn step(
        &mut self,
        phase: Phase,
        step_um: u32,
        progress: &Progress,
    ) -> Result<(), AbortReason> {
        trace!(
            "Retract move {}: {} um ({:?}) at {} um",
            progress.moves + 1,
            step_um,
            phase,
            progress.total_um
        );

        // Validated distances are at most MAX_RETRACT_UM, well inside i32
        let distance_um = -(step_um as i32);
        self.actuator
            .move_by(distance_um, phase.speed())
            .await
            .map_err(|e| {
                error!("Retract move failed after {} um: {:?}", progress.total_um, e);
                AbortReason::from(e)
            })
    }

    async fn settle(&mut self, request: &RetractionRequest) -> bool {
        request
            .settle
            .sample(request.settle_ms, &mut *self.sensor, &mut *self.delay)
            .await
    }
}

/// Completion log line, distinguishing sensor-confirmed from limit stops
fn log_outcome(outcome: &RetractionOutcome) {
    match *outcome {
        RetractionOutcome::ClearedBySensor { distance_um } => {
            info!("Retraction complete: cleared by sensor after {} um", distance_um);
        }
        RetractionOutcome::ClearedAtLimit { distance_um } => {
            warn!(
                "Retraction complete: cleared at limit after {} um, hub sensor still triggered",
                distance_um
            );
        }
        RetractionOutcome::Aborted { reason } => {
            error!("Retraction aborted: {:?}", reason);
        }
    }
}
