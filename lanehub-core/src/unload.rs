//! Lane unload sequence
//!
//! Retracts the lane until the hub sensor clears, then backs the filament
//! off the hub by the configured hub-clearing distance so the next lane can
//! pass through.

use embedded_hal_async::delay::DelayNs;

use crate::config::LaneConfig;
use crate::retract::{RetractionController, RetractionOutcome};
use crate::traits::{ActuatorError, MotionActuator, PresenceSensor, SpeedClass};

/// State of the final hub-clearing move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HubClearMove {
    /// Not issued: retraction was not sensor-confirmed, or the distance is zero
    NotIssued,
    /// Move completed
    Completed {
        /// Distance moved in micrometres
        distance_um: u32,
    },
    /// Move failed
    Failed(ActuatorError),
}

/// Result of a lane unload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UnloadReport {
    /// Outcome of the sensor-gated retraction
    pub retraction: RetractionOutcome,
    /// Final hub-clearing move
    pub hub_clear: HubClearMove,
}

impl UnloadReport {
    /// Check if the lane is fully unloaded past the hub
    pub fn is_complete(&self) -> bool {
        self.retraction.is_sensor_confirmed()
            && !matches!(self.hub_clear, HubClearMove::Failed(_))
    }
}

/// Unload a lane back to (and off) the hub
///
/// The hub-clearing move only follows a sensor-confirmed retraction; after
/// a limit stop the filament position relative to the hub is unknown. A hub
/// that is already clear still gets the move, since the tip can sit just
/// past the switch and inside the hub body.
pub async fn unload_to_hub<A, S, D>(
    lane: &LaneConfig,
    actuator: &mut A,
    sensor: &mut S,
    delay: &mut D,
) -> UnloadReport
where
    A: MotionActuator,
    S: PresenceSensor,
    D: DelayNs,
{
    debug!("Unloading lane {}", lane.name.as_str());

    let request = lane.retraction_request();
    let retraction = RetractionController::new(&mut *actuator, sensor, delay)
        .retract(&request)
        .await;

    let hub_clear_um = lane.hub_clear_move_um();
    let hub_clear = if !retraction.is_sensor_confirmed() || hub_clear_um == 0 {
        HubClearMove::NotIssued
    } else {
        // Hub clear distance is at most u16::MAX mm, inside i32 in micrometres
        match actuator
            .move_by(-(hub_clear_um as i32), SpeedClass::Short)
            .await
        {
            Ok(()) => HubClearMove::Completed {
                distance_um: hub_clear_um,
            },
            Err(e) => {
                error!("Hub clearing move failed: {:?}", e);
                HubClearMove::Failed(e)
            }
        }
    };

    UnloadReport {
        retraction,
        hub_clear,
    }
}
