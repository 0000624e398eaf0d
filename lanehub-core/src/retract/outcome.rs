//! Terminal outcomes of a retraction

use core::fmt;

use super::request::RequestError;
use crate::traits::ActuatorError;

/// Why a retraction stopped without reaching a cleared state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AbortReason {
    /// Request failed validation; no move was issued
    InvalidRequest(RequestError),
    /// A move failed; filament position is unknown and no further move was issued
    ActuatorFailure(ActuatorError),
}

impl From<RequestError> for AbortReason {
    fn from(e: RequestError) -> Self {
        AbortReason::InvalidRequest(e)
    }
}

impl From<ActuatorError> for AbortReason {
    fn from(e: ActuatorError) -> Self {
        AbortReason::ActuatorFailure(e)
    }
}

/// Result of one retraction
///
/// Every call produces exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RetractionOutcome {
    /// Hub sensor reported clear
    ClearedBySensor {
        /// Total retracted distance in micrometres
        distance_um: u32,
    },
    /// Ceiling and fallback budget exhausted with the sensor still reporting
    /// filament. Not an error, but the configured distance undershoots the
    /// real clear point and the lane should be recalibrated.
    ClearedAtLimit {
        /// Total retracted distance in micrometres
        distance_um: u32,
    },
    /// Retraction stopped early
    Aborted {
        /// Cause of the abort
        reason: AbortReason,
    },
}

impl RetractionOutcome {
    /// Check if the hub sensor confirmed the hub is clear
    pub fn is_sensor_confirmed(&self) -> bool {
        matches!(self, Self::ClearedBySensor { .. })
    }

    /// Check if the retraction reached a cleared state (confirmed or at limit)
    pub fn is_cleared(&self) -> bool {
        matches!(
            self,
            Self::ClearedBySensor { .. } | Self::ClearedAtLimit { .. }
        )
    }

    /// Check if the retraction was aborted
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted { .. })
    }

    /// Retracted distance, if the retraction completed
    pub fn distance_um(&self) -> Option<u32> {
        match *self {
            Self::ClearedBySensor { distance_um } | Self::ClearedAtLimit { distance_um } => {
                Some(distance_um)
            }
            Self::Aborted { .. } => None,
        }
    }

    /// Abort reason, if aborted
    pub fn abort_reason(&self) -> Option<AbortReason> {
        match *self {
            Self::Aborted { reason } => Some(reason),
            _ => None,
        }
    }
}

/// Micrometres rendered as millimetres with three decimals
struct Millimetres(u32);

impl fmt::Display for Millimetres {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:03} mm", self.0 / 1000, self.0 % 1000)
    }
}

impl fmt::Display for RetractionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::ClearedBySensor { distance_um } => write!(
                f,
                "retraction complete: cleared by sensor after {}",
                Millimetres(distance_um)
            ),
            Self::ClearedAtLimit { distance_um } => write!(
                f,
                "retraction complete: cleared at limit after {}, hub sensor still \
                 reports filament (recalibrate bowden length)",
                Millimetres(distance_um)
            ),
            Self::Aborted {
                reason: AbortReason::InvalidRequest(e),
            } => write!(f, "retraction aborted: invalid request ({:?})", e),
            Self::Aborted {
                reason: AbortReason::ActuatorFailure(e),
            } => write!(f, "retraction aborted: actuator failure ({:?})", e),
        }
    }
}
