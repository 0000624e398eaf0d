//! Lane and unit configuration
//!
//! Distances are whole millimetres here; the retraction controller works
//! in micrometres and [`LaneConfig::retraction_request`] converts.

use heapless::{String, Vec};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::retract::{RequestError, RetractionRequest, SettlePolicy};

/// Current configuration format version
pub const CONFIG_VERSION: u8 = 1;

/// Maximum label length
pub const MAX_LABEL_LEN: usize = 16;

/// Maximum lanes per unit
pub const MAX_LANES: usize = 8;

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LaneConfigError {
    /// Lane has no name
    EmptyName,
    /// Two lanes share a name
    DuplicateName,
    /// A move speed is zero
    ZeroSpeed,
    /// Retraction parameters are invalid
    Retraction(RequestError),
}

impl From<RequestError> for LaneConfigError {
    fn from(e: RequestError) -> Self {
        LaneConfigError::Retraction(e)
    }
}

/// Per-lane motion configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LaneConfig {
    /// Lane name/identifier
    pub name: String<MAX_LABEL_LEN>,
    /// Maximum retraction distance (bowden length) in mm
    pub max_retract_mm: u32,
    /// Long-move step size in mm
    pub long_move_mm: u16,
    /// Short-move step size in mm
    pub short_move_mm: u16,
    /// Final move after the hub clears, in mm (0 disables it)
    pub hub_clear_move_mm: u16,
    /// Share of the bowden length covered by long moves (1-100)
    pub precision_pct: u8,
    /// Settle delay between a move and the hub sensor read
    pub settle_ms: u32,
    /// Sensor poll interval while settling (0 sleeps the full settle delay)
    pub settle_poll_ms: u16,
    /// Consecutive agreeing reads that end settling early (at least 2)
    pub settle_readings: u8,
    /// Extra short moves allowed past the bowden length
    pub fallback_steps: u8,
    /// Long-move speed in mm/s
    pub long_speed_mm_s: u16,
    /// Short-move speed in mm/s
    pub short_speed_mm_s: u16,
    /// Slack added to the computed duration of a move before it times out
    pub move_timeout_margin_ms: u32,
}

impl Default for LaneConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            max_retract_mm: 750,
            long_move_mm: 100,
            short_move_mm: 10,
            hub_clear_move_mm: 50,
            precision_pct: crate::retract::DEFAULT_PRECISION_PCT,
            settle_ms: crate::retract::DEFAULT_SETTLE_MS,
            settle_poll_ms: 0,
            settle_readings: 2,
            fallback_steps: crate::retract::DEFAULT_FALLBACK_STEPS,
            long_speed_mm_s: 150,
            short_speed_mm_s: 50,
            move_timeout_margin_ms: 2000,
        }
    }
}

impl LaneConfig {
    /// Create a lane config with default motion parameters
    pub fn named(name: &str) -> Self {
        let mut config = Self::default();
        // Names longer than MAX_LABEL_LEN are left empty and fail validation
        let _ = config.name.push_str(name);
        config
    }

    /// Build the retraction request for this lane
    pub fn retraction_request(&self) -> RetractionRequest {
        RetractionRequest::new(
            self.max_retract_mm.saturating_mul(1000),
            self.long_move_mm as u32 * 1000,
            self.short_move_mm as u32 * 1000,
        )
        .with_precision_pct(self.precision_pct)
        .with_settle_ms(self.settle_ms)
        .with_fallback_steps(self.fallback_steps)
        .with_settle_policy(self.settle_policy())
    }

    /// Settle policy selected by `settle_poll_ms`
    pub fn settle_policy(&self) -> SettlePolicy {
        if self.settle_poll_ms == 0 {
            SettlePolicy::Fixed
        } else {
            SettlePolicy::Consistent {
                poll_ms: self.settle_poll_ms,
                readings: self.settle_readings,
            }
        }
    }

    /// Final hub-clearing move in micrometres
    pub fn hub_clear_move_um(&self) -> u32 {
        self.hub_clear_move_mm as u32 * 1000
    }

    /// Validate the lane configuration
    pub fn validate(&self) -> Result<(), LaneConfigError> {
        if self.name.is_empty() {
            return Err(LaneConfigError::EmptyName);
        }
        if self.long_speed_mm_s == 0 || self.short_speed_mm_s == 0 {
            return Err(LaneConfigError::ZeroSpeed);
        }
        self.retraction_request().validate()?;
        Ok(())
    }
}

/// Complete unit configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UnitConfig {
    /// Configuration format version
    pub version: u8,
    /// Configured lanes
    pub lanes: Vec<LaneConfig, MAX_LANES>,
}

impl Default for UnitConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitConfig {
    /// Create an empty configuration at the current version
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            lanes: Vec::new(),
        }
    }

    /// Look up a lane by name
    pub fn lane(&self, name: &str) -> Option<&LaneConfig> {
        self.lanes.iter().find(|l| l.name.as_str() == name)
    }

    /// Validate every lane and check for duplicate names
    pub fn validate(&self) -> Result<(), LaneConfigError> {
        for (i, lane) in self.lanes.iter().enumerate() {
            lane.validate()?;
            if self.lanes[..i].iter().any(|other| other.name == lane.name) {
                return Err(LaneConfigError::DuplicateName);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_lane_is_valid() {
        let lane = LaneConfig::named("lane1");
        assert_eq!(lane.name.as_str(), "lane1");
        assert_eq!(lane.validate(), Ok(()));
    }

    #[test]
    fn test_retraction_request_units() {
        let lane = LaneConfig {
            max_retract_mm: 100,
            long_move_mm: 40,
            short_move_mm: 5,
            precision_pct: 80,
            settle_ms: 50,
            fallback_steps: 2,
            ..LaneConfig::named("lane1")
        };

        let request = lane.retraction_request();
        assert_eq!(request.max_distance_um, 100_000);
        assert_eq!(request.coarse_step_um, 40_000);
        assert_eq!(request.fine_step_um, 5_000);
        assert_eq!(request.precision_pct, 80);
        assert_eq!(request.settle_ms, 50);
        assert_eq!(request.fallback_steps, 2);
    }

    #[test]
    fn test_settle_policy_selection() {
        let lane = LaneConfig::named("lane1");
        assert_eq!(lane.retraction_request().settle, SettlePolicy::Fixed);

        let lane = LaneConfig {
            settle_poll_ms: 10,
            settle_readings: 3,
            ..LaneConfig::named("lane1")
        };
        assert_eq!(
            lane.retraction_request().settle,
            SettlePolicy::Consistent {
                poll_ms: 10,
                readings: 3
            }
        );

        let lane = LaneConfig {
            settle_poll_ms: 10,
            settle_readings: 1,
            ..LaneConfig::named("lane1")
        };
        assert_eq!(
            lane.validate(),
            Err(LaneConfigError::Retraction(RequestError::InvalidSettlePolicy))
        );
    }

    #[test]
    fn test_validation_errors() {
        assert_eq!(
            LaneConfig::default().validate(),
            Err(LaneConfigError::EmptyName)
        );

        let lane = LaneConfig {
            short_speed_mm_s: 0,
            ..LaneConfig::named("lane1")
        };
        assert_eq!(lane.validate(), Err(LaneConfigError::ZeroSpeed));

        let lane = LaneConfig {
            short_move_mm: 0,
            ..LaneConfig::named("lane1")
        };
        assert_eq!(
            lane.validate(),
            Err(LaneConfigError::Retraction(RequestError::ZeroFineStep))
        );

        let lane = LaneConfig {
            max_retract_mm: u32::MAX,
            ..LaneConfig::named("lane1")
        };
        assert_eq!(
            lane.validate(),
            Err(LaneConfigError::Retraction(RequestError::DistanceTooLarge))
        );
    }

    #[test]
    fn test_name_too_long_fails_validation() {
        let lane = LaneConfig::named("a_name_that_is_far_too_long");
        assert_eq!(lane.validate(), Err(LaneConfigError::EmptyName));
    }

    #[test]
    fn test_unit_lookup_and_duplicates() {
        let mut unit = UnitConfig::new();
        unit.lanes.push(LaneConfig::named("lane1")).unwrap();
        unit.lanes.push(LaneConfig::named("lane2")).unwrap();

        assert_eq!(unit.version, CONFIG_VERSION);
        assert!(unit.lane("lane2").is_some());
        assert!(unit.lane("lane3").is_none());
        assert_eq!(unit.validate(), Ok(()));

        unit.lanes.push(LaneConfig::named("lane1")).unwrap();
        assert_eq!(unit.validate(), Err(LaneConfigError::DuplicateName));
    }
}
