//! Retraction request parameters and validation

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::settle::SettlePolicy;

/// Default share of `max_distance_um` covered by coarse moves (percent)
pub const DEFAULT_PRECISION_PCT: u8 = 80;

/// Default number of extra short moves once the ceiling is reached
pub const DEFAULT_FALLBACK_STEPS: u8 = 3;

/// Hard ceiling on fallback moves, independent of the request
pub const MAX_FALLBACK_STEPS: u8 = 5;

/// Default settle delay between a move and the next sensor read
pub const DEFAULT_SETTLE_MS: u32 = 100;

/// Largest accepted distance (10 m), keeps every move within `i32`
pub const MAX_RETRACT_UM: u32 = 10_000_000;

/// Reasons a retraction request is rejected before any move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RequestError {
    /// Maximum distance is zero
    ZeroMaxDistance,
    /// Coarse step distance is zero
    ZeroCoarseStep,
    /// Fine step distance is zero
    ZeroFineStep,
    /// Precision percentage outside 1..=100
    PrecisionOutOfRange,
    /// A distance exceeds [`MAX_RETRACT_UM`]
    DistanceTooLarge,
    /// Settle polling interval is zero or fewer than two readings are required
    InvalidSettlePolicy,
}

/// Parameters for one retraction
///
/// Distances are in micrometres. `coarse_step_um >= fine_step_um` is
/// expected but not required; the loop terminates either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RetractionRequest {
    /// Safety ceiling for the main loop (the configured bowden length)
    pub max_distance_um: u32,
    /// Step used while far from the expected stopping point
    pub coarse_step_um: u32,
    /// Step used near the expected stopping point and during fallback
    pub fine_step_um: u32,
    /// Share of `max_distance_um` covered in the coarse phase (1-100)
    pub precision_pct: u8,
    /// Delay between a move and the following sensor read
    pub settle_ms: u32,
    /// Extra short moves allowed after the ceiling (clamped to [`MAX_FALLBACK_STEPS`])
    pub fallback_steps: u8,
    /// How the sensor is sampled after each move
    pub settle: SettlePolicy,
}

impl RetractionRequest {
    /// Create a request with default precision, settle and fallback settings
    pub const fn new(max_distance_um: u32, coarse_step_um: u32, fine_step_um: u32) -> Self {
        Self {
            max_distance_um,
            coarse_step_um,
            fine_step_um,
            precision_pct: DEFAULT_PRECISION_PCT,
            settle_ms: DEFAULT_SETTLE_MS,
            fallback_steps: DEFAULT_FALLBACK_STEPS,
            settle: SettlePolicy::Fixed,
        }
    }

    /// Single fixed-distance move, the open-loop behaviour expressed as
    /// a configuration: one coarse step covering the whole distance.
    pub const fn fixed_distance(distance_um: u32, fine_step_um: u32) -> Self {
        let mut request = Self::new(distance_um, distance_um, fine_step_um);
        request.precision_pct = 100;
        request
    }

    /// Set the coarse phase share (percent)
    pub const fn with_precision_pct(mut self, pct: u8) -> Self {
        self.precision_pct = pct;
        self
    }

    /// Set the settle delay
    pub const fn with_settle_ms(mut self, settle_ms: u32) -> Self {
        self.settle_ms = settle_ms;
        self
    }

    /// Set the number of fallback moves
    pub const fn with_fallback_steps(mut self, steps: u8) -> Self {
        self.fallback_steps = steps;
        self
    }

    /// Set the settle policy
    pub const fn with_settle_policy(mut self, settle: SettlePolicy) -> Self {
        self.settle = settle;
        self
    }

    /// Check preconditions
    ///
    /// A request that fails here must not issue any move.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.max_distance_um == 0 {
            return Err(RequestError::ZeroMaxDistance);
        }
        if self.coarse_step_um == 0 {
            return Err(RequestError::ZeroCoarseStep);
        }
        if self.fine_step_um == 0 {
            return Err(RequestError::ZeroFineStep);
        }
        if self.precision_pct == 0 || self.precision_pct > 100 {
            return Err(RequestError::PrecisionOutOfRange);
        }
        if self.max_distance_um > MAX_RETRACT_UM
            || self.coarse_step_um > MAX_RETRACT_UM
            || self.fine_step_um > MAX_RETRACT_UM
        {
            return Err(RequestError::DistanceTooLarge);
        }
        self.settle.validate()
    }

    /// Distance at which the precision phase begins
    pub fn precision_boundary_um(&self) -> u32 {
        // u64 intermediate: MAX_RETRACT_UM * 100 overflows u32
        (self.max_distance_um as u64 * self.precision_pct as u64 / 100) as u32
    }

    /// Effective number of fallback moves
    pub fn fallback_cap(&self) -> u8 {
        self.fallback_steps.min(MAX_FALLBACK_STEPS)
    }

    /// Upper bound on moves issued for this request
    ///
    /// Every main-loop move except the last covers at least the smaller of
    /// the two step sizes, so the main loop needs at most
    /// `ceil(max / min(coarse, fine))` moves before the fallback phase.
    pub fn move_budget(&self) -> u32 {
        let smallest = self.coarse_step_um.min(self.fine_step_um).max(1);
        self.max_distance_um.div_ceil(smallest) + self.fallback_cap() as u32
    }

    /// Upper bound on total retracted distance, fallback included
    pub fn distance_ceiling_um(&self) -> u32 {
        self.max_distance_um
            .saturating_add(self.fine_step_um.saturating_mul(self.fallback_cap() as u32))
    }
}
