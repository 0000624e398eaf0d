//! Sensor-gated incremental retraction
//!
//! Retracts filament from the toolhead back through the hub in bounded
//! increments, sampling the hub presence sensor after every move and
//! stopping as soon as it reports the hub clear.

pub mod controller;
pub mod outcome;
pub mod request;
pub mod settle;

pub use controller::{Phase, RetractionController};
pub use outcome::{AbortReason, RetractionOutcome};
pub use request::{
    RequestError, RetractionRequest, DEFAULT_FALLBACK_STEPS, DEFAULT_PRECISION_PCT,
    DEFAULT_SETTLE_MS, MAX_FALLBACK_STEPS, MAX_RETRACT_UM,
};
pub use settle::{SettlePolicy, MIN_CONSISTENT_READINGS};
