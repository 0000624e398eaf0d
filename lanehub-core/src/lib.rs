//! Board-agnostic core logic for the LaneHub filament hub
//!
//! This crate contains the lane logic that does not depend on specific
//! hardware implementations:
//!
//! - Collaborator traits (motion actuator, hub presence sensor, lane stepper)
//! - Sensor-gated incremental retraction controller
//! - Lane unload sequence (retract, then final hub-clearing move)
//! - Configuration type definitions

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod config;
pub mod retract;
pub mod traits;
pub mod unload;
