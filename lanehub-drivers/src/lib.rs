//! Hardware driver adapters
//!
//! Concrete implementations of the collaborator traits defined in
//! lanehub-core:
//!
//! - Hub presence switch on an `embedded-hal` input pin
//! - Motion actuator over a lane gear stepper, with bounded move timeout

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod actuator;
pub mod sensor;
