//! LaneHub configuration loading
//!
//! Unit configuration lives in flash under two keys: a TOML text file
//! written by the host tooling, and a compact postcard encoding written by
//! the firmware itself. [`ConfigPersistence`] prefers the TOML copy and
//! falls back to the binary one.
//!
//! ```toml
//! version = 1
//!
//! [lane.lane0]
//! max_retract_mm = 750
//! long_move_mm = 100
//! short_move_mm = 10
//! hub_clear_move_mm = 50
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

extern crate alloc;

#[macro_use]
mod fmt;

pub mod loader;
pub mod toml;

pub use crate::loader::{ConfigError, ConfigPersistence};
pub use crate::toml::{parse_config, ParseError};
