//! Configuration types
//!
//! Board-agnostic lane configuration, stored as postcard binary data or
//! TOML text by the configuration loader.

pub mod lane;

pub use lane::*;
