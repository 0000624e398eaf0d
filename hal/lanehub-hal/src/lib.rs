//! LaneHub Hardware Abstraction Layer
//!
//! Traits that chip-specific HALs implement so the lane logic and
//! configuration loader stay board-agnostic.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  lanehub-config / lanehub-drivers       │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  lanehub-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!            chip-specific storage
//! ```
//!
//! Digital I/O and delays come from `embedded-hal` / `embedded-hal-async`
//! directly; this crate only adds what those crates do not cover.

#![no_std]
#![deny(unsafe_code)]

pub mod flash;

pub use flash::{FlashError, FlashStorage, StorageKey};
