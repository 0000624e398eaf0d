//! Presence sensor implementations

pub mod hub_switch;

pub use hub_switch::HubSwitch;
