//! Post-move sensor settling
//!
//! A read taken immediately after a move may still reflect the sensor's
//! pre-move state, so every move is followed by a suspension before the
//! hub sensor is trusted.

use embedded_hal_async::delay::DelayNs;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::request::RequestError;
use crate::traits::PresenceSensor;

/// Fewest agreeing samples that end a consistent settle
///
/// A single sample is no agreement at all and would cut the settle to one
/// poll interval.
pub const MIN_CONSISTENT_READINGS: u8 = 2;

/// How the hub sensor is sampled after a move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SettlePolicy {
    /// Sleep the full settle delay, then read once
    #[default]
    Fixed,
    /// Poll every `poll_ms` and return once `readings` consecutive samples
    /// agree, or when the settle delay has elapsed
    Consistent {
        /// Interval between samples
        poll_ms: u16,
        /// Consecutive identical samples required
        readings: u8,
    },
}

impl SettlePolicy {
    /// Check policy parameters
    pub fn validate(&self) -> Result<(), RequestError> {
        match *self {
            SettlePolicy::Fixed => Ok(()),
            SettlePolicy::Consistent { poll_ms, readings } => {
                if poll_ms == 0 || readings < MIN_CONSISTENT_READINGS {
                    Err(RequestError::InvalidSettlePolicy)
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Suspend until the sensor has settled and return its reading
    ///
    /// Always suspends at least once; never returns before the first wait
    /// has elapsed.
    pub async fn sample<S, D>(&self, settle_ms: u32, sensor: &mut S, delay: &mut D) -> bool
    where
        S: PresenceSensor,
        D: DelayNs,
    {
        match *self {
            SettlePolicy::Fixed => {
                delay.delay_ms(settle_ms).await;
                sensor.is_present()
            }
            SettlePolicy::Consistent { poll_ms, readings } => {
                let mut elapsed_ms: u32 = 0;
                let mut last: Option<bool> = None;
                let mut streak: u8 = 0;

                loop {
                    delay.delay_ms(poll_ms as u32).await;
                    elapsed_ms = elapsed_ms.saturating_add(poll_ms as u32);

                    let reading = sensor.is_present();
                    if last == Some(reading) {
                        streak = streak.saturating_add(1);
                    } else {
                        last = Some(reading);
                        streak = 1;
                    }

                    if streak >= readings || elapsed_ms >= settle_ms {
                        trace!(
                            "Hub sensor settled after {} ms ({} samples agree)",
                            elapsed_ms,
                            streak
                        );
                        return reading;
                    }
                }
            }
        }
    }
}
