//! Hub filament switch
//!
//! Mechanical or optical switch at the hub that closes while filament is
//! inside. Reads are taken as-is; the retraction controller's settle delay
//! covers mechanical bounce after a move.

use embedded_hal::digital::InputPin;
use lanehub_core::traits::PresenceSensor;

/// Hub switch on a digital input pin
pub struct HubSwitch<P> {
    pin: P,
    /// Pin reads low while filament is present
    inverted: bool,
    /// Failed pin reads since creation
    read_errors: u32,
}

impl<P: InputPin> HubSwitch<P> {
    /// Create a hub switch that reads high while filament is present
    pub fn new(pin: P) -> Self {
        Self {
            pin,
            inverted: false,
            read_errors: 0,
        }
    }

    /// Create a hub switch that reads low while filament is present
    pub fn inverted(pin: P) -> Self {
        Self {
            pin,
            inverted: true,
            read_errors: 0,
        }
    }

    /// Number of failed pin reads
    pub fn read_errors(&self) -> u32 {
        self.read_errors
    }

    /// Release the underlying pin
    pub fn release(self) -> P {
        self.pin
    }
}

impl<P: InputPin> PresenceSensor for HubSwitch<P> {
    /// A failed read reports filament present so the hub is never falsely
    /// declared clear; the retraction ceiling still bounds the unload.
    fn is_present(&mut self) -> bool {
        match self.pin.is_high() {
            Ok(high) => high != self.inverted,
            Err(_) => {
                self.read_errors = self.read_errors.saturating_add(1);
                warn!("Hub switch read failed ({} total)", self.read_errors);
                true
            }
        }
    }
}
