//! Hub presence sensor trait

/// Binary filament-presence sensor at a fixed checkpoint (the hub)
///
/// Readings must reflect the current physical state. Debouncing, if the
/// hardware needs it, belongs to the implementation; callers treat the
/// result as a clean boolean.
pub trait PresenceSensor {
    /// Check if filament is present at the sensor
    ///
    /// Takes `&mut self` because GPIO reads typically require mutable access.
    fn is_present(&mut self) -> bool;

    /// Check if the sensor reports the checkpoint as clear
    fn is_clear(&mut self) -> bool {
        !self.is_present()
    }
}

impl<T: PresenceSensor + ?Sized> PresenceSensor for &mut T {
    fn is_present(&mut self) -> bool {
        T::is_present(self)
    }
}
