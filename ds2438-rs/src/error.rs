use embedded_onewire::OneWireError;

#[derive(Debug, PartialEq, Eq)]
/// DS2438 driver errors.
pub enum Ds2438Error<E> {
    /// 1-Wire bus errors.
    OneWire(OneWireError<E>),
    /// The configuration byte read back after a scratchpad write differs
    /// from the one written. The input selection of the device is unknown
    /// until a write succeeds.
    SetupMismatch {
        /// Byte sent to the scratchpad.
        written: u8,
        /// Byte read back from the scratchpad.
        read: u8,
    },
}

impl<E> From<OneWireError<E>> for Ds2438Error<E> {
    fn from(value: OneWireError<E>) -> Self {
        Self::OneWire(value)
    }
}

/// Results of DS2438 driver calls.
pub type Ds2438Result<T, E> = Result<T, Ds2438Error<E>>;
