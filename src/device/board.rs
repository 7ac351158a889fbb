//! Board port: where the bus and the optional pins come from

use core::convert::Infallible;
use core::fmt::Debug;
use core::future::Future;

use embedded_hal::digital::{ErrorType, OutputPin};
use embedded_hal_async::digital::Wait;

use crate::ll::RegisterBus;

/// Hardware resources of one sensor
///
/// A session acquires the bus and, when enabled in the
/// [`DeviceConfig`](super::DeviceConfig), the LED and the interrupt line.
/// Everything acquired is handed back through the `release_*` methods when
/// setup fails or the session stops, so the next attempt can acquire again.
///
/// # Example Implementation
///
/// ```ignore
/// struct Rp2350Board {
///     i2c: Option<I2c<'static, I2C0, Async>>,
///     int_pin: Option<Input<'static>>,
/// }
///
/// impl Board for Rp2350Board {
///     type Bus = I2cInterface<I2c<'static, I2C0, Async>>;
///     type Led = Unavailable;
///     type Interrupt = Input<'static>;
///     type Error = BoardError;
///
///     async fn acquire_bus(&mut self) -> Result<Self::Bus, BoardError> {
///         let i2c = self.i2c.take().ok_or(BoardError::InUse)?;
///         Ok(I2cInterface { i2c })
///     }
///
///     fn release_bus(&mut self, bus: Self::Bus) {
///         self.i2c = Some(bus.i2c);
///     }
///     // ...
/// }
/// ```
pub trait Board {
    /// Register transport to the chip
    type Bus: RegisterBus;
    /// Flash LED
    type Led: OutputPin;
    /// Line driven by the chip INT output, high while the interrupt is asserted
    ///
    /// The chip pulls INT low; a board wiring the raw pin inverts it here.
    type Interrupt: Wait;
    /// Acquisition error
    type Error: Debug;

    /// Open the bus
    fn acquire_bus(&mut self) -> impl Future<Output = Result<Self::Bus, Self::Error>>;

    /// Claim the LED pin
    fn acquire_led(&mut self) -> impl Future<Output = Result<Self::Led, Self::Error>>;

    /// Claim the interrupt pin
    fn acquire_interrupt(&mut self) -> impl Future<Output = Result<Self::Interrupt, Self::Error>>;

    /// Give the bus back
    fn release_bus(&mut self, _bus: Self::Bus) {}

    /// Give the LED back
    fn release_led(&mut self, _led: Self::Led) {}

    /// Give the interrupt pin back
    fn release_interrupt(&mut self, _interrupt: Self::Interrupt) {}
}

/// Pin for boards without an LED or interrupt line
///
/// Writes succeed and waits never complete.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unavailable;

impl ErrorType for Unavailable {
    type Error = Infallible;
}

impl OutputPin for Unavailable {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Wait for Unavailable {
    async fn wait_for_high(&mut self) -> Result<(), Self::Error> {
        core::future::pending().await
    }

    async fn wait_for_low(&mut self) -> Result<(), Self::Error> {
        core::future::pending().await
    }

    async fn wait_for_rising_edge(&mut self) -> Result<(), Self::Error> {
        core::future::pending().await
    }

    async fn wait_for_falling_edge(&mut self) -> Result<(), Self::Error> {
        core::future::pending().await
    }

    async fn wait_for_any_edge(&mut self) -> Result<(), Self::Error> {
        core::future::pending().await
    }
}
