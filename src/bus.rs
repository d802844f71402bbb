//! The GPIO seam of the 3-wire interface.
//!
//! The driver never touches hardware directly. CE and SCLK are plain
//! [`embedded-hal`] output pins; the shared data line and the busy-wait
//! timer come in through the two traits below, so any GPIO implementation
//! (including a simulated bus in tests) can sit behind the driver.
//!
//! [`embedded-hal`]: https://github.com/rust-embedded/embedded-hal

use embedded_hal::digital::PinState;

/// Bidirectional data line (I/O) of the 3-wire interface.
///
/// The host drives the line while a command or write data is shifted out
/// and releases it to the chip while read data is shifted back in.
pub trait IoPin {
    /// An error that might happen while driving or sampling the line
    type Error;

    /// Reconfigure the line as a host-driven push-pull output.
    fn set_output(&mut self) -> Result<(), Self::Error>;

    /// Release the line so the chip can drive it.
    fn set_input(&mut self) -> Result<(), Self::Error>;

    /// Drive the line level. Only meaningful while configured as output.
    fn write(&mut self, state: PinState) -> Result<(), Self::Error>;

    /// Sample the line level. Only meaningful while configured as input.
    fn read(&mut self) -> Result<bool, Self::Error>;
}

/// For timing `ds1302-rtc` uses the [fugit](https://lib.rs/crates/fugit)
/// crate which only provides `Duration` and `Instant` types. It does not
/// provide any clock or timer traits. Therefore `ds1302-rtc` has its own
/// `Delay` trait that provides all timing capabilities that are needed for
/// the library. User must implement this trait for the timer by itself.
///
/// The driver only ever waits whole microseconds; a timer with >=4 us
/// granularity is enough.
pub trait Delay<const TIMER_HZ: u32> {
    /// An error that might happen during waiting
    type Error;

    /// Return current time `Instant`
    fn now(&mut self) -> fugit::TimerInstantU32<TIMER_HZ>;

    /// Start countdown with a `duration`
    fn start(&mut self, duration: fugit::TimerDurationU32<TIMER_HZ>) -> Result<(), Self::Error>;

    /// Wait until countdown `duration` has expired.
    /// Must return `nb::Error::WouldBlock` if countdown `duration` is not yet over.
    /// Must return `OK(())` as soon as countdown `duration` has expired.
    fn wait(&mut self) -> nb::Result<(), Self::Error>;
}
