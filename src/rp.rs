//! [`IoPin`] adapter for RP2040/RP235x SIO pins.
//!
//! The RP GPIO types encode pin direction in the type, so the shared data
//! line is moved between its output and pull-up input configurations as the
//! bus direction changes. CE and SCLK need no adapter; the HAL pins already
//! implement [`embedded_hal::digital::OutputPin`].

#[cfg(feature = "rp2040")]
use rp2040_hal as hal;

#[cfg(feature = "rp2350")]
use rp235x_hal as hal;

use embedded_hal::digital::{InputPin, OutputPin, PinState};

use hal::gpio::{
    FunctionSio, FunctionSioInput, FunctionSioOutput, Pin, PinId, PullDown, PullUp, SioInput,
    SioOutput, ValidFunction,
};

use crate::bus::IoPin;

enum Dir<I>
where
    I: PinId + ValidFunction<FunctionSio<SioInput>> + ValidFunction<FunctionSio<SioOutput>>,
{
    Output(Pin<I, FunctionSioOutput, PullDown>),
    Input(Pin<I, FunctionSioInput, PullUp>),
}

/// Bidirectional data line on one SIO pin.
pub struct SioIoPin<I>
where
    I: PinId + ValidFunction<FunctionSio<SioInput>> + ValidFunction<FunctionSio<SioOutput>>,
{
    pin: Option<Dir<I>>,
}

impl<I> SioIoPin<I>
where
    I: PinId + ValidFunction<FunctionSio<SioInput>> + ValidFunction<FunctionSio<SioOutput>>,
{
    /// Wrap an output-configured pin.
    pub fn new(pin: Pin<I, FunctionSioOutput, PullDown>) -> Self {
        SioIoPin {
            pin: Some(Dir::Output(pin)),
        }
    }

    /// Release the pin in its output configuration.
    pub fn free(mut self) -> Pin<I, FunctionSioOutput, PullDown> {
        match self.pin.take().unwrap() {
            Dir::Output(pin) => pin,
            Dir::Input(pin) => pin.reconfigure(),
        }
    }
}

impl<I> IoPin for SioIoPin<I>
where
    I: PinId + ValidFunction<FunctionSio<SioInput>> + ValidFunction<FunctionSio<SioOutput>>,
{
    type Error = core::convert::Infallible;

    fn set_output(&mut self) -> Result<(), Self::Error> {
        let pin = match self.pin.take().unwrap() {
            Dir::Input(pin) => pin.reconfigure(),
            Dir::Output(pin) => pin,
        };
        self.pin = Some(Dir::Output(pin));
        Ok(())
    }

    fn set_input(&mut self) -> Result<(), Self::Error> {
        let pin = match self.pin.take().unwrap() {
            Dir::Output(pin) => pin.into_pull_up_input(),
            Dir::Input(pin) => pin,
        };
        self.pin = Some(Dir::Input(pin));
        Ok(())
    }

    fn write(&mut self, state: PinState) -> Result<(), Self::Error> {
        if let Some(Dir::Output(pin)) = self.pin.as_mut() {
            pin.set_state(state)?;
        }
        Ok(())
    }

    fn read(&mut self) -> Result<bool, Self::Error> {
        match self.pin.as_mut() {
            Some(Dir::Input(pin)) => pin.is_high(),
            _ => Ok(false),
        }
    }
}
