//! Line-level and byte-level shifting of the 3-wire bus.
//!
//! One byte moves least significant bit first. The chip latches the data
//! line on the rising clock edge and presents read data after the falling
//! edge; there is no acknowledgement or checksum anywhere in the protocol,
//! so nothing at this layer can tell a missing chip from a stuck line.

use embedded_hal::digital::{OutputPin, PinState};
use fugit::ExtU32;

use crate::bus::{Delay, IoPin};
use crate::registers::Block;
use crate::{Ds1302Error, DS1302};

impl<CE, IO, SCLK, D, const TIMER_HZ: u32> DS1302<CE, IO, SCLK, D, TIMER_HZ>
where
    CE: OutputPin,
    IO: IoPin,
    SCLK: OutputPin,
    D: Delay<TIMER_HZ>,
{
    fn delay_us(&mut self, us: u32) {
        self.delay.start(us.micros()).ok();
        nb::block!(self.delay.wait()).ok();
    }

    /// Bring all three lines to the idle state: everything low, data line
    /// host-driven. Tolerates an unknown prior line state.
    fn idle_lines(&mut self) -> Result<(), Ds1302Error> {
        self.sclk.set_low().map_err(|_| Ds1302Error::ClockError)?;
        self.ce.set_low().map_err(|_| Ds1302Error::ChipSelectError)?;
        self.io.set_output().map_err(|_| Ds1302Error::DataError)?;
        self.io
            .write(PinState::Low)
            .map_err(|_| Ds1302Error::DataError)
    }

    /// Open a transaction frame: idle lines, CE high, tCC setup wait.
    fn open_frame(&mut self) -> Result<(), Ds1302Error> {
        self.idle_lines()?;
        self.ce
            .set_high()
            .map_err(|_| Ds1302Error::ChipSelectError)?;
        self.delay_us(4); // tCC = 4us for 2V
        Ok(())
    }

    /// Close the frame: CE low, then the CE inactive time before the next one.
    fn close_frame(&mut self) -> Result<(), Ds1302Error> {
        self.ce.set_low().map_err(|_| Ds1302Error::ChipSelectError)?;
        self.delay_us(4); // tCWH = 4us for 2V
        Ok(())
    }

    fn write_bit(&mut self, bit: bool) -> Result<(), Ds1302Error> {
        self.io
            .write(PinState::from(bit))
            .map_err(|_| Ds1302Error::DataError)?;
        self.sclk.set_high().map_err(|_| Ds1302Error::ClockError)?;
        self.sclk.set_low().map_err(|_| Ds1302Error::ClockError)
    }

    fn read_bit(&mut self) -> Result<bool, Ds1302Error> {
        self.sclk.set_high().map_err(|_| Ds1302Error::ClockError)?;
        self.sclk.set_low().map_err(|_| Ds1302Error::ClockError)?;
        self.io.read().map_err(|_| Ds1302Error::ReadError)
    }

    /// Shift one byte out, least significant bit first.
    fn write_bits(&mut self, byte: u8) -> Result<(), Ds1302Error> {
        for i in 0..8 {
            self.write_bit((byte >> i) & 1 == 1)?;
        }
        Ok(())
    }

    /// Shift one byte in, least significant bit first.
    fn read_bits(&mut self) -> Result<u8, Ds1302Error> {
        let mut byte = 0;
        for i in 0..8 {
            if self.read_bit()? {
                byte |= 1 << i;
            }
        }
        Ok(byte)
    }

    /// Single-register read transaction addressed by `command`.
    pub(crate) fn read_reg(&mut self, command: u8) -> Result<u8, Ds1302Error> {
        self.open_frame()?;
        self.write_bits(command)?;
        self.io.set_input().map_err(|_| Ds1302Error::DataError)?;
        let byte = self.read_bits()?;
        self.io.set_output().map_err(|_| Ds1302Error::DataError)?;
        self.close_frame()?;
        Ok(byte)
    }

    /// Single-register write transaction addressed by `command`.
    pub(crate) fn write_reg(&mut self, command: u8, byte: u8) -> Result<(), Ds1302Error> {
        self.open_frame()?;
        self.write_bits(command)?;
        self.io
            .write(PinState::Low)
            .map_err(|_| Ds1302Error::DataError)?;
        self.write_bits(byte)?;
        self.close_frame()
    }

    /// Read an entire register block in one chip-enable assertion.
    ///
    /// The block's raw register contents land in `buf[..block.len()]`
    /// untranslated; callers needing semantic values go through
    /// [`read_field`](Self::read_field) instead. `buf` must hold at least
    /// `block.len()` bytes.
    pub fn read_burst(&mut self, block: Block, buf: &mut [u8]) -> Result<(), Ds1302Error> {
        if buf.len() < block.len() {
            return Err(Ds1302Error::Parameter);
        }
        self.open_frame()?;
        self.write_bits(block.read_cmd())?;
        self.io.set_input().map_err(|_| Ds1302Error::DataError)?;
        for slot in buf[..block.len()].iter_mut() {
            *slot = self.read_bits()?;
        }
        self.io.set_output().map_err(|_| Ds1302Error::DataError)?;
        self.close_frame()
    }

    /// Write an entire register block in one chip-enable assertion.
    ///
    /// `buf[..block.len()]` is written as raw register contents, no value
    /// translation. Write-protect is cleared before the burst and restored
    /// afterwards, exactly as a scalar write does.
    pub fn write_burst(&mut self, block: Block, buf: &[u8]) -> Result<(), Ds1302Error> {
        if buf.len() < block.len() {
            return Err(Ds1302Error::Parameter);
        }
        self.unprotected(|rtc| {
            rtc.open_frame()?;
            rtc.write_bits(block.write_cmd())?;
            rtc.io
                .write(PinState::Low)
                .map_err(|_| Ds1302Error::DataError)?;
            for &byte in &buf[..block.len()] {
                rtc.write_bits(byte)?;
            }
            rtc.close_frame()
        })
    }
}
