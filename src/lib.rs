//! DS1302 real time clock-calendar platform agnostic driver
//!
//! # About
//!
//! The DS1302 trickle-charge timekeeping chip contains a real-time
//! clock/calendar and 31 bytes of static RAM. It communicates with a host
//! over a simple 3-wire serial interface: a clock line, a shared
//! bidirectional data line and a chip-enable line. The real-time
//! clock/calendar provides seconds, minutes, hours, day, date, month, and
//! year information, and operates in either the 24-hour or 12-hour format
//! with an AM/PM indicator.
//!
//! Datasheet: [DS1302](https://datasheets.maximintegrated.com/en/ds/DS1302.pdf)
//!
//! ## Driver features:
//! - Reading/setting clock/calendar data with field-by-field validation
//! - 12-hour (AM/PM) or 24-hour format, switchable while the chip is working
//! - Single-field and burst access to the clock and RAM register files
//! - Programmable trickle charger configuration
//! - 31 x 8 battery-backed general-purpose RAM operations
//!
//! The chip's write-protect bit is handled transparently: every register
//! write briefly clears it and sets it again afterwards, so the chip is
//! only ever writable for the duration of a single operation.
//!
//! The three bus lines are injected rather than owned: CE and SCLK are
//! [`embedded-hal`] output pins, the data line implements [`bus::IoPin`]
//! and timing comes from [`bus::Delay`]. Anything that satisfies those
//! traits can sit on the other end, including a simulated chip in tests.
//! On RP2040/RP235x parts the `rp2040`/`rp2350` Cargo features provide a
//! ready-made data-line adapter in [`rp`].
//!
//! The bus has no acknowledgement or checksum, so a missing or misbehaving
//! chip cannot be detected here; it only shows up as implausible values.
//!
//! [`embedded-hal`]: https://github.com/rust-embedded/embedded-hal

#![no_std]

#[cfg(all(feature = "rp2040", feature = "rp2350"))]
compile_error!("You must not enable both the `rp2040` and `rp2350` Cargo features.");

pub mod bus;
pub mod registers;

mod codec;
mod transport;

#[cfg(any(feature = "rp2040", feature = "rp2350"))]
pub mod rp;

#[cfg(test)]
mod sim;

pub use bus::{Delay, IoPin};
pub use registers::{Block, Ds, Field, Rs, TrickleCharger};

use embedded_hal::digital::OutputPin;

use registers::{RAM_LAST_INDEX, RAM_READ_BASE, RAM_WRITE_BASE};

/// DS1302 driver error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Ds1302Error {
    /// Out-of-range argument, e.g. a RAM index past the last register or a
    /// burst buffer smaller than the block.
    Parameter,
    /// The clock line could not be driven.
    ClockError,
    /// The data line could not be driven or reconfigured.
    DataError,
    /// The data line could not be sampled.
    ReadError,
    /// The chip-enable line could not be driven.
    ChipSelectError,
    InvalidSeconds,
    InvalidMinutes,
    InvalidHours,
    InvalidDate,
    InvalidMonth,
    InvalidYear,
    InvalidDay,
    /// 12-hour mode needs an AM/PM marker.
    MissingAmPm,
}

/// Hour format: 12-hour (AM/PM) or 24-hour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    Hour24,
    Hour12,
}

impl Mode {
    pub(crate) fn bit(self) -> u8 {
        match self {
            Mode::Hour24 => 0,
            Mode::Hour12 => 1,
        }
    }
}

/// AM/PM marker, meaningful only in 12-hour mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AmPm {
    Am,
    Pm,
}

impl AmPm {
    pub(crate) fn bit(self) -> u8 {
        match self {
            AmPm::Am => 0,
            AmPm::Pm => 1,
        }
    }
}

/// Full clock/calendar snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DateTime {
    /// 0-59
    pub seconds: u8,
    /// 0-59
    pub minutes: u8,
    /// 0-23 in `Hour24` mode, 1-12 in `Hour12` mode
    pub hours: u8,
    /// Day of the month, 1-31
    pub date: u8,
    /// 1-12
    pub month: u8,
    /// Years since 2000, 0-99
    pub year: u8,
    /// Day of the week, 1-7
    pub day: u8,
    pub mode: Mode,
    /// Required in `Hour12` mode, ignored otherwise
    pub am_pm: Option<AmPm>,
}

/// DS1302 RTC driver over three GPIO lines.
///
/// CE must be asserted high during a read or a write. Note: previous data
/// sheet revisions referred to CE as RST.
///
/// All operations are blocking and the driver holds no register cache; the
/// chip itself is the only state. The caller must make sure no two logical
/// transactions overlap, which `&mut self` already enforces for a single
/// driver instance.
pub struct DS1302<CE, IO, SCLK, D, const TIMER_HZ: u32> {
    pub(crate) ce: CE,
    pub(crate) io: IO,
    pub(crate) sclk: SCLK,
    pub(crate) delay: D,
}

impl<CE, IO, SCLK, D, const TIMER_HZ: u32> DS1302<CE, IO, SCLK, D, TIMER_HZ>
where
    CE: OutputPin,
    IO: IoPin,
    SCLK: OutputPin,
    D: Delay<TIMER_HZ>,
{
    /// Wrap the three bus lines and the delay timer.
    ///
    /// Does not touch the bus; the lines are brought to a known state at
    /// the start of every transaction instead.
    pub fn new(ce: CE, io: IO, sclk: SCLK, delay: D) -> Self {
        DS1302 {
            ce,
            io,
            sclk,
            delay,
        }
    }

    /// Release the pins and the timer.
    pub fn free(self) -> (CE, IO, SCLK, D) {
        (self.ce, self.io, self.sclk, self.delay)
    }

    /// Return the current time and date.
    ///
    /// `am_pm` is only populated while the chip runs in 12-hour mode.
    pub fn get_time(&mut self) -> Result<DateTime, Ds1302Error> {
        let seconds = self.read_field(Field::Seconds)?;
        let minutes = self.read_field(Field::Minutes)?;
        let hours = self.read_field(Field::Hours)?;
        let date = self.read_field(Field::Date)?;
        let month = self.read_field(Field::Month)?;
        let year = self.read_field(Field::Year)?;
        let day = self.read_field(Field::Day)?;
        let mode = if self.read_field(Field::HourFormat)? != 0 {
            Mode::Hour12
        } else {
            Mode::Hour24
        };
        let am_pm = match mode {
            Mode::Hour12 => Some(if self.read_field(Field::AmPm)? != 0 {
                AmPm::Pm
            } else {
                AmPm::Am
            }),
            Mode::Hour24 => None,
        };
        Ok(DateTime {
            seconds,
            minutes,
            hours,
            date,
            month,
            year,
            day,
            mode,
            am_pm,
        })
    }

    /// Validate and write a full time and date.
    ///
    /// Every field is checked before anything goes on the wire; no register
    /// is touched when validation fails. The hour format is written before
    /// the hour value because the hour encoding depends on the format bit
    /// already stored on-chip, and the AM/PM marker goes last, only in
    /// 12-hour mode. This ordering is a correctness requirement.
    pub fn set_time(&mut self, time: DateTime) -> Result<(), Ds1302Error> {
        Self::validate(&time)?;
        self.write_field(Field::HourFormat, time.mode.bit())?;
        self.write_field(Field::Seconds, time.seconds)?;
        self.write_field(Field::Minutes, time.minutes)?;
        self.write_field(Field::Hours, time.hours)?;
        self.write_field(Field::Date, time.date)?;
        self.write_field(Field::Month, time.month)?;
        self.write_field(Field::Year, time.year)?;
        self.write_field(Field::Day, time.day)?;
        if time.mode == Mode::Hour12 {
            if let Some(am_pm) = time.am_pm {
                self.write_field(Field::AmPm, am_pm.bit())?;
            }
        }
        Ok(())
    }

    fn validate(time: &DateTime) -> Result<(), Ds1302Error> {
        if time.seconds > 59 {
            return Err(Ds1302Error::InvalidSeconds);
        }
        if time.minutes > 59 {
            return Err(Ds1302Error::InvalidMinutes);
        }
        if (time.mode == Mode::Hour12 && time.hours > 12) || time.hours > 23 {
            return Err(Ds1302Error::InvalidHours);
        }
        if time.date > 31 {
            return Err(Ds1302Error::InvalidDate);
        }
        if time.month > 12 {
            return Err(Ds1302Error::InvalidMonth);
        }
        if time.year > 99 {
            return Err(Ds1302Error::InvalidYear);
        }
        if time.day > 7 {
            return Err(Ds1302Error::InvalidDay);
        }
        if time.mode == Mode::Hour12 && time.am_pm.is_none() {
            return Err(Ds1302Error::MissingAmPm);
        }
        Ok(())
    }

    /// Start or halt the oscillator. The seconds digits are preserved.
    pub fn set_running(&mut self, is_running: bool) -> Result<(), Ds1302Error> {
        self.write_field(Field::ClockHalt, u8::from(!is_running))
    }

    /// Whether the oscillator is running.
    pub fn is_running(&mut self) -> Result<bool, Ds1302Error> {
        Ok(self.read_field(Field::ClockHalt)? == 0)
    }

    /// Switch between 12-hour (AM/PM) and 24-hour mode.
    ///
    /// The stored hour is converted in place so the numeric time of day is
    /// preserved; switching to the mode already in use changes nothing.
    pub fn set_clock_mode(&mut self, mode: Mode) -> Result<(), Ds1302Error> {
        self.write_field(Field::HourFormat, mode.bit())
    }

    /// write_protect(true) -> enable write protection
    /// write_protect(false) -> leave the chip writable
    pub fn write_protect(&mut self, enable: bool) -> Result<(), Ds1302Error> {
        self.write_field(Field::WriteProtect, u8::from(enable))
    }

    /// Enable trickle-charge.
    /// Ds: diode drop (0.7 or 1.4), Rs: series resistor (2k, 4k or 8k).
    /// The maximum charge current is (Vcc - diode drop) / Rs.
    pub fn tc_enable(&mut self, ds: Ds, rs: Rs) -> Result<(), Ds1302Error> {
        self.write_field(Field::TrickleCharge, TrickleCharger::enable(ds, rs))
    }

    /// Disable trickle-charge.
    pub fn tc_disable(&mut self) -> Result<(), Ds1302Error> {
        self.write_field(Field::TrickleCharge, TrickleCharger::disable())
    }

    /// Get the configuration of the trickle-charge register.
    pub fn tc_get(&mut self) -> Result<(bool, Option<Ds>, Option<Rs>), Ds1302Error> {
        let v = self.read_field(Field::TrickleCharge)?;
        Ok(TrickleCharger::from(v).get())
    }

    /// Whether charging is enabled.
    pub fn tc_is_enabled(&mut self) -> Result<bool, Ds1302Error> {
        let v = self.read_field(Field::TrickleCharge)?;
        Ok(TrickleCharger::from(v).is_enabled())
    }

    /// Read internal RAM. The static RAM is 31 x 8 bits, index 0..=30.
    pub fn read_ram(&mut self, index: u8) -> Result<u8, Ds1302Error> {
        if index > RAM_LAST_INDEX {
            return Err(Ds1302Error::Parameter);
        }
        self.read_reg(RAM_READ_BASE + index * 2)
    }

    /// Write internal RAM. The static RAM is 31 x 8 bits, index 0..=30.
    pub fn write_ram(&mut self, index: u8, value: u8) -> Result<(), Ds1302Error> {
        if index > RAM_LAST_INDEX {
            return Err(Ds1302Error::Parameter);
        }
        let command = RAM_WRITE_BASE + index * 2;
        self.unprotected(|rtc| rtc.write_reg(command, value))
    }
}
