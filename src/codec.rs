//! Encode/decode between plain decimal field values and the packed BCD
//! register representation, including the hour-format conversions and the
//! write-protect discipline around every write.

use embedded_hal::digital::OutputPin;

use crate::bus::{Delay, IoPin};
use crate::registers::{Field, CLOCK_HALT_BIT, HOUR_12_BIT, HOUR_PM_BIT, WRITE_PROTECT_BIT};
use crate::{Ds1302Error, DS1302};

// Swap format from bcd to decimal
pub(crate) fn bcd_to_decimal(bcd: u8) -> u8 {
    ((bcd & 0xF0) >> 4) * 10 + (bcd & 0x0F)
}

// Swap format from decimal to bcd
pub(crate) fn decimal_to_bcd(decimal: u8) -> u8 {
    ((decimal / 10) << 4) + (decimal % 10)
}

/// Decode the hour digits of a raw hour register byte, honoring the format
/// bit packed into the same byte.
pub(crate) fn decode_hours(raw: u8) -> u8 {
    if raw & HOUR_12_BIT != 0 {
        10 * ((raw >> 4) & 0x1) + (raw & 0x0F)
    } else {
        10 * ((raw >> 4) & 0x3) + (raw & 0x0F)
    }
}

/// 24-hour value to its 12-hour representation, `true` meaning PM.
pub(crate) fn hour_to_12h(hour24: u8) -> (u8, bool) {
    if hour24 > 12 {
        (hour24 - 12, true)
    } else {
        (hour24, false)
    }
}

/// 12-hour value and meridiem back to the 24-hour representation.
pub(crate) fn hour_to_24h(hour12: u8, pm: bool) -> u8 {
    hour12 + if pm { 12 } else { 0 }
}

impl<CE, IO, SCLK, D, const TIMER_HZ: u32> DS1302<CE, IO, SCLK, D, TIMER_HZ>
where
    CE: OutputPin,
    IO: IoPin,
    SCLK: OutputPin,
    D: Delay<TIMER_HZ>,
{
    /// Read one logical field and return its plain decimal value.
    ///
    /// Flag fields (`AmPm`, `HourFormat`, `ClockHalt`, `WriteProtect`) read
    /// as 0 or 1; `HourReg` and `TrickleCharge` pass the raw byte through.
    /// No plausibility checking is done on what comes off the wire.
    pub fn read_field(&mut self, field: Field) -> Result<u8, Ds1302Error> {
        let raw = self.read_reg(field.read_addr())?;
        let value = match field {
            Field::Seconds => 10 * ((raw >> 4) & 0x7) + (raw & 0x0F),
            Field::Minutes => 10 * ((raw >> 4) & 0x7) + (raw & 0x0F),
            Field::Hours => decode_hours(raw),
            Field::Date => 10 * ((raw >> 4) & 0x3) + (raw & 0x0F),
            Field::Month => 10 * ((raw >> 4) & 0x1) + (raw & 0x0F),
            Field::Day => raw,
            Field::Year => 10 * (raw >> 4) + (raw & 0x0F),
            Field::AmPm => u8::from(raw & HOUR_PM_BIT != 0),
            Field::HourFormat => u8::from(raw & HOUR_12_BIT != 0),
            Field::ClockHalt => u8::from(raw & CLOCK_HALT_BIT != 0),
            Field::WriteProtect => u8::from(raw & WRITE_PROTECT_BIT != 0),
            Field::HourReg | Field::TrickleCharge => raw,
        };
        Ok(value)
    }

    /// Write one logical field from its plain decimal value.
    ///
    /// Every write except to `WriteProtect` itself runs with write-protect
    /// cleared and leaves the chip protected again afterwards. The value is
    /// not range-checked here; [`set_time`](Self::set_time) is the
    /// validating entry point.
    pub fn write_field(&mut self, field: Field, value: u8) -> Result<(), Ds1302Error> {
        if field == Field::WriteProtect {
            // The one write that must not go through the guard.
            self.write_field_unlocked(field, value)
        } else {
            self.unprotected(|rtc| rtc.write_field_unlocked(field, value))
        }
    }

    /// Run one write with the chip temporarily writable.
    ///
    /// Clears write-protect, runs `op`, then sets write-protect again. The
    /// restore happens whether or not `op` succeeded. Not reentrant; a
    /// write to the write-protect register itself must bypass this.
    pub(crate) fn unprotected<F>(&mut self, op: F) -> Result<(), Ds1302Error>
    where
        F: FnOnce(&mut Self) -> Result<(), Ds1302Error>,
    {
        self.write_reg(Field::WriteProtect.write_addr(), 0x00)?;
        let result = op(self);
        let restore = self.write_reg(Field::WriteProtect.write_addr(), WRITE_PROTECT_BIT);
        result.and(restore)
    }

    fn write_field_unlocked(&mut self, field: Field, value: u8) -> Result<(), Ds1302Error> {
        match field {
            Field::Seconds => {
                // Keep the halt flag that shares the register.
                let halt = self.read_reg(Field::Seconds.read_addr())? & CLOCK_HALT_BIT;
                self.write_reg(Field::Seconds.write_addr(), decimal_to_bcd(value) | halt)
            }
            Field::Minutes => self.write_reg(Field::Minutes.write_addr(), decimal_to_bcd(value)),
            Field::Hours => self.write_hours(value),
            Field::Date => self.write_reg(Field::Date.write_addr(), decimal_to_bcd(value)),
            Field::Month => self.write_reg(Field::Month.write_addr(), decimal_to_bcd(value)),
            Field::Day => self.write_reg(Field::Day.write_addr(), value),
            Field::Year => self.write_reg(Field::Year.write_addr(), decimal_to_bcd(value)),
            Field::AmPm => self.write_am_pm(value),
            Field::HourFormat => self.write_hour_format(value),
            Field::ClockHalt => {
                let seconds = self.read_field(Field::Seconds)?;
                self.write_reg(
                    Field::Seconds.write_addr(),
                    decimal_to_bcd(seconds) | (value << 7),
                )
            }
            Field::WriteProtect => {
                self.write_reg(Field::WriteProtect.write_addr(), value << 7)
            }
            Field::HourReg => self.write_reg(Field::HourReg.write_addr(), value),
            Field::TrickleCharge => self.write_reg(Field::TrickleCharge.write_addr(), value),
        }
    }

    /// The hour encoding depends on the format bit currently stored
    /// on-chip, so the register is read back first.
    fn write_hours(&mut self, mut value: u8) -> Result<(), Ds1302Error> {
        let current = self.read_reg(Field::HourReg.read_addr())?;
        if current & HOUR_12_BIT != 0 {
            if value > 12 {
                value -= 12;
            }
            let pm = current & HOUR_PM_BIT;
            self.write_reg(
                Field::Hours.write_addr(),
                decimal_to_bcd(value) | HOUR_12_BIT | pm,
            )
        } else {
            self.write_reg(Field::Hours.write_addr(), decimal_to_bcd(value))
        }
    }

    /// Set or clear the PM bit, leaving the hour digits untouched.
    /// A no-op while the chip runs in 24-hour mode.
    fn write_am_pm(&mut self, value: u8) -> Result<(), Ds1302Error> {
        let current = self.read_reg(Field::HourReg.read_addr())?;
        if current & HOUR_12_BIT == 0 {
            return Ok(());
        }
        let raw = if value != 0 {
            current | HOUR_PM_BIT
        } else {
            current & !HOUR_PM_BIT
        };
        self.write_reg(Field::Hours.write_addr(), raw)
    }

    /// Switch the stored hour between formats, preserving the numeric time
    /// of day. A no-op when the chip is already in the requested format.
    fn write_hour_format(&mut self, value: u8) -> Result<(), Ds1302Error> {
        let current = self.read_reg(Field::HourReg.read_addr())?;
        let is_12h = current & HOUR_12_BIT != 0;
        if value != 0 && !is_12h {
            let (hour, pm) = hour_to_12h(decode_hours(current));
            let raw = decimal_to_bcd(hour) | HOUR_12_BIT | if pm { HOUR_PM_BIT } else { 0 };
            self.write_reg(Field::Hours.write_addr(), raw)
        } else if value == 0 && is_12h {
            let pm = current & HOUR_PM_BIT != 0;
            let hour = hour_to_24h(decode_hours(current), pm);
            self.write_reg(Field::Hours.write_addr(), decimal_to_bcd(hour))
        } else {
            Ok(())
        }
    }
}
