//! Simulated DS1302 standing in for the GPIO collaborator in tests.
//!
//! The chip model reacts to line edges the way the real part does: while CE
//! is high it latches host data on rising clock edges and presents read
//! data after falling edges, least significant bit first. Writes commit per
//! byte and are silently ignored while the write-protect bit is set, except
//! to the write-protect register itself, so tests exercise the real gating
//! discipline rather than a permissive stub.

use core::cell::RefCell;
use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin, PinState};

use crate::bus::{Delay, IoPin};
use crate::DS1302;

const WP_INDEX: usize = 7;

/// Register file plus the shift state machine of one DS1302.
pub(crate) struct Chip {
    /// seconds, minutes, hours, date, month, day, year, write-protect,
    /// trickle-charge
    pub clock: [u8; 9],
    pub ram: [u8; 31],
    ce: bool,
    sclk: bool,
    io_host: bool,
    /// Level visible to the host right now.
    io_chip: bool,
    /// Level the chip will expose on the next falling edge. Read data
    /// reaches the line one falling edge after it is clocked, matching the
    /// part's output delay; the host always samples the previous bit.
    pending: bool,
    state: State,
}

enum State {
    Idle,
    Command { byte: u8, bits: u8 },
    HostData { cmd: u8, index: u8, byte: u8, bits: u8 },
    ChipData { cmd: u8, index: u8, bits: u8 },
}

impl Chip {
    /// Powered-on chip: cleared registers, write-protect set.
    pub fn new() -> Self {
        let mut clock = [0; 9];
        clock[WP_INDEX] = 0x80;
        Chip {
            clock,
            ram: [0; 31],
            ce: false,
            sclk: false,
            io_host: false,
            io_chip: false,
            pending: false,
            state: State::Idle,
        }
    }

    pub fn protected(&self) -> bool {
        self.clock[WP_INDEX] & 0x80 != 0
    }

    fn set_ce(&mut self, level: bool) {
        if level && !self.ce {
            self.pending = false;
            self.state = State::Command { byte: 0, bits: 0 };
        } else if !level {
            self.state = State::Idle;
        }
        self.ce = level;
    }

    fn set_sclk(&mut self, level: bool) {
        let rising = level && !self.sclk;
        let falling = !level && self.sclk;
        self.sclk = level;
        if !self.ce {
            return;
        }
        if rising {
            self.on_rising();
        }
        if falling {
            self.on_falling();
        }
    }

    fn on_rising(&mut self) {
        let bit = u8::from(self.io_host);
        match core::mem::replace(&mut self.state, State::Idle) {
            State::Command { mut byte, mut bits } => {
                byte |= bit << bits;
                bits += 1;
                self.state = if bits == 8 {
                    Self::decode(byte)
                } else {
                    State::Command { byte, bits }
                };
            }
            State::HostData {
                cmd,
                index,
                mut byte,
                mut bits,
            } => {
                byte |= bit << bits;
                bits += 1;
                self.state = if bits == 8 {
                    self.commit(cmd, index, byte);
                    State::HostData {
                        cmd,
                        index: index + 1,
                        byte: 0,
                        bits: 0,
                    }
                } else {
                    State::HostData {
                        cmd,
                        index,
                        byte,
                        bits,
                    }
                };
            }
            other => self.state = other,
        }
    }

    fn on_falling(&mut self) {
        if let State::ChipData { cmd, index, bits } = self.state {
            self.io_chip = self.pending;
            let byte = self.out_byte(cmd, index);
            self.pending = (byte >> bits) & 1 == 1;
            self.state = if bits == 7 {
                State::ChipData {
                    cmd,
                    index: index + 1,
                    bits: 0,
                }
            } else {
                State::ChipData {
                    cmd,
                    index,
                    bits: bits + 1,
                }
            };
        }
    }

    fn decode(cmd: u8) -> State {
        if cmd & 0x80 == 0 {
            return State::Idle;
        }
        if cmd & 0x01 != 0 {
            State::ChipData {
                cmd,
                index: 0,
                bits: 0,
            }
        } else {
            State::HostData {
                cmd,
                index: 0,
                byte: 0,
                bits: 0,
            }
        }
    }

    /// Byte index within the addressed register file; bursts advance with
    /// `index`, single transfers stay on the command's address.
    fn target(cmd: u8, index: u8) -> usize {
        let addr = (cmd >> 1) & 0x1F;
        if addr == 0x1F {
            index as usize
        } else {
            addr as usize
        }
    }

    fn commit(&mut self, cmd: u8, index: u8, value: u8) {
        let target = Self::target(cmd, index);
        if cmd & 0x40 != 0 {
            if target < self.ram.len() && !self.protected() {
                self.ram[target] = value;
            }
        } else if target < self.clock.len() && (target == WP_INDEX || !self.protected()) {
            self.clock[target] = value;
        }
    }

    fn out_byte(&self, cmd: u8, index: u8) -> u8 {
        let target = Self::target(cmd, index);
        if cmd & 0x40 != 0 {
            self.ram.get(target).copied().unwrap_or(0)
        } else {
            self.clock.get(target).copied().unwrap_or(0)
        }
    }
}

pub(crate) struct SimCe<'a>(pub &'a RefCell<Chip>);
pub(crate) struct SimSclk<'a>(pub &'a RefCell<Chip>);
pub(crate) struct SimIo<'a>(pub &'a RefCell<Chip>);

impl ErrorType for SimCe<'_> {
    type Error = Infallible;
}

impl OutputPin for SimCe<'_> {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.0.borrow_mut().set_ce(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.0.borrow_mut().set_ce(true);
        Ok(())
    }
}

impl ErrorType for SimSclk<'_> {
    type Error = Infallible;
}

impl OutputPin for SimSclk<'_> {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.0.borrow_mut().set_sclk(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.0.borrow_mut().set_sclk(true);
        Ok(())
    }
}

impl IoPin for SimIo<'_> {
    type Error = Infallible;

    fn set_output(&mut self) -> Result<(), Infallible> {
        Ok(())
    }

    fn set_input(&mut self) -> Result<(), Infallible> {
        Ok(())
    }

    fn write(&mut self, state: PinState) -> Result<(), Infallible> {
        self.0.borrow_mut().io_host = state == PinState::High;
        Ok(())
    }

    fn read(&mut self) -> Result<bool, Infallible> {
        Ok(self.0.borrow().io_chip)
    }
}

/// Timer whose countdowns expire immediately; the simulated chip has no
/// timing requirements.
pub(crate) struct NoopDelay;

impl<const TIMER_HZ: u32> Delay<TIMER_HZ> for NoopDelay {
    type Error = Infallible;

    fn now(&mut self) -> fugit::TimerInstantU32<TIMER_HZ> {
        fugit::TimerInstantU32::from_ticks(0)
    }

    fn start(&mut self, _duration: fugit::TimerDurationU32<TIMER_HZ>) -> Result<(), Infallible> {
        Ok(())
    }

    fn wait(&mut self) -> nb::Result<(), Infallible> {
        Ok(())
    }
}

pub(crate) type SimRtc<'a> = DS1302<SimCe<'a>, SimIo<'a>, SimSclk<'a>, NoopDelay, 1_000_000>;

/// Driver wired to `chip` through the simulated lines.
pub(crate) fn driver(chip: &RefCell<Chip>) -> SimRtc<'_> {
    DS1302::new(SimCe(chip), SimIo(chip), SimSclk(chip), NoopDelay)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_register_round_trip() {
        let chip = RefCell::new(Chip::new());
        let mut rtc = driver(&chip);

        rtc.write_reg(0x8E, 0x00).unwrap();
        rtc.write_reg(0x80, 0x30).unwrap();
        assert_eq!(chip.borrow().clock[0], 0x30);
        assert_eq!(rtc.read_reg(0x81).unwrap(), 0x30);
    }

    #[test]
    fn writes_are_ignored_while_protected() {
        let chip = RefCell::new(Chip::new());
        let mut rtc = driver(&chip);

        assert!(chip.borrow().protected());
        rtc.write_reg(0x82, 0x45).unwrap();
        assert_eq!(chip.borrow().clock[1], 0x00);

        rtc.write_reg(0x8E, 0x00).unwrap();
        rtc.write_reg(0x82, 0x45).unwrap();
        assert_eq!(chip.borrow().clock[1], 0x45);
    }
}
