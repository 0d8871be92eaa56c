//! SPE Expert command opcodes and builders.
//!
//! Every command is a single opcode byte. Apart from `STATUS`, which is
//! answered with a status frame, each is answered with an acknowledgement
//! echoing the opcode. The front-panel style commands step a setting to its
//! next value; there is no way to select a value directly.

use amplib_core::Band;
use amplib_frame_io::Command;

pub const INPUT: u8 = 0x01;
pub const BAND_DOWN: u8 = 0x02;
pub const BAND_UP: u8 = 0x03;
pub const ANTENNA: u8 = 0x04;
pub const TUNE: u8 = 0x09;
pub const SWITCH_OFF: u8 = 0x0A;
pub const POWER: u8 = 0x0B;
pub const OPERATE: u8 = 0x0D;
pub const STATUS: u8 = 0x90;

/// Request a status frame.
pub fn cmd_status() -> Command {
    Command::new(STATUS)
}

/// Step to the next exciter input.
pub fn cmd_input() -> Command {
    Command::new(INPUT)
}

/// Step to the next antenna allowed on the current band.
pub fn cmd_antenna() -> Command {
    Command::new(ANTENNA)
}

/// Step the power level L -> M -> H -> L.
pub fn cmd_power_level() -> Command {
    Command::new(POWER)
}

/// Toggle between standby and operate.
pub fn cmd_operate() -> Command {
    Command::new(OPERATE)
}

pub fn cmd_tune() -> Command {
    Command::new(TUNE)
}

pub fn cmd_switch_off() -> Command {
    Command::new(SWITCH_OFF)
}

/// One band step from `current` toward `target`.
pub fn cmd_band_step(current: Band, target: Band) -> Command {
    if target > current {
        Command::new(BAND_UP)
    } else {
        Command::new(BAND_DOWN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_step_direction() {
        assert_eq!(
            cmd_band_step(Band::Band40m, Band::Band20m).opcode(),
            Some(BAND_UP)
        );
        assert_eq!(
            cmd_band_step(Band::Band10m, Band::Band160m).opcode(),
            Some(BAND_DOWN)
        );
    }

    #[test]
    fn single_byte_commands() {
        assert_eq!(cmd_status().as_bytes(), &[0x90]);
        assert_eq!(cmd_operate().as_bytes(), &[0x0D]);
        assert_eq!(cmd_switch_off().as_bytes(), &[0x0A]);
    }
}
