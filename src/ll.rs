//! Low-level register and interface definitions for TCS34725

use core::fmt::Debug;
use core::future::Future;

/// I2C address of the TCS34725
pub const I2C_ADDRESS: u8 = 0x29;

/// Part number reported by TCS34721 and TCS34725 in the ID register
pub const CHIP_ID: u8 = 0x44;

/// Device registers by name
pub mod registers {
    /// Enables states and interrupts
    pub const ENABLE: u8 = 0x00;
    /// RGBC integration time
    pub const ATIME: u8 = 0x01;
    /// Wait time
    pub const WTIME: u8 = 0x03;
    /// Clear interrupt low threshold, low byte
    pub const AILTL: u8 = 0x04;
    /// Clear interrupt low threshold, high byte
    pub const AILTH: u8 = 0x05;
    /// Clear interrupt high threshold, low byte
    pub const AIHTL: u8 = 0x06;
    /// Clear interrupt high threshold, high byte
    pub const AIHTH: u8 = 0x07;
    /// Interrupt persistence filter
    pub const PERS: u8 = 0x0C;
    /// Configuration
    pub const CONFIG: u8 = 0x0D;
    /// Control (gain)
    pub const CONTROL: u8 = 0x0F;
    /// Device ID
    pub const ID: u8 = 0x12;
    /// Device status
    pub const STATUS: u8 = 0x13;
    /// Clear data, low byte
    pub const CDATAL: u8 = 0x14;
    /// Clear data, high byte
    pub const CDATAH: u8 = 0x15;
    /// Red data, low byte
    pub const RDATAL: u8 = 0x16;
    /// Red data, high byte
    pub const RDATAH: u8 = 0x17;
    /// Green data, low byte
    pub const GDATAL: u8 = 0x18;
    /// Green data, high byte
    pub const GDATAH: u8 = 0x19;
    /// Blue data, low byte
    pub const BDATAL: u8 = 0x1A;
    /// Blue data, high byte
    pub const BDATAH: u8 = 0x1B;

    /// Highest addressable register
    pub const MAX_ADDRESS: u8 = 0x1F;
}

/// Named 8-bit masks
pub mod masks {
    /// RGBC clear channel interrupt
    pub const STATUS_AINT: u8 = 0b0001_0000;
    /// RGBC integration cycle completed
    pub const STATUS_AVALID: u8 = 0b0000_0001;
    /// RGBC gain control
    pub const CONTROL_AGAIN: u8 = 0b0000_0011;
    /// Wait long (12x wait timing)
    pub const CONFIG_WLONG: u8 = 0b0000_0010;
    /// Interrupt persistence
    pub const PERS_APRES: u8 = 0b0000_1111;
    /// Power on
    pub const ENABLE_PON: u8 = 0x01;
    /// RGBC enable
    pub const ENABLE_AEN: u8 = 0x02;
    /// Wait enable
    pub const ENABLE_WEN: u8 = 0x08;
    /// RGBC interrupt enable
    pub const ENABLE_AIEN: u8 = 0x10;
}

/// Marks the transmitted byte as a command
pub const COMMAND_BIT: u8 = 0x80;

/// Transaction type encoded into bits 6:5 of a command byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum CommandType {
    /// Every read or write targets the same register
    RepeatedByte = 0b00,
    /// Register address increments after each byte
    AutoIncrement = 0b01,
    /// Special function, the address field carries the function code
    Special = 0b11,
}

/// Special function codes usable with [`CommandType::Special`]
pub mod special {
    /// Clear channel interrupt clear
    pub const CLEAR: u8 = 0b0_0110;
}

/// Error returned by [`make_command`] for an address outside the 5-bit space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct UndefinedAddress(pub u8);

/// Build the command byte that selects a register, block or special function
pub const fn make_command(
    address_or_function: u8,
    kind: CommandType,
    is_command: bool,
) -> Result<u8, UndefinedAddress> {
    if address_or_function > registers::MAX_ADDRESS {
        return Err(UndefinedAddress(address_or_function));
    }
    let command_bit = if is_command { COMMAND_BIT } else { 0 };
    Ok(address_or_function | ((kind as u8) << 5) | command_bit)
}

const fn command(address_or_function: u8, kind: CommandType) -> u8 {
    match make_command(address_or_function, kind, true) {
        Ok(command) => command,
        Err(_) => panic!("register address out of range"),
    }
}

/// Single register command for one of the [`registers`]
pub const fn register_command(address: u8) -> u8 {
    command(address, CommandType::RepeatedByte)
}

/// Clear the clear-channel interrupt
pub const COMMAND_CLEAR: u8 = command(special::CLEAR, CommandType::Special);
/// Block read of the four color channels starting at CDATAL
pub const COMMAND_BULK_DATA: u8 = command(registers::CDATAL, CommandType::AutoIncrement);
/// Block read of the whole configuration space starting at ENABLE
pub const COMMAND_BULK_PROFILE: u8 = command(registers::ENABLE, CommandType::AutoIncrement);
/// Block access to the four threshold registers starting at AILTL
pub const COMMAND_BULK_THRESHOLD: u8 = command(registers::AILTL, CommandType::AutoIncrement);

/// Length of the profile block read
pub const PROFILE_BLOCK_LEN: usize = 20;
/// Length of the color data block read
pub const DATA_BLOCK_LEN: usize = 8;
/// Length of the threshold block
pub const THRESHOLD_BLOCK_LEN: usize = 4;

/// Longest payload accepted by [`RegisterBus::write`], the whole register space
pub const MAX_WRITE_LEN: usize = registers::MAX_ADDRESS as usize + 1;

/// Register-addressed bus capability
///
/// All `command` arguments are pre-combined command bytes (see [`make_command`]).
/// Implementations only move raw bytes to and from the device at a fixed address.
pub trait RegisterBus {
    /// Transport error
    type Error: Debug;

    /// Select `command` and read `buf.len()` bytes
    fn read(&mut self, command: u8, buf: &mut [u8])
        -> impl Future<Output = Result<(), Self::Error>>;

    /// Select `command` and write `data`
    ///
    /// `data` must fit the register space ([`MAX_WRITE_LEN`] bytes). The I2C
    /// interfaces in this module panic on a longer payload.
    fn write(&mut self, command: u8, data: &[u8]) -> impl Future<Output = Result<(), Self::Error>>;

    /// Send a bare command byte with no payload
    fn write_special(&mut self, command: u8) -> impl Future<Output = Result<(), Self::Error>>;
}

/// Prefix `data` with the command byte
///
/// # Panics
///
/// If `data` is longer than the register space.
fn framed(command: u8, data: &[u8]) -> ([u8; MAX_WRITE_LEN + 1], usize) {
    assert!(data.len() <= MAX_WRITE_LEN, "write past the register space");
    let mut buf = [0u8; MAX_WRITE_LEN + 1];
    buf[0] = command;
    buf[1..=data.len()].copy_from_slice(data);
    (buf, data.len() + 1)
}

/// Async I2C interface implementation
#[derive(Debug)]
pub struct I2cInterface<I2c> {
    /// The I2C interface
    pub i2c: I2c,
}

impl<I2cTrait: embedded_hal_async::i2c::I2c> RegisterBus for I2cInterface<I2cTrait> {
    type Error = I2cTrait::Error;

    async fn read(&mut self, command: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.i2c.write_read(I2C_ADDRESS, &[command], buf).await
    }

    async fn write(&mut self, command: u8, data: &[u8]) -> Result<(), Self::Error> {
        let (buf, len) = framed(command, data);
        self.i2c.write(I2C_ADDRESS, &buf[..len]).await
    }

    async fn write_special(&mut self, command: u8) -> Result<(), Self::Error> {
        self.i2c.write(I2C_ADDRESS, &[command]).await
    }
}

/// Blocking I2C interface implementation
///
/// The futures returned complete on first poll, which lets blocking HALs such as
/// `linux-embedded-hal` drive the async driver with a trivial executor.
#[derive(Debug)]
pub struct BlockingI2cInterface<I2c> {
    /// The I2C interface
    pub i2c: I2c,
}

impl<I2cTrait: embedded_hal::i2c::I2c> RegisterBus for BlockingI2cInterface<I2cTrait> {
    type Error = I2cTrait::Error;

    async fn read(&mut self, command: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.i2c.write_read(I2C_ADDRESS, &[command], buf)
    }

    async fn write(&mut self, command: u8, data: &[u8]) -> Result<(), Self::Error> {
        let (buf, len) = framed(command, data);
        self.i2c.write(I2C_ADDRESS, &buf[..len])
    }

    async fn write_special(&mut self, command: u8) -> Result<(), Self::Error> {
        self.i2c.write(I2C_ADDRESS, &[command])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_bytes() {
        assert_eq!(register_command(registers::ID), 0x92);
        assert_eq!(COMMAND_CLEAR, 0xE6);
        assert_eq!(COMMAND_BULK_DATA, 0xB4);
        assert_eq!(COMMAND_BULK_PROFILE, 0xA0);
        assert_eq!(COMMAND_BULK_THRESHOLD, 0xA4);
    }

    #[test]
    fn command_without_command_bit() {
        assert_eq!(
            make_command(registers::STATUS, CommandType::RepeatedByte, false),
            Ok(0x13)
        );
    }

    #[test]
    fn framed_prefixes_command() {
        let (buf, len) = framed(COMMAND_BULK_THRESHOLD, &[0x18, 0x01, 0x22, 0x01]);
        assert_eq!(&buf[..len], &[0xA4, 0x18, 0x01, 0x22, 0x01]);

        let (_, len) = framed(COMMAND_BULK_PROFILE, &[0; MAX_WRITE_LEN]);
        assert_eq!(len, MAX_WRITE_LEN + 1);
    }

    #[test]
    #[should_panic(expected = "write past the register space")]
    fn framed_rejects_oversized_payload() {
        let _ = framed(COMMAND_BULK_PROFILE, &[0; MAX_WRITE_LEN + 1]);
    }

    #[test]
    fn undefined_address_is_rejected() {
        assert_eq!(
            make_command(0x20, CommandType::RepeatedByte, true),
            Err(UndefinedAddress(0x20))
        );
    }
}
