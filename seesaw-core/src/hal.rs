// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Hardware abstractions the core requires from the platform layer.
//!
//! The core never touches registers: everything below is supplied by the
//! integrator (or by `seesaw-sim` on the host). Components take the
//! narrowest trait they need; `Platform` bundles the full set for the
//! attribute service.

use crate::status::FlashError;

/// Program-flash access. Erase granularity is one
/// [`FLASH_ERASE_BLOCK`](crate::layout::FLASH_ERASE_BLOCK).
pub trait FlashOps {
    fn flash_read(&mut self, addr: u32, dst: &mut [u8]);
    fn flash_program(&mut self, addr: u32, src: &[u8]) -> Result<(), FlashError>;
    fn flash_erase(&mut self, addr: u32, len: u32) -> Result<(), FlashError>;
}

/// Data-EEPROM access for the persistent flag record.
pub trait EepromOps {
    /// Erase a whole page; required before any byte of it is rewritten.
    fn eeprom_page_erase(&mut self, offset: u32, len: u32) -> Result<(), FlashError>;
    fn eeprom_read(&mut self, offset: u32, dst: &mut [u8]);
    fn eeprom_write(&mut self, offset: u32, src: &[u8]) -> Result<(), FlashError>;
}

/// AES-128 single-block encryption, hardware accelerated where available.
pub trait AesOps {
    fn aes128_encrypt(&mut self, key: &[u8; 16], block: &mut [u8; 16]);
}

/// Entropy source for challenge rotation.
pub trait EntropyOps {
    fn rand_u32(&mut self) -> u32;
}

/// Interrupt/reset/delay control.
pub trait SysOps {
    fn disable_interrupts(&mut self);
    fn delay_ms(&mut self, ms: u32);
    /// Issue a hardware reset. On real hardware this does not return; the
    /// simulator latches the request instead so tests can replay the power
    /// cycle.
    fn system_reset(&mut self);
}

/// Everything the OTA service needs from the chip.
pub trait Platform: FlashOps + EepromOps + AesOps + EntropyOps + SysOps {}

impl<T: FlashOps + EepromOps + AesOps + EntropyOps + SysOps> Platform for T {}
