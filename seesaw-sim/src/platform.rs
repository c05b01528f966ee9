// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! RAM-backed implementation of the core's hardware traits.

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockEncrypt, KeyInit};
use aes::Aes128;
use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};

use seesaw_core::hal::{AesOps, EepromOps, EntropyOps, FlashOps, SysOps};
use seesaw_core::status::FlashError;

/// Enough flash for both banks plus the regions around them.
pub const FLASH_SIZE: usize = 0x0007_0000;

/// One EEPROM page holds the flag record; the rest is reserved.
pub const EEPROM_SIZE: usize = 256;

/// Software AES-128, standing in for the chip's hardware engine.
pub struct SoftAes;

impl AesOps for SoftAes {
    fn aes128_encrypt(&mut self, key: &[u8; 16], block: &mut [u8; 16]) {
        let cipher = Aes128::new(GenericArray::from_slice(&key[..]));
        cipher.encrypt_block(GenericArray::from_mut_slice(&mut block[..]));
    }
}

/// The simulated chip: persistent memories survive across [`reset`]
/// latches, so a power cycle is just re-running the boot path.
pub struct SimPlatform {
    pub flash: Vec<u8>,
    pub eeprom: Vec<u8>,
    rng: SmallRng,
    aes: SoftAes,
    /// Set by `system_reset`; the device harness clears it when it replays
    /// the power cycle.
    pub reset_requested: bool,
    /// Fault injection: the next flash erase fails with this code.
    pub fail_next_erase: Option<FlashError>,
    /// Fault injection: the next EEPROM write fails with this code,
    /// modeling power loss between the page erase and the write-back.
    pub fail_next_eeprom_write: Option<FlashError>,
}

impl SimPlatform {
    pub fn new(seed: u64) -> Self {
        Self {
            flash: vec![0xFF; FLASH_SIZE],
            eeprom: vec![0xFF; EEPROM_SIZE],
            rng: SmallRng::seed_from_u64(seed),
            aes: SoftAes,
            reset_requested: false,
            fail_next_erase: None,
            fail_next_eeprom_write: None,
        }
    }

    /// Consume a latched reset request.
    pub fn take_reset(&mut self) -> bool {
        std::mem::take(&mut self.reset_requested)
    }
}

impl FlashOps for SimPlatform {
    fn flash_read(&mut self, addr: u32, dst: &mut [u8]) {
        let addr = addr as usize;
        dst.copy_from_slice(&self.flash[addr..addr + dst.len()]);
    }

    fn flash_program(&mut self, addr: u32, src: &[u8]) -> Result<(), FlashError> {
        let addr = addr as usize;
        self.flash[addr..addr + src.len()].copy_from_slice(src);
        Ok(())
    }

    fn flash_erase(&mut self, addr: u32, len: u32) -> Result<(), FlashError> {
        if let Some(e) = self.fail_next_erase.take() {
            return Err(e);
        }
        let addr = addr as usize;
        self.flash[addr..addr + len as usize].fill(0xFF);
        Ok(())
    }
}

impl EepromOps for SimPlatform {
    fn eeprom_page_erase(&mut self, offset: u32, len: u32) -> Result<(), FlashError> {
        let offset = offset as usize;
        self.eeprom[offset..offset + len as usize].fill(0xFF);
        Ok(())
    }

    fn eeprom_read(&mut self, offset: u32, dst: &mut [u8]) {
        let offset = offset as usize;
        dst.copy_from_slice(&self.eeprom[offset..offset + dst.len()]);
    }

    fn eeprom_write(&mut self, offset: u32, src: &[u8]) -> Result<(), FlashError> {
        if let Some(e) = self.fail_next_eeprom_write.take() {
            return Err(e);
        }
        let offset = offset as usize;
        self.eeprom[offset..offset + src.len()].copy_from_slice(src);
        Ok(())
    }
}

impl AesOps for SimPlatform {
    fn aes128_encrypt(&mut self, key: &[u8; 16], block: &mut [u8; 16]) {
        self.aes.aes128_encrypt(key, block);
    }
}

impl EntropyOps for SimPlatform {
    fn rand_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }
}

impl SysOps for SimPlatform {
    fn disable_interrupts(&mut self) {}

    fn delay_ms(&mut self, _ms: u32) {}

    fn system_reset(&mut self) {
        self.reset_requested = true;
    }
}
