// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Persistent boot-flag record and its EEPROM-backed store.
//!
//! The record is 8 bytes at a fixed EEPROM offset: a 32-bit bank magic, a
//! mode byte, a reason byte, and two reserved bytes written as zero. The
//! EEPROM requires a page erase before any rewrite, so `save()` always
//! erases the whole page and writes the record back; a power cut between
//! the two leaves the record unreadable, which the boot arbiter treats as
//! first initialization.

use crate::hal::EepromOps;
use crate::layout::{Bank, EEPROM_FLAGS_OFFSET, EEPROM_PAGE_SIZE};
use crate::status::FlashError;

pub const BANK_A_MAGIC: u32 = 0xA5A5_A5A5;
pub const BANK_B_MAGIC: u32 = 0x5A5A_5A5A;
pub const FAIL_BOOT_MAGIC: u32 = 0xDEAD_BEEF;

/// Which bank the bootloader should run, as stored in EEPROM.
///
/// Any raw value outside the three magics round-trips through `Unknown`,
/// covering both the erased (0xFFFFFFFF) and the torn-save case.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BankState {
    A,
    B,
    FailBoot,
    Unknown(u32),
}

impl BankState {
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            BANK_A_MAGIC => BankState::A,
            BANK_B_MAGIC => BankState::B,
            FAIL_BOOT_MAGIC => BankState::FailBoot,
            other => BankState::Unknown(other),
        }
    }

    pub fn raw(self) -> u32 {
        match self {
            BankState::A => BANK_A_MAGIC,
            BankState::B => BANK_B_MAGIC,
            BankState::FailBoot => FAIL_BOOT_MAGIC,
            BankState::Unknown(raw) => raw,
        }
    }

    /// The concrete bank, if the record names one.
    pub fn bank(self) -> Option<Bank> {
        match self {
            BankState::A => Some(Bank::A),
            BankState::B => Some(Bank::B),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BankState::A => "Bank A",
            BankState::B => "Bank B",
            BankState::FailBoot => "All Banks Failed Boot",
            BankState::Unknown(_) => "Unknown (First Initialization Maybe)",
        }
    }
}

impl From<Bank> for BankState {
    fn from(b: Bank) -> Self {
        match b {
            Bank::A => BankState::A,
            Bank::B => BankState::B,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModeFlag {
    Ok,
    Flashed,
    FirstBoot,
    Unknown(u8),
}

impl ModeFlag {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => ModeFlag::Ok,
            1 => ModeFlag::Flashed,
            2 => ModeFlag::FirstBoot,
            other => ModeFlag::Unknown(other),
        }
    }

    pub fn raw(self) -> u8 {
        match self {
            ModeFlag::Ok => 0,
            ModeFlag::Flashed => 1,
            ModeFlag::FirstBoot => 2,
            ModeFlag::Unknown(raw) => raw,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ModeFlag::Ok => "OK",
            ModeFlag::Flashed => "New OTA Flashed (Waiting for Reboot)",
            ModeFlag::FirstBoot => "First Boot (First Time After Flashing)",
            ModeFlag::Unknown(_) => "Unknown",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReasonCode {
    Normal,
    FallbackBoot,
    Unknown(u8),
}

impl ReasonCode {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => ReasonCode::Normal,
            1 => ReasonCode::FallbackBoot,
            other => ReasonCode::Unknown(other),
        }
    }

    pub fn raw(self) -> u8 {
        match self {
            ReasonCode::Normal => 0,
            ReasonCode::FallbackBoot => 1,
            ReasonCode::Unknown(raw) => raw,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ReasonCode::Normal => "Normal",
            ReasonCode::FallbackBoot => "Fallback Boot (Failed to Boot from Previous Bank)",
            ReasonCode::Unknown(_) => "Unknown",
        }
    }
}

/// The 8-byte persistent record: (bank, mode, reason, 2 reserved bytes).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FlagRecord {
    pub bank: BankState,
    pub mode: ModeFlag,
    pub reason: ReasonCode,
}

impl FlagRecord {
    pub const SIZE: usize = 8;

    pub const fn new(bank: BankState, mode: ModeFlag, reason: ReasonCode) -> Self {
        Self { bank, mode, reason }
    }

    /// Record written on first initialization of a blank device.
    pub fn first_boot_default() -> Self {
        Self {
            bank: BankState::A,
            mode: ModeFlag::FirstBoot,
            reason: ReasonCode::Normal,
        }
    }

    pub fn decode(bytes: &[u8; Self::SIZE]) -> Self {
        let raw_bank = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        Self {
            bank: BankState::from_raw(raw_bank),
            mode: ModeFlag::from_raw(bytes[4]),
            reason: ReasonCode::from_raw(bytes[5]),
        }
    }

    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0..4].copy_from_slice(&self.bank.raw().to_le_bytes());
        out[4] = self.mode.raw();
        out[5] = self.reason.raw();
        // out[6..8] reserved, stay zero
        out
    }
}

/// EEPROM-backed store for the flag record, cached on first access.
pub struct FlagStore {
    cache: Option<FlagRecord>,
}

impl FlagStore {
    pub const fn new() -> Self {
        Self { cache: None }
    }

    /// Current record, reading EEPROM once on first call.
    pub fn get(&mut self, ee: &mut impl EepromOps) -> FlagRecord {
        match self.cache {
            Some(rec) => rec,
            None => {
                let mut bytes = [0u8; FlagRecord::SIZE];
                ee.eeprom_read(EEPROM_FLAGS_OFFSET, &mut bytes);
                let rec = FlagRecord::decode(&bytes);
                self.cache = Some(rec);
                rec
            }
        }
    }

    /// Replace the whole cached record (does not touch EEPROM until `save`).
    pub fn put(&mut self, rec: FlagRecord) {
        self.cache = Some(rec);
    }

    pub fn set_bank(&mut self, ee: &mut impl EepromOps, bank: BankState) {
        let mut rec = self.get(ee);
        rec.bank = bank;
        self.cache = Some(rec);
    }

    pub fn set_mode(&mut self, ee: &mut impl EepromOps, mode: ModeFlag) {
        let mut rec = self.get(ee);
        rec.mode = mode;
        self.cache = Some(rec);
    }

    pub fn set_reason(&mut self, ee: &mut impl EepromOps, reason: ReasonCode) {
        let mut rec = self.get(ee);
        rec.reason = reason;
        self.cache = Some(rec);
    }

    /// Erase the record's page, then write the record back.
    pub fn save(&mut self, ee: &mut impl EepromOps) -> Result<(), FlashError> {
        let rec = self.get(ee);
        ee.eeprom_page_erase(EEPROM_FLAGS_OFFSET, EEPROM_PAGE_SIZE)?;
        ee.eeprom_write(EEPROM_FLAGS_OFFSET, &rec.encode())
    }

    /// Called by the application after a clean start-up. Clears the
    /// first-boot arming; a no-op on any other mode, so calling it twice is
    /// the same as calling it once.
    pub fn assert_boot_ok(&mut self, ee: &mut impl EepromOps) -> Result<(), FlashError> {
        let rec = self.get(ee);
        if rec.mode != ModeFlag::FirstBoot {
            return Ok(());
        }
        self.set_mode(ee, ModeFlag::Ok);
        self.save(ee)
    }

    /// The bank currently designated to run, if the record names one.
    pub fn current_bank(&mut self, ee: &mut impl EepromOps) -> Option<Bank> {
        self.get(ee).bank.bank()
    }

    /// The twin of the current bank; `None` when the record is corrupt.
    pub fn inactive_bank(&mut self, ee: &mut impl EepromOps) -> Option<Bank> {
        self.current_bank(ee).map(Bank::other)
    }
}

impl Default for FlagStore {
    fn default() -> Self {
        Self::new()
    }
}
