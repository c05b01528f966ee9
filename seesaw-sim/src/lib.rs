// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! In-memory stand-in for the OTA target device.
//!
//! [`SimPlatform`] backs the core's hardware traits with RAM flash, a RAM
//! EEPROM page, software AES-128, and a seedable RNG; resets are latched
//! rather than executed. [`SimDevice`] wraps a platform with the boot
//! arbiter and attribute service so tests and the host tool can replay
//! whole power cycles: boot, run the application, take commands, reboot,
//! boot again.

mod device;
mod platform;

pub use device::{DeviceState, SimDevice};
pub use platform::{SimPlatform, SoftAes, EEPROM_SIZE, FLASH_SIZE};
