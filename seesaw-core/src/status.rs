// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Error kinds surfaced over the attribute protocol and the async job
//! completion status readable through the MAIN characteristic.

use core::fmt;

/// Vendor flash-controller status code (nonzero).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FlashError(pub u8);

/// Attribute-protocol error kinds.
///
/// `code()` maps each kind onto the wire status byte the remote client
/// sees; the values follow the ATT error-code space with the stack's
/// vendor codes for pending/range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AttError {
    /// Frame too short or opcode out of range.
    InvalidValue,
    /// Frame/token/buffer length does not match what the operation expects.
    InvalidValueSize,
    /// Prepared-write or read offset beyond the target buffer.
    InvalidOffset,
    /// CMAC token mismatch.
    InsufficientAuthentication,
    /// Address/length outside the permitted bank window.
    InvalidRange,
    /// Busy gate: an async job is still running.
    WriteNotPermitted,
    /// Corrupt EEPROM flag record observed at runtime.
    Unlikely,
    /// Vendor flash error passed through from the hardware layer.
    Flash(FlashError),
}

impl AttError {
    pub fn code(self) -> u8 {
        match self {
            AttError::InvalidValue => 0x80,
            AttError::InvalidValueSize => 0x0D,
            AttError::InvalidOffset => 0x07,
            AttError::InsufficientAuthentication => 0x05,
            AttError::InvalidRange => 0x18,
            AttError::WriteNotPermitted => 0x03,
            AttError::Unlikely => 0x0E,
            AttError::Flash(FlashError(code)) => code,
        }
    }
}

impl fmt::Display for AttError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttError::InvalidValue => write!(f, "invalid value"),
            AttError::InvalidValueSize => write!(f, "invalid value size"),
            AttError::InvalidOffset => write!(f, "invalid offset"),
            AttError::InsufficientAuthentication => write!(f, "insufficient authentication"),
            AttError::InvalidRange => write!(f, "invalid range"),
            AttError::WriteNotPermitted => write!(f, "write not permitted"),
            AttError::Unlikely => write!(f, "unlikely error (corrupt flags)"),
            AttError::Flash(FlashError(code)) => write!(f, "flash error 0x{:02x}", code),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for AttError {}

impl From<FlashError> for AttError {
    fn from(e: FlashError) -> Self {
        AttError::Flash(e)
    }
}

pub type AttResult<T> = Result<T, AttError>;

/// Completion state of the async job engine, readable via MAIN.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum JobStatus {
    Success,
    Pending,
    Failed(FlashError),
}

impl JobStatus {
    pub fn code(self) -> u8 {
        match self {
            JobStatus::Success => 0x00,
            JobStatus::Pending => 0x17,
            JobStatus::Failed(FlashError(code)) => code,
        }
    }
}
