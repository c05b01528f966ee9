// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Secure A/B OTA update core for dual-bank microcontrollers.
//!
//! Three tightly coupled pieces: the boot-selection table the first-stage
//! loader runs over the persistent flag record ([`boot`]), the
//! CMAC-authenticated command surface with per-attempt challenge rotation
//! ([`cmd`], [`service`]), and the cooperative job engine that keeps
//! full-bank erases and SHA-256 verifies from starving the radio link
//! ([`job`]).
//!
//! This crate supports both `no_std` (device) and `std` (host) builds:
//! - Default: `no_std`, hardware reached only through the [`hal`] traits
//! - `std` feature: std error impls for host tools
//! - `defmt` feature: `defmt::Format` derives on public types

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod boot;
pub mod buffer;
pub mod cmac;
pub mod cmd;
pub mod flags;
pub mod hal;
pub mod job;
pub mod layout;
pub mod service;
pub mod status;

// Re-export the types integrators touch most.
pub use boot::{arbitrate, BootAction, BootPlan};
pub use buffer::{IoBuffer, TokenBuf, WriteMethod};
pub use cmd::Opcode;
pub use flags::{BankState, FlagRecord, FlagStore, ModeFlag, ReasonCode};
pub use layout::{Bank, BANK_SIZE, IO_BUFFER_SIZE};
pub use service::{CharId, OtaService};
pub use status::{AttError, AttResult, FlashError, JobStatus};
