// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Boot-selection logic - pure decision table without hardware dependencies.
//!
//! The first-stage bootloader reads the flag record, asks [`arbitrate`] what
//! to do, commits any flag update, and then either jumps to a bank entry or
//! enters the chip's in-ROM recovery loader. Keeping the table pure lets the
//! two-strike rollback policy be tested exhaustively on the host.
//!
//! The policy: every jump out of the arbiter arms `FirstBoot`; only the
//! application calling `assert_boot_ok()` disarms it. A crash before that
//! call therefore shows up on the next boot as a still-armed `FirstBoot`,
//! and the arbiter swaps banks once, then surrenders to ROM ISP.

use crate::flags::{BankState, FlagRecord, ModeFlag, ReasonCode};
use crate::hal::EepromOps;
use crate::layout::Bank;
use crate::status::FlashError;

/// Where the arbiter hands control after its flag update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BootAction {
    /// Jump to the entry point of this bank.
    Jump(Bank),
    /// Unconditionally reach the chip's factory-style update mode.
    EnterRomIsp,
}

/// Outcome of arbitration: flags to persist (if any), where to go, and
/// whether the driver should warn that this is a fallback boot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BootPlan {
    pub save: Option<FlagRecord>,
    pub action: BootAction,
    pub fallback_warning: bool,
}

impl BootPlan {
    /// Persist the plan's flag update (if any) and hand back the action.
    pub fn commit(
        &self,
        store: &mut crate::flags::FlagStore,
        ee: &mut impl EepromOps,
    ) -> Result<BootAction, FlashError> {
        if let Some(rec) = self.save {
            store.put(rec);
            store.save(ee)?;
        }
        Ok(self.action)
    }
}

/// Apply the boot decision table; first match wins.
pub fn arbitrate(rec: FlagRecord) -> BootPlan {
    // All banks already asserted bad: recovery only, flags untouched.
    if rec.bank == BankState::FailBoot {
        return BootPlan {
            save: None,
            action: BootAction::EnterRomIsp,
            fallback_warning: false,
        };
    }

    let bank = match rec.bank.bank() {
        Some(bank) => bank,
        None => {
            // Uninitialized or torn record: default-initialize and take
            // bank A for its first boot.
            return BootPlan {
                save: Some(FlagRecord::first_boot_default()),
                action: BootAction::Jump(Bank::A),
                fallback_warning: false,
            };
        }
    };

    match rec.mode {
        // The fallback bank also failed to confirm: both images are bad.
        ModeFlag::FirstBoot if rec.reason == ReasonCode::FallbackBoot => BootPlan {
            save: Some(FlagRecord::new(
                BankState::FailBoot,
                ModeFlag::FirstBoot,
                ReasonCode::FallbackBoot,
            )),
            action: BootAction::EnterRomIsp,
            fallback_warning: false,
        },
        // Last boot crashed before confirming: fall back to the twin bank,
        // which gets exactly one attempt of its own.
        ModeFlag::FirstBoot => {
            let swapped = bank.other();
            BootPlan {
                save: Some(FlagRecord::new(
                    swapped.into(),
                    ModeFlag::FirstBoot,
                    ReasonCode::FallbackBoot,
                )),
                action: BootAction::Jump(swapped),
                fallback_warning: false,
            }
        }
        // A fresh image was just installed in the twin bank: switch to it,
        // armed as a first boot.
        ModeFlag::Flashed => {
            let swapped = bank.other();
            BootPlan {
                save: Some(FlagRecord::new(
                    swapped.into(),
                    ModeFlag::FirstBoot,
                    ReasonCode::Normal,
                )),
                action: BootAction::Jump(swapped),
                fallback_warning: false,
            }
        }
        // Confirmed image: run it. No flag traffic on the happy path.
        _ => BootPlan {
            save: None,
            action: BootAction::Jump(bank),
            fallback_warning: rec.reason == ReasonCode::FallbackBoot,
        },
    }
}
