// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Unit tests for the boot-selection decision table.

use seesaw_core::boot::{arbitrate, BootAction, BootPlan};
use seesaw_core::flags::{BankState, FlagRecord, ModeFlag, ReasonCode};
use seesaw_core::layout::Bank;

fn rec(bank: BankState, mode: ModeFlag, reason: ReasonCode) -> FlagRecord {
    FlagRecord::new(bank, mode, reason)
}

/// Follow a plan the way the bootloader does: persist the update (if any)
/// and return the record a subsequent boot would read.
fn next_record(current: FlagRecord, plan: &BootPlan) -> FlagRecord {
    plan.save.unwrap_or(current)
}

// =============================================================================
// Decision table rows, in priority order
// =============================================================================

#[test]
fn test_fail_boot_enters_isp_without_flag_change() {
    let plan = arbitrate(rec(
        BankState::FailBoot,
        ModeFlag::Ok,
        ReasonCode::Normal,
    ));
    assert_eq!(plan.action, BootAction::EnterRomIsp);
    assert_eq!(plan.save, None);
}

#[test]
fn test_first_boot_after_fallback_gives_up() {
    let plan = arbitrate(rec(
        BankState::B,
        ModeFlag::FirstBoot,
        ReasonCode::FallbackBoot,
    ));
    assert_eq!(plan.action, BootAction::EnterRomIsp);
    assert_eq!(
        plan.save,
        Some(rec(
            BankState::FailBoot,
            ModeFlag::FirstBoot,
            ReasonCode::FallbackBoot
        ))
    );
}

#[test]
fn test_unconfirmed_first_boot_falls_back_to_twin_bank() {
    let plan = arbitrate(rec(BankState::B, ModeFlag::FirstBoot, ReasonCode::Normal));
    assert_eq!(plan.action, BootAction::Jump(Bank::A));
    assert_eq!(
        plan.save,
        Some(rec(
            BankState::A,
            ModeFlag::FirstBoot,
            ReasonCode::FallbackBoot
        ))
    );
}

#[test]
fn test_flashed_swaps_to_new_bank_armed_first_boot() {
    let plan = arbitrate(rec(BankState::A, ModeFlag::Flashed, ReasonCode::Normal));
    assert_eq!(plan.action, BootAction::Jump(Bank::B));
    assert_eq!(
        plan.save,
        Some(rec(BankState::B, ModeFlag::FirstBoot, ReasonCode::Normal))
    );
    assert!(!plan.fallback_warning);
}

#[test]
fn test_flashed_from_bank_b_swaps_to_a() {
    let plan = arbitrate(rec(BankState::B, ModeFlag::Flashed, ReasonCode::Normal));
    assert_eq!(plan.action, BootAction::Jump(Bank::A));
}

#[test]
fn test_confirmed_image_boots_in_place() {
    let plan = arbitrate(rec(BankState::A, ModeFlag::Ok, ReasonCode::Normal));
    assert_eq!(plan.action, BootAction::Jump(Bank::A));
    assert_eq!(plan.save, None);
    assert!(!plan.fallback_warning);
}

#[test]
fn test_confirmed_image_after_fallback_warns() {
    let plan = arbitrate(rec(BankState::A, ModeFlag::Ok, ReasonCode::FallbackBoot));
    assert_eq!(plan.action, BootAction::Jump(Bank::A));
    assert!(plan.fallback_warning);
}

#[test]
fn test_uninitialized_record_defaults_to_bank_a_first_boot() {
    let plan = arbitrate(rec(
        BankState::Unknown(0xFFFF_FFFF),
        ModeFlag::Unknown(0xFF),
        ReasonCode::Unknown(0xFF),
    ));
    assert_eq!(plan.action, BootAction::Jump(Bank::A));
    assert_eq!(plan.save, Some(FlagRecord::first_boot_default()));
}

#[test]
fn test_unknown_mode_with_valid_bank_boots_in_place() {
    // A valid bank with a garbage mode byte falls through to the plain
    // jump rather than inventing a recovery path.
    let plan = arbitrate(rec(BankState::B, ModeFlag::Unknown(7), ReasonCode::Normal));
    assert_eq!(plan.action, BootAction::Jump(Bank::B));
    assert_eq!(plan.save, None);
}

// =============================================================================
// Two-strike exhaustion: no unconfirmed state survives three reboots
// =============================================================================

#[test]
fn test_unconfirmed_states_reach_isp_within_three_boots() {
    let mut starts = Vec::new();
    for bank in [BankState::A, BankState::B] {
        for mode in [ModeFlag::Flashed, ModeFlag::FirstBoot] {
            for reason in [ReasonCode::Normal, ReasonCode::FallbackBoot] {
                starts.push(rec(bank, mode, reason));
            }
        }
    }
    // A blank device that never confirms also runs out of banks.
    starts.push(rec(
        BankState::Unknown(0xFFFF_FFFF),
        ModeFlag::Unknown(0xFF),
        ReasonCode::Unknown(0xFF),
    ));

    for start in starts {
        let mut current = start;
        let mut reached_isp = false;

        for _boot in 0..3 {
            let plan = arbitrate(current);
            current = next_record(current, &plan);
            if plan.action == BootAction::EnterRomIsp {
                reached_isp = true;
                break;
            }
            // The application crashes before assert_boot_ok: the record is
            // whatever the arbiter saved.
        }

        assert!(
            reached_isp,
            "state {:?} did not reach ROM ISP within three boots",
            start
        );
        assert_eq!(
            current,
            rec(
                BankState::FailBoot,
                ModeFlag::FirstBoot,
                ReasonCode::FallbackBoot
            ),
            "state {:?} surrendered with unexpected flags",
            start
        );
    }
}

#[test]
fn test_confirmed_image_is_stable_across_reboots() {
    // A confirmed (Ok) image keeps booting in place; runtime crashes of a
    // confirmed image are not an OTA failure.
    let start = rec(BankState::A, ModeFlag::Ok, ReasonCode::Normal);
    let mut current = start;
    for _ in 0..5 {
        let plan = arbitrate(current);
        assert_eq!(plan.action, BootAction::Jump(Bank::A));
        current = next_record(current, &plan);
    }
    assert_eq!(current, start);
}

#[test]
fn test_fail_boot_is_terminal() {
    let current = rec(
        BankState::FailBoot,
        ModeFlag::FirstBoot,
        ReasonCode::FallbackBoot,
    );
    for _ in 0..3 {
        let plan = arbitrate(current);
        assert_eq!(plan.action, BootAction::EnterRomIsp);
        assert_eq!(plan.save, None);
    }
}
