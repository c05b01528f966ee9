// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Tests for the command surface: framing, authentication, challenge
//! rotation, bank windows, the busy gate, and the flash round trips.

use sha2::{Digest, Sha256};

use seesaw_core::buffer::WriteMethod;
use seesaw_core::cmd::{compute_token, validate_frame};
use seesaw_core::flags::{BankState, FlagRecord, FlagStore, ModeFlag, ReasonCode};
use seesaw_core::layout::{BANK_A_ENTRY, BANK_B_ENTRY, BUILD_KEY, IO_BUFFER_SIZE};
use seesaw_core::service::{CharId, OtaService};
use seesaw_core::status::{AttError, FlashError, JobStatus};
use seesaw_core::Opcode;
use seesaw_sim::{SimPlatform, SoftAes};

/// A device that booted bank `bank` and confirmed itself.
fn running_device(bank: BankState) -> (SimPlatform, OtaService) {
    let mut p = SimPlatform::new(42);
    let mut store = FlagStore::new();
    store.put(FlagRecord::new(bank, ModeFlag::Ok, ReasonCode::Normal));
    store.save(&mut p).unwrap();

    let mut service = OtaService::new(BUILD_KEY);
    service.init(&mut p);
    (p, service)
}

fn frame(opcode: Opcode, args: &[u32]) -> Vec<u8> {
    let mut out = vec![opcode as u8];
    for arg in args {
        out.extend_from_slice(&arg.to_le_bytes());
    }
    out
}

/// Stage `io` (if any), sign against the current challenge, submit.
fn issue(
    p: &mut SimPlatform,
    service: &mut OtaService,
    frame: &[u8],
    io: Option<&[u8]>,
) -> Result<(), AttError> {
    if let Some(payload) = io {
        service.write_attr(p, CharId::Buffer, 0, payload, WriteMethod::Direct)?;
    }
    let challenge = *service.challenge();
    let token = compute_token(&mut SoftAes, &BUILD_KEY, frame, io.unwrap_or(&[]), &challenge);
    service.write_attr(p, CharId::Token, 0, &token, WriteMethod::Direct)?;
    service.write_attr(p, CharId::Main, 0, frame, WriteMethod::Direct)
}

fn run_job(p: &mut SimPlatform, service: &mut OtaService) {
    while service.poll(p) {}
}

// =============================================================================
// Frame validation
// =============================================================================

#[test]
fn test_empty_frame_rejected() {
    assert_eq!(validate_frame(&[]), Err(AttError::InvalidValue));
}

#[test]
fn test_opcode_out_of_range_rejected() {
    assert_eq!(validate_frame(&[6]), Err(AttError::InvalidValue));
    assert_eq!(validate_frame(&[0xFF]), Err(AttError::InvalidValue));
}

#[test]
fn test_wrong_argument_length_rejected() {
    // READ wants 8 argument bytes.
    assert_eq!(validate_frame(&[0, 1, 2, 3]), Err(AttError::InvalidValueSize));
    // REBOOT wants none.
    assert_eq!(validate_frame(&[4, 0]), Err(AttError::InvalidValueSize));
}

#[test]
fn test_valid_frames_accepted() {
    assert_eq!(validate_frame(&frame(Opcode::Read, &[0, 0])), Ok(Opcode::Read));
    assert_eq!(validate_frame(&frame(Opcode::Program, &[0])), Ok(Opcode::Program));
    assert_eq!(validate_frame(&frame(Opcode::Confirm, &[])), Ok(Opcode::Confirm));
}

// =============================================================================
// Authentication and challenge rotation
// =============================================================================

#[test]
fn test_signed_command_accepted() {
    let (mut p, mut service) = running_device(BankState::A);
    let read = frame(Opcode::Read, &[BANK_A_ENTRY, 16]);
    assert_eq!(issue(&mut p, &mut service, &read, None), Ok(()));
}

#[test]
fn test_token_against_stale_challenge_rejected() {
    let (mut p, mut service) = running_device(BankState::A);
    let read = frame(Opcode::Read, &[BANK_A_ENTRY, 16]);

    let stale = *service.challenge();
    // A rejected command burns the challenge the token was built against.
    service
        .write_attr(&mut p, CharId::Main, 0, &[0xEE], WriteMethod::Direct)
        .unwrap_err();
    assert_ne!(&stale, service.challenge());

    let token = compute_token(&mut SoftAes, &BUILD_KEY, &read, &[], &stale);
    service
        .write_attr(&mut p, CharId::Token, 0, &token, WriteMethod::Direct)
        .unwrap();
    assert_eq!(
        service.write_attr(&mut p, CharId::Main, 0, &read, WriteMethod::Direct),
        Err(AttError::InsufficientAuthentication)
    );
}

#[test]
fn test_short_token_rejected_as_size_error() {
    let (mut p, mut service) = running_device(BankState::A);
    let read = frame(Opcode::Read, &[BANK_A_ENTRY, 16]);
    service
        .write_attr(&mut p, CharId::Token, 0, &[0xAA; 8], WriteMethod::Direct)
        .unwrap();
    assert_eq!(
        service.write_attr(&mut p, CharId::Main, 0, &read, WriteMethod::Direct),
        Err(AttError::InvalidValueSize)
    );
}

#[test]
fn test_main_write_rotates_challenge_on_accept_and_reject() {
    let (mut p, mut service) = running_device(BankState::A);

    // Accept.
    let before = *service.challenge();
    let read = frame(Opcode::Read, &[BANK_A_ENTRY, 16]);
    issue(&mut p, &mut service, &read, None).unwrap();
    assert_ne!(before, *service.challenge());

    // Reject (garbage frame).
    let before = *service.challenge();
    let _ = service.write_attr(&mut p, CharId::Main, 0, &[0xEE], WriteMethod::Direct);
    assert_ne!(before, *service.challenge());
}

#[test]
fn test_token_and_buffer_writes_leave_challenge_unchanged() {
    let (mut p, mut service) = running_device(BankState::A);
    let before = *service.challenge();

    service
        .write_attr(&mut p, CharId::Token, 0, &[0x11; 16], WriteMethod::Direct)
        .unwrap();
    service
        .write_attr(&mut p, CharId::Buffer, 0, &[0x22; 64], WriteMethod::Direct)
        .unwrap();

    assert_eq!(before, *service.challenge());
}

#[test]
fn test_replayed_command_rejected() {
    let (mut p, mut service) = running_device(BankState::A);
    let read = frame(Opcode::Read, &[BANK_A_ENTRY, 32]);

    // Capture a valid (frame, token) pair and use it once.
    let challenge = *service.challenge();
    let token = compute_token(&mut SoftAes, &BUILD_KEY, &read, &[], &challenge);
    service
        .write_attr(&mut p, CharId::Token, 0, &token, WriteMethod::Direct)
        .unwrap();
    service
        .write_attr(&mut p, CharId::Main, 0, &read, WriteMethod::Direct)
        .unwrap();

    // Replay the same pair: the challenge has rotated underneath it.
    service
        .write_attr(&mut p, CharId::Token, 0, &token, WriteMethod::Direct)
        .unwrap();
    assert_eq!(
        service.write_attr(&mut p, CharId::Main, 0, &read, WriteMethod::Direct),
        Err(AttError::InsufficientAuthentication)
    );
}

#[test]
fn test_program_token_binds_payload() {
    let (mut p, mut service) = running_device(BankState::A);
    let program = frame(Opcode::Program, &[BANK_B_ENTRY]);
    let payload = [0x5A; 64];

    service
        .write_attr(&mut p, CharId::Buffer, 0, &payload, WriteMethod::Direct)
        .unwrap();
    // Sign over a different payload than the one staged.
    let challenge = *service.challenge();
    let token = compute_token(&mut SoftAes, &BUILD_KEY, &program, &[0xA5; 64], &challenge);
    service
        .write_attr(&mut p, CharId::Token, 0, &token, WriteMethod::Direct)
        .unwrap();
    assert_eq!(
        service.write_attr(&mut p, CharId::Main, 0, &program, WriteMethod::Direct),
        Err(AttError::InsufficientAuthentication)
    );
}

// =============================================================================
// Address windows
// =============================================================================

#[test]
fn test_program_into_active_bank_rejected_authenticated() {
    let (mut p, mut service) = running_device(BankState::A);
    let program = frame(Opcode::Program, &[BANK_A_ENTRY]);
    assert_eq!(
        issue(&mut p, &mut service, &program, Some(&[0u8; 16])),
        Err(AttError::InvalidRange)
    );
}

#[test]
fn test_program_into_active_bank_unauthenticated_fails_auth_first() {
    let (mut p, mut service) = running_device(BankState::A);
    let program = frame(Opcode::Program, &[BANK_A_ENTRY]);
    service
        .write_attr(&mut p, CharId::Buffer, 0, &[0u8; 16], WriteMethod::Direct)
        .unwrap();
    service
        .write_attr(&mut p, CharId::Token, 0, &[0u8; 16], WriteMethod::Direct)
        .unwrap();
    assert_eq!(
        service.write_attr(&mut p, CharId::Main, 0, &program, WriteMethod::Direct),
        Err(AttError::InsufficientAuthentication)
    );
}

#[test]
fn test_erase_inactive_bank_window_enforced() {
    let (mut p, mut service) = running_device(BankState::B);
    // Bank B active: erase must target bank A.
    let erase_b = frame(Opcode::Erase, &[BANK_B_ENTRY, 4096]);
    assert_eq!(
        issue(&mut p, &mut service, &erase_b, None),
        Err(AttError::InvalidRange)
    );
    let erase_a = frame(Opcode::Erase, &[BANK_A_ENTRY, 4096]);
    assert_eq!(issue(&mut p, &mut service, &erase_a, None), Ok(()));
}

#[test]
fn test_read_accepts_either_bank() {
    let (mut p, mut service) = running_device(BankState::A);
    assert_eq!(
        issue(&mut p, &mut service, &frame(Opcode::Read, &[BANK_A_ENTRY, 16]), None),
        Ok(())
    );
    assert_eq!(
        issue(&mut p, &mut service, &frame(Opcode::Read, &[BANK_B_ENTRY, 16]), None),
        Ok(())
    );
    assert_eq!(
        issue(&mut p, &mut service, &frame(Opcode::Read, &[0, 16]), None),
        Err(AttError::InvalidRange)
    );
}

#[test]
fn test_program_with_corrupt_flags_is_unlikely() {
    let mut p = SimPlatform::new(7);
    // No flag record at all.
    let mut service = OtaService::new(BUILD_KEY);
    service.init(&mut p);
    let program = frame(Opcode::Program, &[BANK_B_ENTRY]);
    assert_eq!(
        issue(&mut p, &mut service, &program, Some(&[0u8; 16])),
        Err(AttError::Unlikely)
    );
}

// =============================================================================
// Busy gate and async jobs
// =============================================================================

#[test]
fn test_busy_gate_blocks_all_writes_until_completion() {
    let (mut p, mut service) = running_device(BankState::A);
    let erase = frame(Opcode::Erase, &[BANK_B_ENTRY, 3 * 4096]);
    issue(&mut p, &mut service, &erase, None).unwrap();

    assert!(service.is_busy());
    assert_eq!(service.last_status(), JobStatus::Pending);
    for char_id in [CharId::Main, CharId::Buffer, CharId::Token] {
        assert_eq!(
            service.write_attr(&mut p, char_id, 0, &[0x00; 4], WriteMethod::Direct),
            Err(AttError::WriteNotPermitted)
        );
    }

    run_job(&mut p, &mut service);
    assert!(!service.is_busy());
    assert_eq!(service.last_status(), JobStatus::Success);
}

#[test]
fn test_erase_runs_one_block_per_tick() {
    let (mut p, mut service) = running_device(BankState::A);
    let erase = frame(Opcode::Erase, &[BANK_B_ENTRY, 3 * 4096]);
    issue(&mut p, &mut service, &erase, None).unwrap();

    // Three blocks: two ticks report more work, the third completes.
    assert!(service.poll(&mut p));
    assert!(service.poll(&mut p));
    assert!(!service.poll(&mut p));
    assert_eq!(service.last_status(), JobStatus::Success);
}

#[test]
fn test_vendor_erase_failure_surfaces_as_job_status() {
    let (mut p, mut service) = running_device(BankState::A);
    p.fail_next_erase = Some(FlashError(0x31));

    let erase = frame(Opcode::Erase, &[BANK_B_ENTRY, 4096]);
    issue(&mut p, &mut service, &erase, None).unwrap();
    run_job(&mut p, &mut service);

    assert!(!service.is_busy());
    assert_eq!(service.last_status(), JobStatus::Failed(FlashError(0x31)));

    // MAIN readback carries the vendor code.
    let main = service.read_attr(&mut p, CharId::Main, 0, 2).unwrap();
    assert_eq!(main.as_slice(), &[0, 0x31]);
}

#[test]
fn test_reboot_latches_reset() {
    let (mut p, mut service) = running_device(BankState::A);
    issue(&mut p, &mut service, &frame(Opcode::Reboot, &[]), None).unwrap();
    assert!(service.is_busy());
    run_job(&mut p, &mut service);
    assert!(p.reset_requested);
}

// =============================================================================
// Flash round trips
// =============================================================================

#[test]
fn test_program_then_read_round_trip() {
    let (mut p, mut service) = running_device(BankState::A);
    let payload: Vec<u8> = (0..128u32).map(|i| (i * 7) as u8).collect();

    let program = frame(Opcode::Program, &[BANK_B_ENTRY + 256]);
    issue(&mut p, &mut service, &program, Some(&payload)).unwrap();

    let read = frame(Opcode::Read, &[BANK_B_ENTRY + 256, payload.len() as u32]);
    issue(&mut p, &mut service, &read, None).unwrap();

    let buffer = service
        .read_attr(&mut p, CharId::Buffer, 0, IO_BUFFER_SIZE)
        .unwrap();
    assert_eq!(buffer.as_slice(), payload.as_slice());
}

#[test]
fn test_read_clips_length_to_io_buffer() {
    let (mut p, mut service) = running_device(BankState::A);
    let read = frame(Opcode::Read, &[BANK_A_ENTRY, 2048]);
    issue(&mut p, &mut service, &read, None).unwrap();

    let buffer = service
        .read_attr(&mut p, CharId::Buffer, 0, IO_BUFFER_SIZE)
        .unwrap();
    assert_eq!(buffer.len(), IO_BUFFER_SIZE);
}

#[test]
fn test_verify_digest_matches_programmed_bytes() {
    let (mut p, mut service) = running_device(BankState::A);
    let payload: Vec<u8> = (0..600u32).map(|i| (i ^ 0x3c) as u8).collect();

    // Program in two chunks (verify spans multiple 256-byte ticks).
    for (i, chunk) in payload.chunks(IO_BUFFER_SIZE).enumerate() {
        let addr = BANK_B_ENTRY + (i * IO_BUFFER_SIZE) as u32;
        issue(&mut p, &mut service, &frame(Opcode::Program, &[addr]), Some(chunk)).unwrap();
    }

    let verify = frame(Opcode::Verify, &[BANK_B_ENTRY, payload.len() as u32]);
    issue(&mut p, &mut service, &verify, None).unwrap();
    run_job(&mut p, &mut service);
    assert_eq!(service.last_status(), JobStatus::Success);

    let digest = service
        .read_attr(&mut p, CharId::Buffer, 0, IO_BUFFER_SIZE)
        .unwrap();
    let expected: [u8; 32] = Sha256::digest(&payload).into();
    assert_eq!(digest.as_slice(), &expected);
}

// =============================================================================
// CONFIRM
// =============================================================================

#[test]
fn test_confirm_marks_flashed_and_reboots() {
    let (mut p, mut service) = running_device(BankState::A);
    issue(&mut p, &mut service, &frame(Opcode::Confirm, &[]), None).unwrap();
    run_job(&mut p, &mut service);
    assert!(p.reset_requested);

    // Persisted flags: same bank, Flashed, Normal reason (not the mode
    // value, which happens to share the 0 encoding).
    let mut store = FlagStore::new();
    let rec = store.get(&mut p);
    assert_eq!(rec.bank, BankState::A);
    assert_eq!(rec.mode, ModeFlag::Flashed);
    assert_eq!(rec.reason, ReasonCode::Normal);
}

// =============================================================================
// Status readback
// =============================================================================

#[test]
fn test_flag_characteristics_readback() {
    let (mut p, mut service) = running_device(BankState::A);

    let bank = service.read_attr(&mut p, CharId::FlashBank, 0, 4).unwrap();
    assert_eq!(bank.as_slice(), &0xA5A5_A5A5u32.to_le_bytes());

    let label = service
        .read_attr(&mut p, CharId::FlashBankStr, 0, 64)
        .unwrap();
    assert_eq!(label.as_slice(), b"Bank A");

    let mode = service.read_attr(&mut p, CharId::FlashMode, 0, 1).unwrap();
    assert_eq!(mode.as_slice(), &[0]);

    let reason = service
        .read_attr(&mut p, CharId::BootReasonStr, 0, 64)
        .unwrap();
    assert_eq!(reason.as_slice(), b"Normal");
}

#[test]
fn test_challenge_characteristic_is_not_writable() {
    let (mut p, mut service) = running_device(BankState::A);
    assert_eq!(
        service.write_attr(&mut p, CharId::Challenge, 0, &[0; 16], WriteMethod::Direct),
        Err(AttError::WriteNotPermitted)
    );
}
