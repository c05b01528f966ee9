// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Command frame validation, authentication, and dispatch.
//!
//! A frame is one opcode byte followed by that opcode's fixed little-endian
//! argument layout. Handling is three steps, each gating the next:
//! validate the framing, check the CMAC token against the current
//! challenge, then dispatch to flash (READ/PROGRAM), the job engine
//! (ERASE/VERIFY/REBOOT), or the flag store (CONFIRM).

use crate::buffer::IoBuffer;
use crate::cmac::{aes_cmac, ct_eq16};
use crate::flags::{FlagStore, ModeFlag, ReasonCode};
use crate::hal::{AesOps, EepromOps, FlashOps};
use crate::job::JobEngine;
use crate::layout::{check_range, check_range_either, IO_BUFFER_SIZE};
use crate::status::{AttError, AttResult};

/// Remote command opcodes, in wire order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Opcode {
    Read,
    Program,
    Erase,
    Verify,
    Reboot,
    Confirm,
}

impl Opcode {
    pub fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Opcode::Read),
            1 => Some(Opcode::Program),
            2 => Some(Opcode::Erase),
            3 => Some(Opcode::Verify),
            4 => Some(Opcode::Reboot),
            5 => Some(Opcode::Confirm),
            _ => None,
        }
    }

    /// Bytes of arguments after the opcode byte.
    pub fn arg_len(self) -> usize {
        match self {
            Opcode::Read => 8,    // addr + len
            Opcode::Program => 4, // addr; payload rides the IO buffer
            Opcode::Erase => 8,   // addr + len
            Opcode::Verify => 8,  // addr + len
            Opcode::Reboot => 0,
            Opcode::Confirm => 0,
        }
    }

    /// Whether the IO buffer's content is client input bound into the
    /// token. READ/VERIFY use the buffer as output, so it must not
    /// authenticate the request.
    pub fn uses_io_buffer(self) -> bool {
        matches!(self, Opcode::Program)
    }
}

/// Check framing: an opcode in range and exactly the expected length.
pub fn validate_frame(frame: &[u8]) -> AttResult<Opcode> {
    if frame.is_empty() {
        return Err(AttError::InvalidValue);
    }
    let opcode = Opcode::from_u8(frame[0]).ok_or(AttError::InvalidValue)?;
    if frame.len() != 1 + opcode.arg_len() {
        return Err(AttError::InvalidValueSize);
    }
    Ok(opcode)
}

/// Client/device-shared token derivation:
///
/// ```text
/// H_cmd = CMAC(K, frame)
/// H_io  = CMAC(K, io)    when the opcode binds the IO buffer and io is
///       = 0^16           nonempty, zeros otherwise
/// T     = CMAC(K, H_cmd || H_io || challenge)
/// ```
pub fn compute_token(
    aes: &mut impl AesOps,
    key: &[u8; 16],
    frame: &[u8],
    io: &[u8],
    challenge: &[u8; 16],
) -> [u8; 16] {
    let uses_io = frame
        .first()
        .and_then(|&op| Opcode::from_u8(op))
        .map(Opcode::uses_io_buffer)
        .unwrap_or(false);

    let mut msg = [0u8; 48];
    msg[0..16].copy_from_slice(&aes_cmac(aes, key, frame));
    if uses_io && !io.is_empty() {
        msg[16..32].copy_from_slice(&aes_cmac(aes, key, io));
    }
    msg[32..48].copy_from_slice(challenge);
    aes_cmac(aes, key, &msg)
}

/// Recompute the token and compare it (constant time) against the client's.
pub fn authenticate(
    aes: &mut impl AesOps,
    key: &[u8; 16],
    frame: &[u8],
    io: &[u8],
    challenge: &[u8; 16],
    token: &[u8],
) -> AttResult<()> {
    let token: &[u8; 16] = token
        .try_into()
        .map_err(|_| AttError::InvalidValueSize)?;
    let expected = compute_token(aes, key, frame, io, challenge);
    if !ct_eq16(&expected, token) {
        return Err(AttError::InsufficientAuthentication);
    }
    Ok(())
}

fn read_u32(frame: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([frame[at], frame[at + 1], frame[at + 2], frame[at + 3]])
}

/// Dispatch a validated, authenticated frame.
///
/// Async acceptances leave the engine busy with status Pending; the client
/// polls MAIN for completion.
pub fn dispatch<P: FlashOps + EepromOps>(
    p: &mut P,
    flags: &mut FlagStore,
    jobs: &mut JobEngine,
    io: &mut IoBuffer,
    opcode: Opcode,
    frame: &[u8],
) -> AttResult<()> {
    match opcode {
        Opcode::Read => {
            let addr = read_u32(frame, 1);
            let len = read_u32(frame, 1 + 4);
            check_range_either(addr, len)?;
            let len = (len as usize).min(IO_BUFFER_SIZE);
            p.flash_read(addr, io.fill(len));
            Ok(())
        }
        Opcode::Program => {
            let addr = read_u32(frame, 1);
            let len = io.len() as u32;
            let target = flags.inactive_bank(p).ok_or(AttError::Unlikely)?;
            check_range(target, addr, len)?;
            p.flash_program(addr, io.contents())?;
            Ok(())
        }
        Opcode::Erase => {
            let addr = read_u32(frame, 1);
            let len = read_u32(frame, 1 + 4);
            let target = flags.inactive_bank(p).ok_or(AttError::Unlikely)?;
            check_range(target, addr, len)?;
            jobs.start_erase(addr, len);
            Ok(())
        }
        Opcode::Verify => {
            let addr = read_u32(frame, 1);
            let len = read_u32(frame, 1 + 4);
            check_range_either(addr, len)?;
            jobs.start_verify(addr, len);
            Ok(())
        }
        Opcode::Reboot => {
            jobs.start_reboot();
            Ok(())
        }
        Opcode::Confirm => {
            // Mark this image as freshly flashed; the arbiter swaps banks
            // on the reboot that follows.
            flags.set_mode(p, ModeFlag::Flashed);
            flags.set_reason(p, ReasonCode::Normal);
            flags.save(p)?;
            jobs.start_reboot();
            Ok(())
        }
    }
}

/// Full command path: validate, authenticate, dispatch.
#[allow(clippy::too_many_arguments)]
pub fn handle<P: FlashOps + EepromOps + AesOps>(
    p: &mut P,
    flags: &mut FlagStore,
    jobs: &mut JobEngine,
    io: &mut IoBuffer,
    key: &[u8; 16],
    challenge: &[u8; 16],
    token: &[u8],
    frame: &[u8],
) -> AttResult<()> {
    let opcode = validate_frame(frame)?;
    authenticate(p, key, frame, io.contents(), challenge, token)?;
    dispatch(p, flags, jobs, io, opcode, frame)
}
