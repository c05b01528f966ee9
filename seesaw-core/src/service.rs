// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! The OTA attribute service: ten characteristics under one service.
//!
//! `OtaService` is the single owner of everything the command surface
//! touches - flag cache, challenge, IO buffer, token buffer, job engine -
//! instantiated once at startup and handed the platform by exclusive
//! borrow on each call. The radio stack routes attribute reads and writes
//! here; the outer event loop calls `poll()` each tick to advance async
//! jobs.

use heapless::Vec;

use crate::buffer::{read_slice, IoBuffer, TokenBuf, WriteMethod};
use crate::cmd;
use crate::flags::FlagStore;
use crate::hal::{EntropyOps, Platform};
use crate::job::JobEngine;
use crate::layout::IO_BUFFER_SIZE;
use crate::status::{AttError, AttResult, JobStatus};

/// The characteristics of the OTA service.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CharId {
    /// Write: command frame. Read: `{busy, last_async_status}`.
    Main,
    /// The IO buffer (prepared writes supported).
    Buffer,
    /// Current 16-byte challenge (read only).
    Challenge,
    /// Client CMAC token (prepared writes supported).
    Token,
    /// Raw 32-bit bank magic.
    FlashBank,
    FlashBankStr,
    /// Mode flag byte.
    FlashMode,
    FlashModeStr,
    /// Boot reason byte.
    BootReason,
    BootReasonStr,
}

/// Largest value any characteristic serves in one read.
pub type AttValue = Vec<u8, IO_BUFFER_SIZE>;

pub struct OtaService {
    key: [u8; 16],
    challenge: [u8; 16],
    flags: FlagStore,
    jobs: JobEngine,
    io: IoBuffer,
    token: TokenBuf,
}

impl OtaService {
    /// Create the service. Call [`init`](Self::init) before exposing it so
    /// the first challenge is unpredictable.
    pub const fn new(key: [u8; 16]) -> Self {
        Self {
            key,
            challenge: [0u8; 16],
            flags: FlagStore::new(),
            jobs: JobEngine::new(),
            io: IoBuffer::new(),
            token: TokenBuf::new(),
        }
    }

    /// Seed the first challenge.
    pub fn init(&mut self, p: &mut impl EntropyOps) {
        self.rotate_challenge(p);
    }

    pub fn challenge(&self) -> &[u8; 16] {
        &self.challenge
    }

    pub fn is_busy(&self) -> bool {
        self.jobs.is_busy()
    }

    pub fn last_status(&self) -> JobStatus {
        self.jobs.last_status()
    }

    /// Application hook: confirm a clean start-up (idempotent).
    pub fn assert_boot_ok<P: Platform>(&mut self, p: &mut P) -> AttResult<()> {
        self.flags.assert_boot_ok(p).map_err(AttError::from)
    }

    /// Advance the pending async job by one tick. Returns true while more
    /// ticks are needed.
    pub fn poll<P: Platform>(&mut self, p: &mut P) -> bool {
        self.jobs.poll(p, &mut self.io)
    }

    /// Replace the challenge with fresh randomness, 32 bits at a time.
    fn rotate_challenge(&mut self, p: &mut impl EntropyOps) {
        for word in self.challenge.chunks_exact_mut(4) {
            word.copy_from_slice(&p.rand_u32().to_le_bytes());
        }
    }

    /// Serve an attribute read at `offset`, up to `max_len` bytes.
    pub fn read_attr<P: Platform>(
        &mut self,
        p: &mut P,
        char_id: CharId,
        offset: usize,
        max_len: usize,
    ) -> AttResult<AttValue> {
        let mut out = AttValue::new();
        let push = |out: &mut AttValue, data: &[u8]| -> AttResult<()> {
            let part = read_slice(data, offset, max_len)?;
            out.extend_from_slice(part).map_err(|_| AttError::Unlikely)
        };

        match char_id {
            CharId::Main => {
                let status = [self.jobs.is_busy() as u8, self.jobs.last_status().code()];
                push(&mut out, &status)?;
            }
            CharId::Buffer => push(&mut out, self.io.contents())?,
            CharId::Challenge => push(&mut out, &self.challenge)?,
            CharId::Token => push(&mut out, self.token.contents())?,
            CharId::FlashBank => {
                let raw = self.flags.get(p).bank.raw().to_le_bytes();
                push(&mut out, &raw)?;
            }
            CharId::FlashBankStr => push(&mut out, self.flags.get(p).bank.label().as_bytes())?,
            CharId::FlashMode => push(&mut out, &[self.flags.get(p).mode.raw()])?,
            CharId::FlashModeStr => push(&mut out, self.flags.get(p).mode.label().as_bytes())?,
            CharId::BootReason => push(&mut out, &[self.flags.get(p).reason.raw()])?,
            CharId::BootReasonStr => push(&mut out, self.flags.get(p).reason.label().as_bytes())?,
        }
        Ok(out)
    }

    /// Handle an attribute write.
    ///
    /// While an async job runs, every write is refused up front - the job
    /// may be using the IO buffer, and the command surface is serialized on
    /// the busy flag. MAIN writes rotate the challenge whether they are
    /// accepted or rejected; TOKEN and BUFFER writes never do (the client
    /// is still assembling its request against the challenge it read).
    pub fn write_attr<P: Platform>(
        &mut self,
        p: &mut P,
        char_id: CharId,
        offset: usize,
        value: &[u8],
        method: WriteMethod,
    ) -> AttResult<()> {
        if self.jobs.is_busy() {
            return Err(AttError::WriteNotPermitted);
        }

        match char_id {
            CharId::Main => {
                let status = self.handle_command(p, offset, value, method);
                // Rotate before the reply is produced, so a captured
                // (frame, token) pair is stale the moment it is answered.
                self.rotate_challenge(p);
                status
            }
            CharId::Buffer => self.io.write(offset, value, method),
            CharId::Token => self.token.write(offset, value, method),
            _ => Err(AttError::WriteNotPermitted),
        }
    }

    fn handle_command<P: Platform>(
        &mut self,
        p: &mut P,
        offset: usize,
        value: &[u8],
        method: WriteMethod,
    ) -> AttResult<()> {
        if method != WriteMethod::Direct {
            return Err(AttError::InvalidValue);
        }
        if offset != 0 {
            return Err(AttError::InvalidOffset);
        }
        cmd::handle(
            p,
            &mut self.flags,
            &mut self.jobs,
            &mut self.io,
            &self.key,
            &self.challenge,
            self.token.contents(),
            value,
        )
    }
}
