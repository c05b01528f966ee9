// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Cooperative engine for long-running flash work.
//!
//! A full-bank erase or SHA-256 pass takes far longer than the radio
//! link's attribute turnaround, so those jobs run in bounded ticks: one
//! erase block, or up to 256 hashed bytes, per `poll()`. Between ticks the
//! event loop services the radio, and the client watches progress through
//! the MAIN characteristic's `{busy, last_status}` pair.
//!
//! At most one job exists at a time; the command layer's busy gate refuses
//! new work while `is_busy()`. There is no cancellation - a job runs to
//! completion or to the first vendor flash error.

use sha2::{Digest, Sha256};

use crate::buffer::IoBuffer;
use crate::hal::{FlashOps, SysOps};
use crate::layout::{FLASH_ERASE_BLOCK, VERIFY_CHUNK};
use crate::status::JobStatus;

enum Job {
    Erase {
        addr: u32,
        len: u32,
        offset: u32,
    },
    Verify {
        addr: u32,
        len: u32,
        offset: u32,
        sha: Sha256,
    },
    Reboot,
}

pub struct JobEngine {
    job: Option<Job>,
    status: JobStatus,
}

impl JobEngine {
    pub const fn new() -> Self {
        Self {
            job: None,
            status: JobStatus::Success,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.job.is_some()
    }

    /// Completion code of the most recent job (`Pending` while one runs).
    pub fn last_status(&self) -> JobStatus {
        self.status
    }

    pub fn start_erase(&mut self, addr: u32, len: u32) {
        debug_assert!(self.job.is_none());
        self.status = JobStatus::Pending;
        self.job = Some(Job::Erase {
            addr,
            len,
            offset: 0,
        });
    }

    pub fn start_verify(&mut self, addr: u32, len: u32) {
        debug_assert!(self.job.is_none());
        self.status = JobStatus::Pending;
        self.job = Some(Job::Verify {
            addr,
            len,
            offset: 0,
            sha: Sha256::new(),
        });
    }

    pub fn start_reboot(&mut self) {
        debug_assert!(self.job.is_none());
        self.status = JobStatus::Pending;
        self.job = Some(Job::Reboot);
    }

    /// Run one tick of the pending job. Returns true while more ticks are
    /// needed. The verify digest lands in `io` on the final tick.
    pub fn poll<P: FlashOps + SysOps>(&mut self, p: &mut P, io: &mut IoBuffer) -> bool {
        let Some(job) = self.job.as_mut() else {
            return false;
        };

        // `Some(status)` ends the job; `None` re-arms it for the next tick.
        let finished = match job {
            Job::Erase { addr, len, offset } => {
                let remaining = *len - *offset;
                let step = remaining.min(FLASH_ERASE_BLOCK);
                match p.flash_erase(*addr + *offset, step) {
                    Err(e) => Some(JobStatus::Failed(e)),
                    Ok(()) => {
                        *offset += step;
                        if *offset >= *len {
                            Some(JobStatus::Success)
                        } else {
                            None
                        }
                    }
                }
            }
            Job::Verify {
                addr,
                len,
                offset,
                sha,
            } => {
                let remaining = (*len - *offset) as usize;
                let step = remaining.min(VERIFY_CHUNK);
                let mut chunk = [0u8; VERIFY_CHUNK];
                p.flash_read(*addr + *offset, &mut chunk[..step]);
                sha.update(&chunk[..step]);
                *offset += step as u32;

                if *offset >= *len {
                    let digest: [u8; 32] = core::mem::take(sha).finalize().into();
                    io.set_contents(&digest);
                    Some(JobStatus::Success)
                } else {
                    None
                }
            }
            Job::Reboot => {
                // Let any in-flight radio ack drain before the reset fires.
                p.disable_interrupts();
                p.delay_ms(10);
                p.system_reset();
                // Unreachable on hardware; the simulator latches the reset
                // and continues here.
                Some(JobStatus::Success)
            }
        };

        match finished {
            Some(status) => {
                self.status = status;
                self.job = None;
                false
            }
            None => true,
        }
    }
}

impl Default for JobEngine {
    fn default() -> Self {
        Self::new()
    }
}
