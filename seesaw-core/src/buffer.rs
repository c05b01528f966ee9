// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Prepared-write accumulation for the writable characteristics.
//!
//! The attribute protocol delivers large values as a sequence of prepared
//! segments followed by an execute; small values arrive as one direct
//! write. `WriteBuf` tracks one such session per target buffer: the first
//! prepared segment clears the buffer, subsequent segments land at their
//! offsets, and the logical length is the high-watermark of `offset + len`.

use crate::layout::IO_BUFFER_SIZE;
use crate::status::{AttError, AttResult};

/// How a write arrived at the attribute server.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WriteMethod {
    /// Prepared-write segment at an offset.
    Prepare,
    /// Finalize an accumulation session.
    Execute,
    /// Plain write; resets any session in flight.
    Direct,
}

/// Fixed-size attribute value buffer with a prepared-write session.
pub struct WriteBuf<const N: usize> {
    data: [u8; N],
    len: usize,
    writing: bool,
}

/// The PROGRAM payload / READ / VERIFY output scratch region.
pub type IoBuffer = WriteBuf<IO_BUFFER_SIZE>;

/// Storage for the client's 16-byte CMAC token.
pub type TokenBuf = WriteBuf<16>;

impl<const N: usize> WriteBuf<N> {
    pub const fn new() -> Self {
        Self {
            data: [0u8; N],
            len: 0,
            writing: false,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes currently held (up to the session's high watermark).
    pub fn contents(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Overwrite the buffer with device-produced output (READ data or a
    /// verify digest). Ends any client session.
    pub fn set_contents(&mut self, src: &[u8]) {
        debug_assert!(src.len() <= N);
        self.data[..src.len()].copy_from_slice(src);
        self.len = src.len();
        self.writing = false;
    }

    /// Reserve `len` bytes for device output and hand back the region to
    /// fill. Ends any client session.
    pub fn fill(&mut self, len: usize) -> &mut [u8] {
        debug_assert!(len <= N);
        self.len = len;
        self.writing = false;
        &mut self.data[..len]
    }

    /// Apply one client write per the attribute protocol rules.
    pub fn write(&mut self, offset: usize, value: &[u8], method: WriteMethod) -> AttResult<()> {
        match method {
            WriteMethod::Prepare => {
                if offset + value.len() > N {
                    return Err(AttError::InvalidValueSize);
                }
                if !self.writing {
                    // First segment of a new session starts from a clean
                    // buffer.
                    self.data = [0u8; N];
                    self.len = 0;
                    self.writing = true;
                }
                if offset + value.len() > self.len {
                    self.len = offset + value.len();
                }
                self.data[offset..offset + value.len()].copy_from_slice(value);
                Ok(())
            }
            WriteMethod::Execute => {
                if !self.writing {
                    return Err(AttError::InvalidValue);
                }
                self.writing = false;
                Ok(())
            }
            WriteMethod::Direct => {
                if value.len() > N {
                    return Err(AttError::InvalidValueSize);
                }
                if offset != 0 {
                    return Err(AttError::InvalidOffset);
                }
                self.data[..value.len()].copy_from_slice(value);
                self.len = value.len();
                self.writing = false;
                Ok(())
            }
        }
    }
}

impl<const N: usize> Default for WriteBuf<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Serve a partial read at `offset`, clipped to `max_len`.
pub fn read_slice(data: &[u8], offset: usize, max_len: usize) -> AttResult<&[u8]> {
    if data.is_empty() {
        return Ok(&[]);
    }
    if offset >= data.len() {
        return Err(AttError::InvalidOffset);
    }
    let take = max_len.min(data.len() - offset);
    Ok(&data[offset..offset + take])
}
