// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! AES-CMAC (RFC 4493) over the platform's AES-128 block engine.
//!
//! All state lives on the stack; nothing here allocates, so the same code
//! runs inside the radio callback on the chip and in host tests.

use crate::hal::AesOps;

const RB: u8 = 0x87;

fn xor16(a: &mut [u8; 16], b: &[u8; 16]) {
    for i in 0..16 {
        a[i] ^= b[i];
    }
}

/// Left-shift a 128-bit value by one bit, returning the shifted value and
/// the bit that fell off the top.
fn left_shift(input: &[u8; 16]) -> ([u8; 16], bool) {
    let mut out = [0u8; 16];
    let mut carry = 0u8;
    for i in (0..16).rev() {
        out[i] = (input[i] << 1) | carry;
        carry = (input[i] >> 7) & 1;
    }
    (out, carry == 1)
}

/// Derive the RFC 4493 subkeys K1, K2 from AES-128(key, 0^16) by doubling
/// over GF(2^128) with Rb = 0x87.
pub fn subkeys(aes: &mut impl AesOps, key: &[u8; 16]) -> ([u8; 16], [u8; 16]) {
    let mut l = [0u8; 16];
    aes.aes128_encrypt(key, &mut l);

    let (mut k1, overflow) = left_shift(&l);
    if overflow {
        k1[15] ^= RB;
    }
    let (mut k2, overflow) = left_shift(&k1);
    if overflow {
        k2[15] ^= RB;
    }
    (k1, k2)
}

/// Compute the AES-CMAC of `msg` under `key`.
pub fn aes_cmac(aes: &mut impl AesOps, key: &[u8; 16], msg: &[u8]) -> [u8; 16] {
    let (k1, k2) = subkeys(aes, key);

    // Build the padded/masked last block per the three RFC cases.
    let mut last = [0u8; 16];
    let full_blocks;
    if msg.is_empty() {
        last[0] = 0x80;
        xor16(&mut last, &k2);
        full_blocks = 0;
    } else if msg.len() % 16 == 0 {
        full_blocks = msg.len() / 16 - 1;
        last.copy_from_slice(&msg[16 * full_blocks..]);
        xor16(&mut last, &k1);
    } else {
        full_blocks = msg.len() / 16;
        let tail = &msg[16 * full_blocks..];
        last[..tail.len()].copy_from_slice(tail);
        last[tail.len()] = 0x80;
        xor16(&mut last, &k2);
    }

    // CBC-chain with a zero IV; the final ciphertext is the MAC.
    let mut x = [0u8; 16];
    for i in 0..full_blocks {
        let mut block = [0u8; 16];
        block.copy_from_slice(&msg[16 * i..16 * (i + 1)]);
        xor16(&mut block, &x);
        aes.aes128_encrypt(key, &mut block);
        x = block;
    }

    xor16(&mut x, &last);
    aes.aes128_encrypt(key, &mut x);
    x
}

/// Constant-time 16-byte equality; true when the buffers match.
///
/// The token compare must not leak how many leading bytes agreed.
pub fn ct_eq16(a: &[u8; 16], b: &[u8; 16]) -> bool {
    let mut diff = 0u8;
    for i in 0..16 {
        diff |= a[i] ^ b[i];
    }
    diff == 0
}
