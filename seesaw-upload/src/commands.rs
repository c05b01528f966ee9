// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Client-side implementations of the OTA flows.
//!
//! Every command is signed: fetch the device's current challenge, derive
//! the CMAC token over the frame (and the IO buffer for PROGRAM), write
//! the token, then write the frame. The challenge rotates on every MAIN
//! write, so each command needs a fresh fetch.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use sha2::{Digest, Sha256};

use seesaw_core::cmd::compute_token;
use seesaw_core::flags::BankState;
use seesaw_core::layout::{Bank, BANK_SIZE, BUILD_KEY, FLASH_ERASE_BLOCK, IO_BUFFER_SIZE};
use seesaw_core::service::CharId;
use seesaw_core::Opcode;
use seesaw_sim::SoftAes;

use crate::link::AttributeLink;

fn frame(opcode: Opcode, args: &[u32]) -> Vec<u8> {
    let mut out = vec![opcode as u8];
    for arg in args {
        out.extend_from_slice(&arg.to_le_bytes());
    }
    out
}

/// Sign and submit one command frame, staging `io` into the buffer first
/// when the opcode carries a payload.
fn submit(link: &mut impl AttributeLink, frame: &[u8], io: Option<&[u8]>) -> Result<()> {
    if let Some(payload) = io {
        link.write_attr(CharId::Buffer, payload)?;
    }

    let challenge: [u8; 16] = link
        .read_attr(CharId::Challenge)?
        .try_into()
        .map_err(|_| anyhow::anyhow!("challenge is not 16 bytes"))?;

    let token = compute_token(
        &mut SoftAes,
        &BUILD_KEY,
        frame,
        io.unwrap_or(&[]),
        &challenge,
    );
    link.write_attr(CharId::Token, &token)?;
    link.write_attr(CharId::Main, frame)
}

/// Read `{busy, last_status}` from MAIN and fail on a job error.
fn check_job(link: &mut impl AttributeLink, what: &str) -> Result<()> {
    let main = link.read_attr(CharId::Main)?;
    if main.len() != 2 {
        bail!("short MAIN read");
    }
    if main[0] != 0 {
        bail!("{} still busy", what);
    }
    if main[1] != 0 {
        bail!("{} failed with device status 0x{:02x}", what, main[1]);
    }
    Ok(())
}

fn read_string(link: &mut impl AttributeLink, char_id: CharId) -> Result<String> {
    let bytes = link.read_attr(char_id)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn device_bank(link: &mut impl AttributeLink) -> Result<Bank> {
    let raw = link.read_attr(CharId::FlashBank)?;
    if raw.len() != 4 {
        bail!("short FLASH_BANK read");
    }
    let state = BankState::from_raw(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]));
    state
        .bank()
        .with_context(|| format!("device flags are corrupt ({})", state.label()))
}

/// Print the device's boot flags and job state.
pub fn status(link: &mut impl AttributeLink) -> Result<()> {
    let bank = read_string(link, CharId::FlashBankStr)?;
    let mode = read_string(link, CharId::FlashModeStr)?;
    let reason = read_string(link, CharId::BootReasonStr)?;
    let main = link.read_attr(CharId::Main)?;

    println!("Device status:");
    println!("  Flash bank:  {}", bank);
    println!("  Flash mode:  {}", mode);
    println!("  Boot reason: {}", reason);
    if main.len() == 2 {
        println!("  Job:         busy={} last_status=0x{:02x}", main[0], main[1]);
    }
    Ok(())
}

/// Full OTA flow: erase the inactive bank, stream the image, verify its
/// SHA-256, confirm, and ride the reboot.
pub fn update(link: &mut impl AttributeLink, file: &Path) -> Result<()> {
    let firmware = fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    let size = firmware.len() as u32;
    if size == 0 || size > BANK_SIZE {
        bail!("image size {} outside 1..={} bytes", size, BANK_SIZE);
    }

    let target = device_bank(link)?.other();
    let entry = target.entry();
    let digest: [u8; 32] = Sha256::digest(&firmware).into();

    println!(
        "Image: {} ({} bytes, SHA-256 {})",
        file.display(),
        size,
        hex(&digest[..8])
    );
    println!("Target: {} at 0x{:08x}", target.label(), entry);

    // Erase enough blocks to cover the image.
    let erase_len = size.div_ceil(FLASH_ERASE_BLOCK) * FLASH_ERASE_BLOCK;
    println!("Erasing 0x{:x} bytes...", erase_len);
    submit(link, &frame(Opcode::Erase, &[entry, erase_len]), None)?;
    check_job(link, "erase")?;

    // Stream the image through the IO buffer.
    let pb = ProgressBar::new(size as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
            )?
            .progress_chars("#>-"),
    );

    let mut offset = 0u32;
    for chunk in firmware.chunks(IO_BUFFER_SIZE) {
        submit(link, &frame(Opcode::Program, &[entry + offset]), Some(chunk))?;
        offset += chunk.len() as u32;
        pb.set_position(offset as u64);
    }
    pb.finish_and_clear();
    println!("Programmed {} bytes", offset);

    // Device-side SHA-256 must match ours.
    submit(link, &frame(Opcode::Verify, &[entry, size]), None)?;
    check_job(link, "verify")?;
    let device_digest = link.read_attr(CharId::Buffer)?;
    if device_digest != digest {
        bail!(
            "digest mismatch: device {} != local {}",
            hex(&device_digest),
            hex(&digest)
        );
    }
    println!("Verify OK ({})", hex(&digest[..8]));

    // Hand over: flags go Flashed/Normal and the device reboots into the
    // new bank, armed for its first boot.
    submit(link, &frame(Opcode::Confirm, &[]), None)?;
    println!("Confirmed; device is rebooting into {}", target.label());
    Ok(())
}

/// Read a flash range through the IO buffer and hexdump it.
pub fn read(link: &mut impl AttributeLink, addr: u32, len: u32) -> Result<()> {
    if len as usize > IO_BUFFER_SIZE {
        bail!("length exceeds the {}-byte IO buffer", IO_BUFFER_SIZE);
    }
    submit(link, &frame(Opcode::Read, &[addr, len]), None)?;
    let data = link.read_attr(CharId::Buffer)?;

    for (i, row) in data.chunks(16).enumerate() {
        println!("0x{:08x}: {}", addr as usize + i * 16, hex(row));
    }
    Ok(())
}

/// Ask the device to reboot.
pub fn reboot(link: &mut impl AttributeLink) -> Result<()> {
    submit(link, &frame(Opcode::Reboot, &[]), None)?;
    println!("Reboot requested");
    Ok(())
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
