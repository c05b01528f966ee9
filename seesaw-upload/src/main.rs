// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! OTA client for the seesaw update core.
//!
//! Speaks the authenticated attribute protocol: read the device challenge,
//! CMAC-sign each command, stream the image into the inactive bank, verify
//! by SHA-256, confirm, reboot. Ships with the in-process simulator link
//! for end-to-end rehearsal; real transports implement
//! `link::AttributeLink`.
//!
//! Usage:
//!   seesaw-upload status
//!   seesaw-upload update firmware.bin
//!   seesaw-upload read 0x37000 64

use anyhow::Result;
use clap::Parser;

use seesaw_upload::cli;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = cli::Cli::parse();
    cli::run(args)
}
