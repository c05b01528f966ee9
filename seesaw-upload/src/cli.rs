// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Command-line interface definitions.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use seesaw_sim::{DeviceState, SimDevice};

use crate::commands;
use crate::link::SimLink;

/// Command-line arguments.
#[derive(Parser)]
#[command(name = "seesaw-upload")]
#[command(about = "OTA client for the seesaw update core (in-process simulator link)")]
pub struct Cli {
    /// RNG seed for the simulated device
    #[arg(long, default_value = "0")]
    pub seed: u64,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Show the device's boot flags and job state
    Status,

    /// Run a full OTA update into the inactive bank
    Update {
        /// Firmware binary file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Read a flash range (at most one IO buffer)
    Read {
        /// Start address (decimal or 0x-prefixed hex)
        #[arg(value_parser = parse_u32)]
        addr: u32,

        /// Number of bytes
        #[arg(value_parser = parse_u32)]
        len: u32,
    },

    /// Reboot the device
    Reboot,
}

fn parse_u32(s: &str) -> Result<u32, String> {
    let parsed = match s.strip_prefix("0x") {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("{}", e))
}

/// Execute the parsed CLI command against a freshly booted simulator.
pub fn run(cli: Cli) -> Result<()> {
    // Power on a blank device and let its application confirm itself, the
    // state a deployed device idles in.
    let mut device = SimDevice::power_on(cli.seed);
    device
        .assert_boot_ok()
        .map_err(|e| anyhow::anyhow!("boot confirmation failed: {}", e))?;

    let mut link = SimLink::new(device);

    match cli.command {
        Commands::Status => commands::status(&mut link),
        Commands::Update { file } => {
            commands::update(&mut link, &file)?;
            ride_reboot(&mut link)
        }
        Commands::Read { addr, len } => commands::read(&mut link, addr, len),
        Commands::Reboot => {
            commands::reboot(&mut link)?;
            ride_reboot(&mut link)
        }
    }
}

/// Replay the power cycle a real device would go through, then show where
/// it came up.
fn ride_reboot(link: &mut SimLink) -> Result<()> {
    if !link.device.power_cycle() {
        return Ok(());
    }

    match link.device.state {
        DeviceState::Application(bank) => {
            println!("Device came up in {}", bank.label());
            // The new image confirms its clean start-up.
            link.device
                .assert_boot_ok()
                .map_err(|e| anyhow::anyhow!("boot confirmation failed: {}", e))?;
            commands::status(link)
        }
        DeviceState::RomIsp => {
            println!("Device fell through to ROM ISP recovery");
            Ok(())
        }
    }
}
