// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Whole-device harness: boot arbitration, application lifetime, and the
//! attribute surface, replayable across simulated power cycles.

use log::{info, warn};

use seesaw_core::boot::{arbitrate, BootAction};
use seesaw_core::buffer::WriteMethod;
use seesaw_core::flags::FlagStore;
use seesaw_core::layout::{Bank, BUILD_KEY};
use seesaw_core::service::{CharId, OtaService};
use seesaw_core::status::{AttError, AttResult, JobStatus};

use crate::platform::SimPlatform;

/// Where the simulated chip ended up after its last boot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceState {
    /// An application image is running from this bank.
    Application(Bank),
    /// Both banks failed; the immutable ROM loader owns the chip.
    RomIsp,
}

pub struct SimDevice {
    pub platform: SimPlatform,
    pub service: OtaService,
    pub state: DeviceState,
}

impl SimDevice {
    /// Power on a factory-fresh chip (blank flash and EEPROM) and run the
    /// first boot.
    pub fn power_on(seed: u64) -> Self {
        let mut dev = Self {
            platform: SimPlatform::new(seed),
            service: OtaService::new(BUILD_KEY),
            state: DeviceState::RomIsp,
        };
        dev.boot();
        dev
    }

    /// Run the first-stage boot path: read flags, arbitrate, persist the
    /// decision, hand control to a bank image or the ROM loader.
    pub fn boot(&mut self) {
        let mut store = FlagStore::new();
        let rec = store.get(&mut self.platform);
        info!(
            "boot flags: bank={} mode={} reason={}",
            rec.bank.label(),
            rec.mode.label(),
            rec.reason.label()
        );

        let plan = arbitrate(rec);
        if plan.fallback_warning {
            warn!("fallback boot: the previous OTA may have failed");
        }

        let action = match plan.commit(&mut store, &mut self.platform) {
            Ok(action) => action,
            Err(e) => {
                // A torn save reads back as Uninitialized next boot; this
                // boot still follows the plan it computed.
                warn!("flag save failed (0x{:02x})", e.0);
                plan.action
            }
        };

        self.state = match action {
            BootAction::Jump(bank) => {
                info!("booting into {}", bank.label());
                // The application image brings up a fresh OTA service with
                // a new challenge.
                self.service = OtaService::new(BUILD_KEY);
                self.service.init(&mut self.platform);
                DeviceState::Application(bank)
            }
            BootAction::EnterRomIsp => {
                info!("entering ROM ISP recovery");
                DeviceState::RomIsp
            }
        };
    }

    /// The application confirming a clean start-up.
    pub fn assert_boot_ok(&mut self) -> AttResult<()> {
        self.service.assert_boot_ok(&mut self.platform)
    }

    /// Drive the cooperative scheduler until the pending job finishes or a
    /// reset is latched.
    pub fn run_until_idle(&mut self) {
        while !self.platform.reset_requested && self.service.poll(&mut self.platform) {}
    }

    /// Consume a latched reset and replay the power cycle.
    ///
    /// Returns true if a reset was pending (and the device rebooted).
    pub fn power_cycle(&mut self) -> bool {
        if !self.platform.take_reset() {
            return false;
        }
        self.boot();
        true
    }

    pub fn last_status(&self) -> JobStatus {
        self.service.last_status()
    }

    // --- Client-side attribute access (what the radio stack would route) ---

    pub fn read_attr(&mut self, char_id: CharId, offset: usize, max_len: usize) -> AttResult<Vec<u8>> {
        self.service
            .read_attr(&mut self.platform, char_id, offset, max_len)
            .map(|v| v.to_vec())
    }

    /// Read a whole characteristic value across MTU-sized chunks.
    pub fn read_full(&mut self, char_id: CharId, mtu: usize) -> AttResult<Vec<u8>> {
        let mut out = Vec::new();
        loop {
            match self.read_attr(char_id, out.len(), mtu) {
                Ok(chunk) => {
                    let done = chunk.len() < mtu;
                    out.extend_from_slice(&chunk);
                    if done {
                        return Ok(out);
                    }
                }
                // A value that is an exact multiple of the MTU ends with a
                // read one past the end.
                Err(AttError::InvalidOffset) if !out.is_empty() => return Ok(out),
                Err(e) => return Err(e),
            }
        }
    }

    pub fn write_attr(
        &mut self,
        char_id: CharId,
        offset: usize,
        value: &[u8],
        method: WriteMethod,
    ) -> AttResult<()> {
        self.service
            .write_attr(&mut self.platform, char_id, offset, value, method)
    }

    /// Direct write at offset 0, the common case.
    pub fn write(&mut self, char_id: CharId, value: &[u8]) -> AttResult<()> {
        self.write_attr(char_id, 0, value, WriteMethod::Direct)
    }
}
