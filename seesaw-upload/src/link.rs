// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Transport abstraction between the client and the device's attribute
//! table, plus the in-process simulator backend.

use anyhow::{anyhow, Result};

use seesaw_core::buffer::WriteMethod;
use seesaw_core::service::CharId;
use seesaw_sim::SimDevice;

/// Attribute MTU the link segments large values against.
pub const DEFAULT_MTU: usize = 128;

/// What the client needs from a transport: whole-value characteristic
/// reads and writes. A BLE backend would map these onto GATT reads and
/// prepared-write queues; the simulator link does the same in process.
pub trait AttributeLink {
    fn read_attr(&mut self, char_id: CharId) -> Result<Vec<u8>>;
    fn write_attr(&mut self, char_id: CharId, value: &[u8]) -> Result<()>;
}

/// Link into an in-process [`SimDevice`].
///
/// After every write the simulated scheduler runs until the device goes
/// idle or latches a reset, mirroring a device that services its event
/// loop between attribute operations.
pub struct SimLink {
    pub device: SimDevice,
    mtu: usize,
}

impl SimLink {
    pub fn new(device: SimDevice) -> Self {
        Self {
            device,
            mtu: DEFAULT_MTU,
        }
    }
}

fn att_err(e: seesaw_core::status::AttError) -> anyhow::Error {
    anyhow!("device refused: {} (0x{:02x})", e, e.code())
}

impl AttributeLink for SimLink {
    fn read_attr(&mut self, char_id: CharId) -> Result<Vec<u8>> {
        self.device.read_full(char_id, self.mtu).map_err(att_err)
    }

    fn write_attr(&mut self, char_id: CharId, value: &[u8]) -> Result<()> {
        if value.len() <= self.mtu {
            self.device
                .write_attr(char_id, 0, value, WriteMethod::Direct)
                .map_err(att_err)?;
        } else {
            // Too big for one PDU: queue prepared segments, then execute.
            for (i, segment) in value.chunks(self.mtu).enumerate() {
                self.device
                    .write_attr(char_id, i * self.mtu, segment, WriteMethod::Prepare)
                    .map_err(att_err)?;
            }
            self.device
                .write_attr(char_id, 0, &[], WriteMethod::Execute)
                .map_err(att_err)?;
        }
        self.device.run_until_idle();
        Ok(())
    }
}
