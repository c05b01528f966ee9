// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Client-side half of the seesaw OTA protocol, reusable by transports
//! beyond the bundled CLI: challenge fetch, CMAC token assembly, chunked
//! program, verify-and-compare, confirm.

pub mod cli;
pub mod commands;
pub mod link;
