// SPDX-FileCopyrightText: 2026 Yotei Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The three batch jobs of the yotei pipeline.
//!
//! Data flow: channel gateway -> [`ingest`] -> message store -> [`extract`]
//! -> (analysis records, scheduled events) -> [`notify`] -> channel gateway.
//! Jobs receive injected, pre-validated gateway/provider handles and a
//! database; none of them holds global state.

pub mod candidate;
pub mod extract;
pub mod ingest;
pub mod notify;

pub use extract::ExtractSummary;
pub use ingest::IngestSummary;
pub use notify::NotifySummary;

#[cfg(test)]
mod support;
