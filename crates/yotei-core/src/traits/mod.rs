// SPDX-FileCopyrightText: 2026 Yotei Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions for the pipeline's external seams.
//!
//! Jobs receive already-constructed, already-validated handles implementing
//! these traits; preflight checks are ordinary trait methods the caller runs
//! before (or at the start of) a job.

pub mod channel;
pub mod provider;

pub use channel::ChannelGateway;
pub use provider::CompletionProvider;
