// SPDX-FileCopyrightText: 2026 Yotei Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the yotei pipeline.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types used throughout the yotei workspace. The pipeline crates
//! depend only on the seams defined here, never on concrete clients.

pub mod error;
pub mod time;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::YoteiError;
pub use traits::{ChannelGateway, CompletionProvider};
pub use types::{AnalysisStatus, EventStatus, HistoryMessage, Priority};
