// SPDX-FileCopyrightText: 2026 Yotei Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! LLM completion provider trait.

use async_trait::async_trait;

use crate::error::YoteiError;

/// A single-shot LLM completion seam.
///
/// The returned text is the model's raw output. It is expected, but not
/// guaranteed, to be parseable JSON; callers own all parsing and recovery.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Send a system prompt plus user text and return the model's response.
    async fn complete(&self, system_prompt: &str, user_text: &str)
        -> Result<String, YoteiError>;
}
