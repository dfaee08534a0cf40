// SPDX-FileCopyrightText: 2026 Yotei Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-crate mock collaborators for job tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use yotei_core::{ChannelGateway, CompletionProvider, HistoryMessage, YoteiError};

/// Scripted channel gateway.
///
/// Failure flags flip individual operations into errors; successful posts
/// are recorded in `posted` for assertions.
#[derive(Default)]
pub struct MockGateway {
    pub history: Vec<HistoryMessage>,
    pub user_names: HashMap<String, String>,
    pub fail_fetch: bool,
    pub fail_post: bool,
    pub fail_credential: bool,
    pub fail_validate: bool,
    pub posted: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl ChannelGateway for MockGateway {
    async fn fetch_history(
        &self,
        _channel_id: &str,
        _limit: u32,
    ) -> Result<Vec<HistoryMessage>, YoteiError> {
        if self.fail_fetch {
            return Err(YoteiError::channel("conversations.history failed: invalid_auth"));
        }
        Ok(self.history.clone())
    }

    async fn post_message(&self, channel_id: &str, text: &str) -> Result<(), YoteiError> {
        if self.fail_post {
            return Err(YoteiError::channel("chat.postMessage failed: not_in_channel"));
        }
        self.posted
            .lock()
            .unwrap()
            .push((channel_id.to_string(), text.to_string()));
        Ok(())
    }

    async fn resolve_user_name(&self, user_id: &str) -> Result<String, YoteiError> {
        self.user_names
            .get(user_id)
            .cloned()
            .ok_or_else(|| YoteiError::channel("users.info failed: user_not_found"))
    }

    async fn open_direct_message(&self, _user_id: &str) -> Result<String, YoteiError> {
        Ok("D0MOCK".to_string())
    }

    async fn validate_channel(&self, _channel_id: &str) -> Result<(), YoteiError> {
        if self.fail_validate {
            return Err(YoteiError::channel("conversations.info failed: channel_not_found"));
        }
        Ok(())
    }

    async fn test_credential(&self) -> Result<(), YoteiError> {
        if self.fail_credential {
            return Err(YoteiError::channel("auth.test failed: invalid_auth"));
        }
        Ok(())
    }
}

/// Completion provider that replays a scripted response queue.
pub struct MockProvider {
    responses: Mutex<VecDeque<Result<String, String>>>,
}

impl MockProvider {
    pub fn with_responses(responses: Vec<Result<String, String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
        }
    }

    pub fn single(response: &str) -> Self {
        Self::with_responses(vec![Ok(response.to_string())])
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    async fn complete(
        &self,
        _system_prompt: &str,
        _user_text: &str,
    ) -> Result<String, YoteiError> {
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(raw)) => Ok(raw),
            Some(Err(message)) => Err(YoteiError::provider(message)),
            None => Err(YoteiError::Internal(
                "mock provider called more times than scripted".to_string(),
            )),
        }
    }
}
