// SPDX-FileCopyrightText: 2026 Yotei Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Extraction job: analyze unanalyzed messages with the LLM.
//!
//! Every unanalyzed message is processed independently; a failure in one
//! never blocks the others. Whatever the outcome -- zero, one, or many
//! candidates, malformed output, or a dead LLM -- the message is marked
//! analyzed exactly once and never reprocessed.

use chrono::Utc;
use serde_json::Value;
use tracing::{info, warn};
use yotei_core::types::AnalysisStatus;
use yotei_core::{CompletionProvider, YoteiError, time};
use yotei_storage::models::{ChannelMessage, NewEventAnalysis};
use yotei_storage::{Database, queries};

use crate::candidate::{self, EXTRACTION_SYSTEM_PROMPT};

/// Outcome of one extraction run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    pub messages_processed: usize,
    pub analyses_created: usize,
    pub events_created: usize,
    pub failed_candidates: usize,
}

/// Analyze every message with `is_analyzed = 0`.
pub async fn run(
    provider: &dyn CompletionProvider,
    db: &Database,
) -> Result<ExtractSummary, YoteiError> {
    let messages = queries::messages::list_unanalyzed(db).await?;

    if messages.is_empty() {
        info!("no messages awaiting analysis");
        return Ok(ExtractSummary::default());
    }

    info!(count = messages.len(), "starting message analysis");
    let mut summary = ExtractSummary::default();

    for message in messages {
        let text = message.text.clone().unwrap_or_default();

        match provider.complete(EXTRACTION_SYSTEM_PROMPT, &text).await {
            Ok(raw) => {
                process_candidates(db, &message, &raw, &mut summary).await?;
            }
            Err(e) => {
                // The LLM itself failed; record one failed analysis so the
                // outage stays visible, and still consume the message.
                warn!(message_id = message.id, error = %e, "LLM call failed");
                let analysis = NewEventAnalysis {
                    message_id: message.id,
                    extracted_data: serde_json::json!({ "error": e.to_string() }).to_string(),
                    confidence_score: 0.0,
                    analysis_status: AnalysisStatus::Failed,
                    event_start_datetime: None,
                    event_end_datetime: None,
                    event_title: None,
                    event_type: None,
                };
                queries::analyses::insert_analysis(db, &analysis).await?;
                summary.analyses_created += 1;
                summary.failed_candidates += 1;
            }
        }

        queries::messages::mark_analyzed(db, message.id, &time::format_utc(Utc::now())).await?;
        summary.messages_processed += 1;
    }

    info!(
        messages = summary.messages_processed,
        analyses = summary.analyses_created,
        events = summary.events_created,
        failures = summary.failed_candidates,
        "message analysis complete"
    );
    Ok(summary)
}

/// Persist the candidates found in one LLM response.
async fn process_candidates(
    db: &Database,
    message: &ChannelMessage,
    raw: &str,
    summary: &mut ExtractSummary,
) -> Result<(), YoteiError> {
    for map in candidate::parse_response(raw) {
        if let Some(marker) = candidate::error_marker(&map) {
            warn!(
                message_id = message.id,
                error = %marker,
                "candidate carries an error marker"
            );
            let analysis = NewEventAnalysis {
                message_id: message.id,
                extracted_data: Value::Object(map).to_string(),
                confidence_score: 0.0,
                analysis_status: AnalysisStatus::Failed,
                event_start_datetime: None,
                event_end_datetime: None,
                event_title: None,
                event_type: None,
            };
            queries::analyses::insert_analysis(db, &analysis).await?;
            summary.analyses_created += 1;
            summary.failed_candidates += 1;
            continue;
        }

        let fields = candidate::map_fields(&map);

        // The original-language data is stored verbatim; the derived columns
        // get a best-effort parse and may stay empty.
        let analysis = NewEventAnalysis {
            message_id: message.id,
            extracted_data: Value::Object(map.clone()).to_string(),
            confidence_score: 0.8,
            analysis_status: AnalysisStatus::Success,
            event_start_datetime: derived_datetime(&fields.start_datetime),
            event_end_datetime: derived_datetime(&fields.end_datetime),
            event_title: fields.title.clone(),
            event_type: fields.kind.clone(),
        };
        let analysis_id = queries::analyses::insert_analysis(db, &analysis).await?;
        summary.analyses_created += 1;

        if fields.start_datetime.is_some() {
            match candidate::build_event(message.id, &fields) {
                Ok(new_event) => {
                    let event_id = queries::events::insert_event(db, &new_event).await?;
                    queries::analyses::attach_event(db, analysis_id, event_id).await?;
                    summary.events_created += 1;
                    info!(message_id = message.id, event_id, "scheduled event stored");
                }
                Err(e) => {
                    warn!(
                        message_id = message.id,
                        error = %e,
                        "candidate failed validation"
                    );
                    queries::analyses::mark_failed(
                        db,
                        analysis_id,
                        &candidate::augment_with_error(&map, &e.to_string()),
                    )
                    .await?;
                    summary.failed_candidates += 1;
                }
            }
        } else {
            warn!(
                message_id = message.id,
                "candidate has no start datetime, keeping partial extraction"
            );
        }
    }

    Ok(())
}

fn derived_datetime(raw: &Option<String>) -> Option<String> {
    raw.as_deref()
        .and_then(time::parse_flexible)
        .map(time::format_utc)
}
