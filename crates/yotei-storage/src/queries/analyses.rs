// SPDX-FileCopyrightText: 2026 Yotei Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event analysis record operations.

use rusqlite::params;
use yotei_core::YoteiError;
use yotei_core::types::AnalysisStatus;

use crate::database::Database;
use crate::models::{EventAnalysis, NewEventAnalysis};

const ANALYSIS_COLUMNS: &str = "id, message_id, scheduled_event_id, analysis_type, \
                                extracted_data, confidence_score, analysis_status, \
                                event_start_datetime, event_end_datetime, event_title, \
                                event_type, created_at";

fn map_analysis_row(row: &rusqlite::Row<'_>) -> Result<EventAnalysis, rusqlite::Error> {
    let status: String = row.get(6)?;
    Ok(EventAnalysis {
        id: row.get(0)?,
        message_id: row.get(1)?,
        scheduled_event_id: row.get(2)?,
        analysis_type: row.get(3)?,
        extracted_data: row.get(4)?,
        confidence_score: row.get(5)?,
        analysis_status: status.parse().unwrap_or(AnalysisStatus::Failed),
        event_start_datetime: row.get(7)?,
        event_end_datetime: row.get(8)?,
        event_title: row.get(9)?,
        event_type: row.get(10)?,
        created_at: row.get(11)?,
    })
}

/// Insert a new analysis record. Returns the generated id.
pub async fn insert_analysis(db: &Database, analysis: &NewEventAnalysis) -> Result<i64, YoteiError> {
    let analysis = analysis.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO event_analyses
                     (message_id, analysis_type, extracted_data, confidence_score,
                      analysis_status, event_start_datetime, event_end_datetime,
                      event_title, event_type)
                 VALUES (?1, 'event_extraction', ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    analysis.message_id,
                    analysis.extracted_data,
                    analysis.confidence_score,
                    analysis.analysis_status.to_string(),
                    analysis.event_start_datetime,
                    analysis.event_end_datetime,
                    analysis.event_title,
                    analysis.event_type,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Back-link an analysis to the scheduled event it produced.
pub async fn attach_event(db: &Database, analysis_id: i64, event_id: i64) -> Result<(), YoteiError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE event_analyses SET scheduled_event_id = ?2 WHERE id = ?1",
                params![analysis_id, event_id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Mark an analysis failed, replacing its stored data with the augmented blob.
pub async fn mark_failed(
    db: &Database,
    analysis_id: i64,
    extracted_data: &str,
) -> Result<(), YoteiError> {
    let extracted_data = extracted_data.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE event_analyses SET analysis_status = 'failed', extracted_data = ?2
                 WHERE id = ?1",
                params![analysis_id, extracted_data],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get all analyses for a message, oldest first.
pub async fn list_for_message(
    db: &Database,
    message_id: i64,
) -> Result<Vec<EventAnalysis>, YoteiError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ANALYSIS_COLUMNS} FROM event_analyses
                 WHERE message_id = ?1 ORDER BY id ASC"
            ))?;
            let rows = stmt.query_map(params![message_id], map_analysis_row)?;
            let mut analyses = Vec::new();
            for row in rows {
                analyses.push(row?);
            }
            Ok(analyses)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
