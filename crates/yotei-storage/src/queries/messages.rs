// SPDX-FileCopyrightText: 2026 Yotei Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel message CRUD operations.

use rusqlite::params;
use yotei_core::YoteiError;

use crate::database::Database;
use crate::models::{ChannelMessage, NewChannelMessage};

const MESSAGE_COLUMNS: &str = "id, slack_ts, channel_id, user_id, text, posted_at, \
                               analyzed_at, is_analyzed, created_at, updated_at";

fn map_message_row(row: &rusqlite::Row<'_>) -> Result<ChannelMessage, rusqlite::Error> {
    Ok(ChannelMessage {
        id: row.get(0)?,
        slack_ts: row.get(1)?,
        channel_id: row.get(2)?,
        user_id: row.get(3)?,
        text: row.get(4)?,
        posted_at: row.get(5)?,
        analyzed_at: row.get(6)?,
        is_analyzed: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

/// Upsert a message keyed on its platform-native id.
///
/// A conflicting insert overwrites channel/author/text/posted_at but never
/// touches the analysis columns, so re-fetching history cannot resurrect an
/// already-analyzed message.
pub async fn upsert_message(db: &Database, msg: &NewChannelMessage) -> Result<(), YoteiError> {
    let msg = msg.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO channel_messages (slack_ts, channel_id, user_id, text, posted_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(slack_ts) DO UPDATE SET
                     channel_id = excluded.channel_id,
                     user_id = excluded.user_id,
                     text = excluded.text,
                     posted_at = excluded.posted_at,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![msg.slack_ts, msg.channel_id, msg.user_id, msg.text, msg.posted_at],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get all messages not yet analyzed.
pub async fn list_unanalyzed(db: &Database) -> Result<Vec<ChannelMessage>, YoteiError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM channel_messages WHERE is_analyzed = 0"
            ))?;
            let rows = stmt.query_map([], map_message_row)?;
            let mut messages = Vec::new();
            for row in rows {
                messages.push(row?);
            }
            Ok(messages)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Mark a message analyzed. Idempotent; the flag never transitions back.
pub async fn mark_analyzed(db: &Database, id: i64, analyzed_at: &str) -> Result<(), YoteiError> {
    let analyzed_at = analyzed_at.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE channel_messages
                 SET is_analyzed = 1, analyzed_at = ?2,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1",
                params![id, analyzed_at],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a message by primary key.
pub async fn get_message(db: &Database, id: i64) -> Result<Option<ChannelMessage>, YoteiError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM channel_messages WHERE id = ?1"
            ))?;
            let mut rows = stmt.query_map(params![id], map_message_row)?;
            match rows.next() {
                Some(row) => Ok(Some(row?)),
                None => Ok(None),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a message by its platform-native id.
pub async fn find_by_native_id(
    db: &Database,
    slack_ts: &str,
) -> Result<Option<ChannelMessage>, YoteiError> {
    let slack_ts = slack_ts.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM channel_messages WHERE slack_ts = ?1"
            ))?;
            let mut rows = stmt.query_map(params![slack_ts], map_message_row)?;
            match rows.next() {
                Some(row) => Ok(Some(row?)),
                None => Ok(None),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}
