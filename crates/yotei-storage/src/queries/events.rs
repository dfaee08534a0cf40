// SPDX-FileCopyrightText: 2026 Yotei Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scheduled event operations.

use rusqlite::params;
use yotei_core::YoteiError;
use yotei_core::types::{EventStatus, Priority};

use crate::database::Database;
use crate::models::{NewScheduledEvent, NotificationEntry, ScheduledEvent};

const EVENT_COLUMNS: &str = "id, message_id, event_type, title, description, start_datetime, \
                             end_datetime, location, participants, status, priority, \
                             is_notification_enabled, last_notified_at, notification_history, \
                             created_at, updated_at";

fn map_event_row(row: &rusqlite::Row<'_>) -> Result<ScheduledEvent, rusqlite::Error> {
    let participants: String = row.get(8)?;
    let status: String = row.get(9)?;
    let priority: String = row.get(10)?;
    let history: String = row.get(13)?;
    Ok(ScheduledEvent {
        id: row.get(0)?,
        message_id: row.get(1)?,
        event_type: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        start_datetime: row.get(5)?,
        end_datetime: row.get(6)?,
        location: row.get(7)?,
        participants: serde_json::from_str(&participants).unwrap_or_default(),
        status: status.parse().unwrap_or(EventStatus::Pending),
        priority: priority.parse().unwrap_or(Priority::Medium),
        is_notification_enabled: row.get(11)?,
        last_notified_at: row.get(12)?,
        notification_history: serde_json::from_str(&history).unwrap_or_default(),
        created_at: row.get(14)?,
        updated_at: row.get(15)?,
    })
}

/// Insert a new scheduled event. Returns the generated id.
pub async fn insert_event(db: &Database, event: &NewScheduledEvent) -> Result<i64, YoteiError> {
    let event = event.clone();
    let participants = serde_json::to_string(&event.participants)
        .map_err(|e| YoteiError::Internal(format!("participants serialization: {e}")))?;
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO scheduled_events
                     (message_id, event_type, title, description, start_datetime,
                      end_datetime, location, participants, status, priority)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    event.message_id,
                    event.event_type,
                    event.title,
                    event.description,
                    event.start_datetime,
                    event.end_datetime,
                    event.location,
                    participants,
                    event.status.to_string(),
                    event.priority.to_string(),
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get an event by primary key.
pub async fn get_event(db: &Database, id: i64) -> Result<Option<ScheduledEvent>, YoteiError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {EVENT_COLUMNS} FROM scheduled_events WHERE id = ?1"
            ))?;
            let mut rows = stmt.query_map(params![id], map_event_row)?;
            match rows.next() {
                Some(row) => Ok(Some(row?)),
                None => Ok(None),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Notification candidates: events starting inside `[window_start, window_end)`
/// that are not cancelled, have notifications enabled, and are outside the
/// cooldown (never notified, or last notified at or before `cooldown_cutoff`).
/// Ordered by start ascending.
///
/// All three bounds are storage-format UTC strings, so plain string
/// comparison is chronological.
pub async fn due_in_window(
    db: &Database,
    window_start: &str,
    window_end: &str,
    cooldown_cutoff: &str,
) -> Result<Vec<ScheduledEvent>, YoteiError> {
    let window_start = window_start.to_string();
    let window_end = window_end.to_string();
    let cooldown_cutoff = cooldown_cutoff.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {EVENT_COLUMNS} FROM scheduled_events
                 WHERE start_datetime >= ?1 AND start_datetime < ?2
                   AND status != 'cancelled'
                   AND is_notification_enabled = 1
                   AND (last_notified_at IS NULL OR last_notified_at <= ?3)
                 ORDER BY start_datetime ASC"
            ))?;
            let rows = stmt.query_map(
                params![window_start, window_end, cooldown_cutoff],
                map_event_row,
            )?;
            let mut events = Vec::new();
            for row in rows {
                events.push(row?);
            }
            Ok(events)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Append a notification entry and stamp `last_notified_at`, atomically.
pub async fn record_notification(
    db: &Database,
    event_id: i64,
    notified_at: &str,
    recipient: &str,
) -> Result<(), YoteiError> {
    let entry = NotificationEntry {
        notified_at: notified_at.to_string(),
        recipient: recipient.to_string(),
    };
    let notified_at = notified_at.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let history: String = tx.query_row(
                "SELECT notification_history FROM scheduled_events WHERE id = ?1",
                params![event_id],
                |row| row.get(0),
            )?;
            let mut entries: Vec<NotificationEntry> =
                serde_json::from_str(&history).unwrap_or_default();
            entries.push(entry);
            let updated = serde_json::to_string(&entries)
                .map_err(|e| tokio_rusqlite::Error::Other(Box::new(e)))?;

            tx.execute(
                "UPDATE scheduled_events
                 SET last_notified_at = ?2, notification_history = ?3,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1",
                params![event_id, notified_at, updated],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Toggle notification delivery for an event.
pub async fn set_notification_enabled(
    db: &Database,
    event_id: i64,
    enabled: bool,
) -> Result<(), YoteiError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE scheduled_events
                 SET is_notification_enabled = ?2,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1",
                params![event_id, enabled],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Change an event's lifecycle status.
pub async fn set_status(db: &Database, event_id: i64, status: EventStatus) -> Result<(), YoteiError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE scheduled_events
                 SET status = ?2, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1",
                params![event_id, status.to_string()],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}
