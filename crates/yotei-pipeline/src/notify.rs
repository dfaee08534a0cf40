// SPDX-FileCopyrightText: 2026 Yotei Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification job: deliver a batched digest of today's due events.
//!
//! One message per run. Bookkeeping (`last_notified_at` + history) is
//! written only after the send reports success, and only for events that
//! still pass the can-notify re-check against fresh database state; a failed
//! send leaves everything untouched, and the cooldown window alone prevents
//! duplicate delivery on the next tick.

use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use tracing::{error, info, warn};
use yotei_core::{ChannelGateway, YoteiError, time};
use yotei_storage::models::ScheduledEvent;
use yotei_storage::{Database, queries};

/// Recipient recorded in the notification history for channel digests.
const CHANNEL_RECIPIENT: &str = "channel";

/// Outcome of one notification run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotifySummary {
    /// Events that qualified for today's digest.
    pub candidates: usize,
    /// Whether the batched message was delivered.
    pub delivered: bool,
    /// Events whose notification bookkeeping was updated.
    pub updated: usize,
}

/// Notify the destination channel about today's due events.
pub async fn run(
    gateway: &dyn ChannelGateway,
    db: &Database,
    channel_id: &str,
    cooldown_minutes: i64,
) -> Result<NotifySummary, YoteiError> {
    run_at(gateway, db, channel_id, cooldown_minutes, Utc::now()).await
}

/// [`run`] with an explicit clock, the seam the tests drive.
pub async fn run_at(
    gateway: &dyn ChannelGateway,
    db: &Database,
    channel_id: &str,
    cooldown_minutes: i64,
    now: DateTime<Utc>,
) -> Result<NotifySummary, YoteiError> {
    info!("starting event notification run");

    // Preconditions: a live credential and a reachable destination channel.
    // Either failure aborts before any side effect.
    gateway.test_credential().await?;
    gateway.validate_channel(channel_id).await?;

    let (window_start, window_end) = local_day_window(now);
    let cutoff = time::format_utc(now - Duration::minutes(cooldown_minutes));
    let events = queries::events::due_in_window(db, &window_start, &window_end, &cutoff).await?;

    if events.is_empty() {
        info!("no events due for notification today");
        return Ok(NotifySummary::default());
    }

    info!(count = events.len(), "events due for notification");

    let digest = compose_digest(gateway, db, &events, now, cooldown_minutes).await;

    match gateway.post_message(channel_id, &digest).await {
        Ok(()) => {
            info!(channel_id, "event notification delivered");
            let stamp = time::format_utc(now);
            let mut updated = 0;
            for event in &events {
                // Re-read fresh state: another tick (or the admin surface)
                // may have disabled or notified the event mid-run.
                let Some(fresh) = queries::events::get_event(db, event.id).await? else {
                    continue;
                };
                if can_notify(&fresh, now, cooldown_minutes) {
                    queries::events::record_notification(db, fresh.id, &stamp, CHANNEL_RECIPIENT)
                        .await?;
                    updated += 1;
                }
            }
            Ok(NotifySummary {
                candidates: events.len(),
                delivered: true,
                updated,
            })
        }
        Err(e) => {
            // No bookkeeping changes: the next tick retries, and the
            // cooldown keeps duplicates out.
            error!(channel_id, error = %e, "failed to deliver event notification");
            Ok(NotifySummary {
                candidates: events.len(),
                delivered: false,
                updated: 0,
            })
        }
    }
}

/// Whether an event may be notified at `now`.
fn can_notify(event: &ScheduledEvent, now: DateTime<Utc>, cooldown_minutes: i64) -> bool {
    if !event.is_notification_enabled {
        return false;
    }
    match event.last_notified_at.as_deref().and_then(time::parse_utc) {
        Some(last) => last + Duration::minutes(cooldown_minutes) <= now,
        None => true,
    }
}

/// Today's local day boundaries `[00:00, next 00:00)` as storage-format UTC strings.
fn local_day_window(now: DateTime<Utc>) -> (String, String) {
    let today = now.with_timezone(&Local).date_naive();
    (
        local_midnight_utc(today),
        local_midnight_utc(today + Duration::days(1)),
    )
}

fn local_midnight_utc(date: chrono::NaiveDate) -> String {
    let midnight = date.and_time(chrono::NaiveTime::MIN);
    let utc = match Local.from_local_datetime(&midnight).earliest() {
        Some(local) => local.with_timezone(&Utc),
        // Midnight falls in a DST gap; the naive instant read as UTC keeps
        // the window total without panicking.
        None => midnight.and_utc(),
    };
    time::format_utc(utc)
}

/// Compose the batched digest in start order.
async fn compose_digest(
    gateway: &dyn ChannelGateway,
    db: &Database,
    events: &[ScheduledEvent],
    now: DateTime<Utc>,
    cooldown_minutes: i64,
) -> String {
    let mut sections = vec!["【本日の予定一覧】\n".to_string()];

    for event in events {
        if !can_notify(event, now, cooldown_minutes) {
            continue;
        }

        let start_time = local_clock(&event.start_datetime);
        let author = resolve_author(gateway, db, event).await;
        let end_line = event
            .end_datetime
            .as_deref()
            .map(|end| format!("終了時刻: {}\n", local_clock(end)))
            .unwrap_or_default();
        let title = non_empty_or(&event.title, "（無題）");
        let description = event
            .description
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or("（なし）");
        let location = event
            .location
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or("（未設定）");

        sections.push(format!(
            "⏰ {start_time}\n作成者: {author}\nタイトル: {title}\n説明: {description}\n{end_line}場所: {location}\n優先度: {priority}\n",
            priority = event.priority,
        ));
    }

    sections.join("\n")
}

/// Resolve the digest's author line from the event's source message.
///
/// Lookup failures degrade to the raw user id; a missing source message or
/// authorless message renders as unknown.
async fn resolve_author(
    gateway: &dyn ChannelGateway,
    db: &Database,
    event: &ScheduledEvent,
) -> String {
    let user_id = match queries::messages::get_message(db, event.message_id).await {
        Ok(Some(msg)) => msg.user_id,
        Ok(None) => None,
        Err(e) => {
            warn!(event_id = event.id, error = %e, "failed to load source message");
            None
        }
    };

    match user_id {
        Some(uid) => match gateway.resolve_user_name(&uid).await {
            Ok(name) => format!("@{name}"),
            Err(e) => {
                warn!(user_id = %uid, error = %e, "user lookup failed, using raw id");
                format!("@{uid}")
            }
        },
        None => "不明".to_string(),
    }
}

fn local_clock(stored: &str) -> String {
    time::parse_utc(stored)
        .map(|dt| dt.with_timezone(&Local).format("%H:%M").to_string())
        .unwrap_or_else(|| stored.to_string())
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() { fallback } else { value }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::support::MockGateway;
    use tempfile::tempdir;
    use yotei_core::types::{EventStatus, Priority};
    use yotei_storage::models::{NewChannelMessage, NewScheduledEvent};

    async fn setup_db_with_message() -> (Database, i64, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();

        queries::messages::upsert_message(
            &db,
            &NewChannelMessage {
                slack_ts: "1.000100".to_string(),
                channel_id: "C012345".to_string(),
                user_id: Some("U012345".to_string()),
                text: Some("明日14時に会議".to_string()),
                posted_at: None,
            },
        )
        .await
        .unwrap();
        let id = queries::messages::find_by_native_id(&db, "1.000100")
            .await
            .unwrap()
            .unwrap()
            .id;
        (db, id, dir)
    }

    /// Storage-format UTC string for today's local time `h:m:s`, offset by `days`.
    fn local_today(days: i64, h: u32, m: u32, s: u32) -> String {
        let date = Local::now().date_naive() + Duration::days(days);
        let naive = date.and_hms_opt(h, m, s).unwrap();
        let local = Local.from_local_datetime(&naive).earliest().unwrap();
        time::format_utc(local.with_timezone(&Utc))
    }

    async fn seed_event(db: &Database, message_id: i64, title: &str, start: &str) -> i64 {
        queries::events::insert_event(
            db,
            &NewScheduledEvent {
                message_id,
                event_type: "meeting".to_string(),
                title: title.to_string(),
                description: Some("週次の定例".to_string()),
                start_datetime: start.to_string(),
                end_datetime: None,
                location: Some("会議室A".to_string()),
                participants: vec![],
                status: EventStatus::Pending,
                priority: Priority::High,
            },
        )
        .await
        .unwrap()
    }

    fn gateway_with_user() -> MockGateway {
        let mut gateway = MockGateway::default();
        gateway
            .user_names
            .insert("U012345".to_string(), "tanaka".to_string());
        gateway
    }

    #[tokio::test]
    async fn digest_is_sent_and_bookkeeping_updated() {
        let (db, message_id, _dir) = setup_db_with_message().await;
        let gateway = gateway_with_user();
        let now = Utc::now();

        let early = seed_event(&db, message_id, "朝会", &local_today(0, 9, 0, 0)).await;
        let late = seed_event(&db, message_id, "夕会", &local_today(0, 17, 30, 0)).await;

        let summary = run_at(&gateway, &db, "C0NOTIFY", 30, now).await.unwrap();
        assert_eq!(summary.candidates, 2);
        assert!(summary.delivered);
        assert_eq!(summary.updated, 2);

        let posted = gateway.posted.lock().unwrap();
        assert_eq!(posted.len(), 1);
        let (channel, text) = &posted[0];
        assert_eq!(channel, "C0NOTIFY");
        assert!(text.starts_with("【本日の予定一覧】"));
        assert!(text.contains("作成者: @tanaka"));
        assert!(text.contains("タイトル: 朝会"));
        assert!(text.contains("場所: 会議室A"));
        assert!(text.contains("優先度: high"));
        // Ordered by start ascending.
        assert!(text.find("朝会").unwrap() < text.find("夕会").unwrap());
        drop(posted);

        for id in [early, late] {
            let event = queries::events::get_event(&db, id).await.unwrap().unwrap();
            assert_eq!(
                event.last_notified_at.as_deref(),
                Some(time::format_utc(now).as_str())
            );
            assert_eq!(event.notification_history.len(), 1);
            assert_eq!(event.notification_history[0].recipient, "channel");
        }

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn cooldown_excludes_recently_notified_events() {
        let (db, message_id, _dir) = setup_db_with_message().await;
        let gateway = gateway_with_user();
        let now = Utc::now();

        let id = seed_event(&db, message_id, "朝会", &local_today(0, 9, 0, 0)).await;

        // Notified 10 minutes ago with a 30-minute cooldown: excluded.
        queries::events::record_notification(
            &db,
            id,
            &time::format_utc(now - Duration::minutes(10)),
            "channel",
        )
        .await
        .unwrap();

        let summary = run_at(&gateway, &db, "C0NOTIFY", 30, now).await.unwrap();
        assert_eq!(summary.candidates, 0);
        assert!(!summary.delivered);
        assert!(gateway.posted.lock().unwrap().is_empty());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn cooldown_readmits_after_expiry() {
        let (db, message_id, _dir) = setup_db_with_message().await;
        let gateway = gateway_with_user();
        let now = Utc::now();

        let id = seed_event(&db, message_id, "朝会", &local_today(0, 9, 0, 0)).await;
        queries::events::record_notification(
            &db,
            id,
            &time::format_utc(now - Duration::minutes(31)),
            "channel",
        )
        .await
        .unwrap();

        let summary = run_at(&gateway, &db, "C0NOTIFY", 30, now).await.unwrap();
        assert_eq!(summary.candidates, 1);
        assert!(summary.delivered);
        assert_eq!(summary.updated, 1);

        let event = queries::events::get_event(&db, id).await.unwrap().unwrap();
        assert_eq!(event.notification_history.len(), 2);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn send_failure_mutates_nothing() {
        let (db, message_id, _dir) = setup_db_with_message().await;
        let mut gateway = gateway_with_user();
        gateway.fail_post = true;
        let now = Utc::now();

        let id = seed_event(&db, message_id, "朝会", &local_today(0, 9, 0, 0)).await;

        let summary = run_at(&gateway, &db, "C0NOTIFY", 30, now).await.unwrap();
        assert_eq!(summary.candidates, 1);
        assert!(!summary.delivered);
        assert_eq!(summary.updated, 0);

        let event = queries::events::get_event(&db, id).await.unwrap().unwrap();
        assert!(event.last_notified_at.is_none());
        assert!(event.notification_history.is_empty());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn day_boundaries_are_inclusive_exclusive() {
        let (db, message_id, _dir) = setup_db_with_message().await;
        let gateway = gateway_with_user();
        let now = Utc::now();

        seed_event(&db, message_id, "深夜零時", &local_today(0, 0, 0, 0)).await;
        seed_event(&db, message_id, "日付変更直前", &local_today(0, 23, 59, 59)).await;
        seed_event(&db, message_id, "明日の予定", &local_today(1, 0, 0, 0)).await;

        let summary = run_at(&gateway, &db, "C0NOTIFY", 30, now).await.unwrap();
        assert_eq!(summary.candidates, 2);

        let posted = gateway.posted.lock().unwrap();
        let (_, text) = &posted[0];
        assert!(text.contains("深夜零時"));
        assert!(text.contains("日付変更直前"));
        assert!(!text.contains("明日の予定"));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn precondition_failure_aborts_without_side_effects() {
        let (db, message_id, _dir) = setup_db_with_message().await;
        seed_event(&db, message_id, "朝会", &local_today(0, 9, 0, 0)).await;

        let mut gateway = gateway_with_user();
        gateway.fail_credential = true;
        assert!(
            run_at(&gateway, &db, "C0NOTIFY", 30, Utc::now())
                .await
                .is_err()
        );
        assert!(gateway.posted.lock().unwrap().is_empty());

        let mut gateway = gateway_with_user();
        gateway.fail_validate = true;
        assert!(
            run_at(&gateway, &db, "C0NOTIFY", 30, Utc::now())
                .await
                .is_err()
        );
        assert!(gateway.posted.lock().unwrap().is_empty());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn unknown_author_falls_back_to_raw_id() {
        let (db, message_id, _dir) = setup_db_with_message().await;
        // No user_names entries: every lookup fails.
        let gateway = MockGateway::default();
        let now = Utc::now();

        seed_event(&db, message_id, "朝会", &local_today(0, 9, 0, 0)).await;

        let summary = run_at(&gateway, &db, "C0NOTIFY", 30, now).await.unwrap();
        assert!(summary.delivered, "lookup failure must not abort the run");

        let posted = gateway.posted.lock().unwrap();
        assert!(posted[0].1.contains("作成者: @U012345"));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn cancelled_and_disabled_events_are_skipped() {
        let (db, message_id, _dir) = setup_db_with_message().await;
        let gateway = gateway_with_user();
        let now = Utc::now();

        let cancelled = seed_event(&db, message_id, "中止の会", &local_today(0, 10, 0, 0)).await;
        queries::events::set_status(&db, cancelled, EventStatus::Cancelled)
            .await
            .unwrap();
        let disabled = seed_event(&db, message_id, "無効の会", &local_today(0, 11, 0, 0)).await;
        queries::events::set_notification_enabled(&db, disabled, false)
            .await
            .unwrap();

        let summary = run_at(&gateway, &db, "C0NOTIFY", 30, now).await.unwrap();
        assert_eq!(summary.candidates, 0);
        assert!(gateway.posted.lock().unwrap().is_empty());

        db.close().await.unwrap();
    }

    #[test]
    fn can_notify_respects_flag_and_cooldown() {
        let now = Utc::now();
        let base = ScheduledEvent {
            id: 1,
            message_id: 1,
            event_type: "meeting".to_string(),
            title: "会議".to_string(),
            description: None,
            start_datetime: time::format_utc(now),
            end_datetime: None,
            location: None,
            participants: vec![],
            status: EventStatus::Pending,
            priority: Priority::Medium,
            is_notification_enabled: true,
            last_notified_at: None,
            notification_history: vec![],
            created_at: time::format_utc(now),
            updated_at: time::format_utc(now),
        };

        assert!(can_notify(&base, now, 30));

        let disabled = ScheduledEvent {
            is_notification_enabled: false,
            ..base.clone()
        };
        assert!(!can_notify(&disabled, now, 30));

        let cooling = ScheduledEvent {
            last_notified_at: Some(time::format_utc(now - Duration::minutes(10))),
            ..base.clone()
        };
        assert!(!can_notify(&cooling, now, 30));

        let cooled = ScheduledEvent {
            last_notified_at: Some(time::format_utc(now - Duration::minutes(31))),
            ..base
        };
        assert!(can_notify(&cooled, now, 30));
    }

    #[test]
    fn local_day_window_spans_exactly_one_day() {
        let (start, end) = local_day_window(Utc::now());
        let start_dt = time::parse_utc(&start).unwrap();
        let end_dt = time::parse_utc(&end).unwrap();
        assert_eq!(end_dt - start_dt, Duration::days(1));
    }
}
