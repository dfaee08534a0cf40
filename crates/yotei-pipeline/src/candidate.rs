// SPDX-FileCopyrightText: 2026 Yotei Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Candidate parsing, field mapping, and event construction.
//!
//! An LLM response yields zero or more candidates. Parsing never fails
//! outright: unusable responses become a single candidate carrying an error
//! marker. Field mapping is a pure function from the original-language JSON
//! map to [`CandidateFields`]; event construction returns a per-candidate
//! `Result` that the extraction job aggregates.

use serde_json::{Map, Value};
use yotei_core::time;
use yotei_core::types::{EventStatus, Priority};
use yotei_storage::models::NewScheduledEvent;

/// System instruction sent with every extraction request.
///
/// Asks for the event fields as JSON, an array when one message carries
/// several events, datetimes in ISO 8601.
pub const EXTRACTION_SYSTEM_PROMPT: &str = "あなたは予定情報を抽出する専門家です。\
以下のメッセージから予定の情報を抽出し、JSON形式で返してください。\
メッセージに複数の予定が含まれている場合は、配列形式で複数の予定情報を返してください。\
各予定の抽出する情報：イベントタイプ、タイトル、説明、開始日時、終了日時、場所、参加者、優先度。\
日時はISO 8601形式で返してください。";

/// Marker key identifying a candidate that could not be produced normally.
pub const ERROR_KEY: &str = "error";

/// Canonical fields of one extraction candidate.
///
/// Everything is optional at this stage; requiredness is enforced by
/// [`build_event`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateFields {
    pub kind: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_datetime: Option<String>,
    pub end_datetime: Option<String>,
    pub location: Option<String>,
    pub participants: Vec<String>,
    pub priority: Option<String>,
}

/// A single candidate's validation or mapping failure.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateError(pub String);

impl std::fmt::Display for CandidateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Split a raw LLM response into candidate maps.
///
/// A bare object becomes a one-element list. A response that is not JSON,
/// or is an empty object/array, yields a single error-marker candidate so
/// the failure stays auditable instead of aborting the message.
pub fn parse_response(raw: &str) -> Vec<Map<String, Value>> {
    match serde_json::from_str::<Value>(raw.trim()) {
        Ok(Value::Object(map)) if !map.is_empty() => vec![map],
        Ok(Value::Array(items)) if !items.is_empty() => items
            .into_iter()
            .map(|item| match item {
                Value::Object(map) if !map.is_empty() => map,
                other => error_candidate(&format!("無効な予定情報です: {other}")),
            })
            .collect(),
        Ok(_) => vec![error_candidate("無効な分析結果（または空の応答）")],
        Err(e) => vec![error_candidate(&format!("JSONの解析に失敗しました: {e}"))],
    }
}

/// Build a synthetic candidate carrying only an error marker.
pub fn error_candidate(message: &str) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert(ERROR_KEY.to_string(), Value::String(message.to_string()));
    map
}

/// Return the error marker carried by a candidate, if any.
pub fn error_marker(map: &Map<String, Value>) -> Option<String> {
    map.get(ERROR_KEY).map(|v| match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

/// Merge an error message into a candidate's original data, for persistence.
pub fn augment_with_error(map: &Map<String, Value>, error: &str) -> String {
    let mut augmented = map.clone();
    augmented.insert(ERROR_KEY.to_string(), Value::String(error.to_string()));
    Value::Object(augmented).to_string()
}

/// Map the model's original-language keys to canonical fields.
pub fn map_fields(map: &Map<String, Value>) -> CandidateFields {
    CandidateFields {
        kind: string_field(map, "イベントタイプ"),
        title: string_field(map, "タイトル"),
        description: string_field(map, "説明"),
        start_datetime: string_field(map, "開始日時"),
        end_datetime: string_field(map, "終了日時"),
        location: string_field(map, "場所"),
        participants: list_field(map, "参加者"),
        priority: string_field(map, "優先度"),
    }
}

fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn list_field(map: &Map<String, Value>, key: &str) -> Vec<String> {
    match map.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(str::to_string)
            .collect(),
        // A lone name comes back as a plain string often enough.
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

/// Validate a candidate and construct the event insert payload.
///
/// Requires non-empty start datetime, kind, and title; datetimes must parse
/// (lenient ISO 8601, naive values interpreted in local time). Priority is
/// normalized against the fixed allow-list.
pub fn build_event(
    message_id: i64,
    fields: &CandidateFields,
) -> Result<NewScheduledEvent, CandidateError> {
    let start_raw = required(&fields.start_datetime, "start_datetime")?;
    let kind = required(&fields.kind, "event_type")?;
    let title = required(&fields.title, "title")?;

    let start = time::parse_flexible(&start_raw)
        .ok_or_else(|| CandidateError(format!("開始日時の形式が不正です: {start_raw}")))?;
    let end = match fields.end_datetime.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => Some(
            time::parse_flexible(raw)
                .ok_or_else(|| CandidateError(format!("終了日時の形式が不正です: {raw}")))?,
        ),
        _ => None,
    };

    Ok(NewScheduledEvent {
        message_id,
        event_type: kind,
        title,
        description: fields.description.clone(),
        start_datetime: time::format_utc(start),
        end_datetime: end.map(time::format_utc),
        location: fields.location.clone(),
        participants: fields.participants.clone(),
        status: EventStatus::Pending,
        priority: Priority::normalize(fields.priority.as_deref().unwrap_or("")),
    })
}

fn required(value: &Option<String>, name: &str) -> Result<String, CandidateError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(CandidateError(format!(
            "必須フィールド {name} が不足しています"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn as_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn bare_object_becomes_single_candidate() {
        let candidates = parse_response(r#"{"タイトル": "会議"}"#);
        assert_eq!(candidates.len(), 1);
        assert!(error_marker(&candidates[0]).is_none());
    }

    #[test]
    fn array_fans_out_to_candidates() {
        let candidates =
            parse_response(r#"[{"タイトル": "会議"}, {"タイトル": "飲み会"}]"#);
        assert_eq!(candidates.len(), 2);
    }

    #[test]
    fn non_json_becomes_error_candidate() {
        let candidates = parse_response("予定は見つかりませんでした。");
        assert_eq!(candidates.len(), 1);
        assert!(error_marker(&candidates[0]).is_some());
    }

    #[test]
    fn empty_structures_become_error_candidates() {
        for raw in ["{}", "[]", "null", "\"\""] {
            let candidates = parse_response(raw);
            assert_eq!(candidates.len(), 1, "raw: {raw}");
            assert!(error_marker(&candidates[0]).is_some(), "raw: {raw}");
        }
    }

    #[test]
    fn non_object_array_element_becomes_error_candidate() {
        let candidates = parse_response(r#"[{"タイトル": "会議"}, 42]"#);
        assert_eq!(candidates.len(), 2);
        assert!(error_marker(&candidates[0]).is_none());
        assert!(error_marker(&candidates[1]).is_some());
    }

    #[test]
    fn map_fields_translates_all_keys() {
        let map = as_map(json!({
            "イベントタイプ": "meeting",
            "タイトル": "定例会議",
            "説明": "週次の定例",
            "開始日時": "2025-05-10T14:00:00",
            "終了日時": "2025-05-10T15:00:00",
            "場所": "会議室A",
            "参加者": ["田中", "佐藤"],
            "優先度": "高"
        }));
        let fields = map_fields(&map);
        assert_eq!(fields.kind.as_deref(), Some("meeting"));
        assert_eq!(fields.title.as_deref(), Some("定例会議"));
        assert_eq!(fields.description.as_deref(), Some("週次の定例"));
        assert_eq!(fields.start_datetime.as_deref(), Some("2025-05-10T14:00:00"));
        assert_eq!(fields.end_datetime.as_deref(), Some("2025-05-10T15:00:00"));
        assert_eq!(fields.location.as_deref(), Some("会議室A"));
        assert_eq!(fields.participants, vec!["田中", "佐藤"]);
        assert_eq!(fields.priority.as_deref(), Some("高"));
    }

    #[test]
    fn map_fields_defaults_missing_keys() {
        let fields = map_fields(&as_map(json!({"タイトル": "会議"})));
        assert!(fields.kind.is_none());
        assert!(fields.start_datetime.is_none());
        assert!(fields.participants.is_empty());
        assert!(fields.priority.is_none());
    }

    #[test]
    fn lone_participant_string_becomes_single_entry() {
        let fields = map_fields(&as_map(json!({"参加者": "田中"})));
        assert_eq!(fields.participants, vec!["田中"]);
    }

    #[test]
    fn build_event_requires_start_kind_and_title() {
        let complete = CandidateFields {
            kind: Some("meeting".into()),
            title: Some("会議".into()),
            start_datetime: Some("2025-05-10T14:00:00".into()),
            ..Default::default()
        };

        assert!(build_event(1, &complete).is_ok());

        for strip in ["start", "kind", "title"] {
            let mut fields = complete.clone();
            match strip {
                "start" => fields.start_datetime = None,
                "kind" => fields.kind = Some("  ".into()),
                _ => fields.title = None,
            }
            let err = build_event(1, &fields).unwrap_err();
            assert!(err.0.contains("必須フィールド"), "stripped {strip}: {err}");
        }
    }

    #[test]
    fn build_event_rejects_unparseable_datetimes() {
        let mut fields = CandidateFields {
            kind: Some("meeting".into()),
            title: Some("会議".into()),
            start_datetime: Some("来週の金曜日".into()),
            ..Default::default()
        };
        let err = build_event(1, &fields).unwrap_err();
        assert!(err.0.contains("開始日時"), "{err}");

        fields.start_datetime = Some("2025-05-10T14:00:00".into());
        fields.end_datetime = Some("そのあと".into());
        let err = build_event(1, &fields).unwrap_err();
        assert!(err.0.contains("終了日時"), "{err}");
    }

    #[test]
    fn build_event_normalizes_priority() {
        let base = CandidateFields {
            kind: Some("meeting".into()),
            title: Some("会議".into()),
            start_datetime: Some("2025-05-10T14:00:00".into()),
            ..Default::default()
        };

        for (raw, expected) in [
            (Some("HIGH"), Priority::High),
            (Some("Low"), Priority::Low),
            (Some("URGENT"), Priority::Medium),
            (Some(""), Priority::Medium),
            (None, Priority::Medium),
        ] {
            let fields = CandidateFields {
                priority: raw.map(str::to_string),
                ..base.clone()
            };
            let event = build_event(1, &fields).unwrap();
            assert_eq!(event.priority, expected, "raw: {raw:?}");
        }
    }

    #[test]
    fn build_event_keeps_end_datetime_optional() {
        let fields = CandidateFields {
            kind: Some("meeting".into()),
            title: Some("会議".into()),
            start_datetime: Some("2025-05-10T14:00:00+09:00".into()),
            ..Default::default()
        };
        let event = build_event(7, &fields).unwrap();
        assert_eq!(event.message_id, 7);
        assert!(event.end_datetime.is_none());
        assert_eq!(event.status, EventStatus::Pending);
        assert_eq!(event.start_datetime, "2025-05-10T05:00:00.000Z");
    }

    #[test]
    fn augment_with_error_preserves_original_data() {
        let map = as_map(json!({"タイトル": "会議"}));
        let augmented = augment_with_error(&map, "必須フィールド title が不足しています");
        let parsed: Value = serde_json::from_str(&augmented).unwrap();
        assert_eq!(parsed["タイトル"], "会議");
        assert!(parsed[ERROR_KEY].as_str().unwrap().contains("必須フィールド"));
    }
}
