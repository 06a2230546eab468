use crate::errors::AppError;
use crate::models::{
    Activities, ActivityDetails, ActivityKind, ActivityRecord, AppData, DateEntry,
    DrinkingEntry, GamblingEntry,
};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

pub fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// Reads a `YYYY-MM-DD` field and rejects dates after `today`.
pub fn loggable_date(value: Option<&str>, today: NaiveDate) -> Result<NaiveDate, AppError> {
    let date = value
        .and_then(parse_iso_date)
        .ok_or_else(|| AppError::bad_request("Invalid or missing date"))?;
    if date > today {
        return Err(AppError::bad_request("Cannot log activity for a future date"));
    }
    Ok(date)
}

/// Extracts the selected activities from any of the accepted save payloads.
///
/// Accepted shapes, in order of preference:
/// `{date, activities: {drinking?, gambling?}}`,
/// `{date, type, ...flat fields}` and the draft form
/// `{entry_date, entry_type: gambling|alcohol|both, gambling, alcohol}`.
pub fn normalize_payload(payload: &Value) -> Result<Activities, AppError> {
    if let Some(activities) = payload.get("activities").and_then(Value::as_object) {
        return Ok(Activities {
            drinking: selected_details(activities.get("drinking"), "drinking")?,
            gambling: selected_details(activities.get("gambling"), "gambling")?,
        });
    }

    if let Some(kind) = payload.get("type").and_then(Value::as_str) {
        let mut activities = Activities::default();
        match ActivityKind::parse(kind) {
            Some(ActivityKind::Drinking) => activities.drinking = Some(details_from(payload, "drinking")?),
            Some(ActivityKind::Gambling) => activities.gambling = Some(details_from(payload, "gambling")?),
            None => {}
        }
        return Ok(activities);
    }

    if let Some(entry_type) = payload.get("entry_type").and_then(Value::as_str) {
        let entry_type = entry_type.trim();
        let mut activities = Activities::default();
        if matches!(entry_type, "alcohol" | "drinking" | "both") {
            let alcohol = payload.get("alcohol").cloned().unwrap_or_else(|| json!({}));
            activities.drinking = Some(details_from(&rename_fields(&alcohol, DRAFT_ALCOHOL_FIELDS), "alcohol")?);
        }
        if matches!(entry_type, "gambling" | "both") {
            let gambling = payload.get("gambling").cloned().unwrap_or_else(|| json!({}));
            activities.gambling = Some(details_from(&rename_fields(&gambling, DRAFT_GAMBLING_FIELDS), "gambling")?);
        }
        return Ok(activities);
    }

    Ok(Activities::default())
}

const DRAFT_ALCOHOL_FIELDS: &[(&str, &str)] = &[("num_drinks", "drinks")];
const DRAFT_GAMBLING_FIELDS: &[(&str, &str)] = &[
    ("amount_spent", "money_spent"),
    ("amount_earned", "money_earned"),
    ("amount_intended_spent", "money_intended"),
];

fn rename_fields(value: &Value, renames: &[(&str, &str)]) -> Value {
    let Some(object) = value.as_object() else {
        return value.clone();
    };
    let mut renamed = Map::with_capacity(object.len());
    for (key, field) in object {
        let key = renames
            .iter()
            .find(|(from, _)| *from == key.as_str())
            .map(|(_, to)| (*to).to_string())
            .unwrap_or_else(|| key.clone());
        renamed.insert(key, field.clone());
    }
    Value::Object(renamed)
}

fn selected_details<T: DeserializeOwned + Default>(
    value: Option<&Value>,
    label: &str,
) -> Result<Option<T>, AppError> {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => Ok(None),
        Some(Value::Bool(true)) => Ok(Some(T::default())),
        Some(value) => details_from(value, label).map(Some),
    }
}

fn details_from<T: DeserializeOwned>(value: &Value, label: &str) -> Result<T, AppError> {
    if !value.is_object() {
        return Err(AppError::bad_request(format!("Invalid {label} details")));
    }
    serde_json::from_value(value.clone())
        .map_err(|err| AppError::bad_request(format!("Invalid {label} details: {err}")))
}

fn find_record(data: &AppData, date: NaiveDate, kind: ActivityKind) -> Option<u64> {
    data.activities
        .values()
        .find(|record| record.date == date && record.details.kind() == kind)
        .map(|record| record.id)
}

fn upsert(data: &mut AppData, date: NaiveDate, details: ActivityDetails) -> u64 {
    if let Some(id) = find_record(data, date, details.kind()) {
        if let Some(record) = data.activities.get_mut(&id) {
            record.details = details;
        }
        return id;
    }

    data.next_id = data.next_id.max(data.activities.keys().next_back().copied().unwrap_or(0)) + 1;
    let id = data.next_id;
    data.activities.insert(id, ActivityRecord { id, date, details });
    id
}

/// Creates or replaces one record per selected activity on `date`.
pub fn log_activities(
    data: &mut AppData,
    date: NaiveDate,
    activities: Activities,
) -> Result<DateEntry, AppError> {
    if activities.is_empty() {
        return Err(AppError::bad_request("No activity selected"));
    }
    if let Some(details) = activities.drinking {
        upsert(data, date, ActivityDetails::Drinking(details));
    }
    if let Some(details) = activities.gambling {
        upsert(data, date, ActivityDetails::Gambling(details));
    }
    Ok(entry_for_date(data, date))
}

pub fn delete_activity(
    data: &mut AppData,
    date: NaiveDate,
    kind: ActivityKind,
) -> Result<DateEntry, AppError> {
    let id = find_record(data, date, kind).ok_or_else(|| AppError::not_found("Entry not found"))?;
    data.activities.remove(&id);
    Ok(entry_for_date(data, date))
}

pub fn delete_date(data: &mut AppData, date: NaiveDate) -> Result<DateEntry, AppError> {
    let before = data.activities.len();
    data.activities.retain(|_, record| record.date != date);
    if data.activities.len() == before {
        return Err(AppError::not_found("Entry not found"));
    }
    Ok(DateEntry::empty(date))
}

/// Replaces the details of record `id`. A `type` field, when present, must match the record.
pub fn update_activity(data: &mut AppData, id: u64, payload: &Value) -> Result<DateEntry, AppError> {
    let record = data
        .activities
        .get_mut(&id)
        .ok_or_else(|| AppError::not_found("Activity not found"))?;
    let kind = record.details.kind();

    if let Some(requested) = payload.get("type").and_then(Value::as_str) {
        if ActivityKind::parse(requested) != Some(kind) {
            return Err(AppError::bad_request(format!(
                "Activity {id} is a {} entry",
                kind.as_str()
            )));
        }
    }

    let fields = payload.get(kind.as_str()).filter(|value| value.is_object()).unwrap_or(payload);
    record.details = match kind {
        ActivityKind::Drinking => ActivityDetails::Drinking(details_from(fields, "drinking")?),
        ActivityKind::Gambling => ActivityDetails::Gambling(details_from(fields, "gambling")?),
    };
    let date = record.date;
    Ok(entry_for_date(data, date))
}

pub fn delete_by_id(data: &mut AppData, id: u64) -> Result<DateEntry, AppError> {
    let record = data
        .activities
        .remove(&id)
        .ok_or_else(|| AppError::not_found("Activity not found"))?;
    Ok(entry_for_date(data, record.date))
}

pub fn entry_for_date(data: &AppData, date: NaiveDate) -> DateEntry {
    let mut entry = DateEntry::empty(date);
    for record in data.activities.values().filter(|record| record.date == date) {
        apply_record(&mut entry, record);
    }
    entry
}

/// Every non-empty date, sorted ascending.
pub fn all_entries(data: &AppData) -> Vec<DateEntry> {
    entries_between(data, None, None)
}

/// Non-empty dates within the inclusive bounds, sorted ascending.
pub fn entries_between(
    data: &AppData,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Vec<DateEntry> {
    let mut grouped: BTreeMap<NaiveDate, DateEntry> = BTreeMap::new();
    for record in data.activities.values() {
        if start.is_some_and(|start| record.date < start) || end.is_some_and(|end| record.date > end) {
            continue;
        }
        let entry = grouped
            .entry(record.date)
            .or_insert_with(|| DateEntry::empty(record.date));
        apply_record(entry, record);
    }
    grouped.into_values().collect()
}

fn apply_record(entry: &mut DateEntry, record: &ActivityRecord) {
    match &record.details {
        ActivityDetails::Drinking(details) => {
            entry.drinking = Some(DrinkingEntry {
                id: record.id,
                details: details.clone(),
            });
        }
        ActivityDetails::Gambling(details) => {
            entry.gambling = Some(GamblingEntry {
                id: record.id,
                details: details.clone(),
            });
        }
    }
}
