use crate::entries::parse_iso_date;
use crate::models::{DateEntry, DrinkingEntry, GamblingEntry};
use chrono::NaiveDate;
use serde_json::Value;
use std::collections::BTreeMap;

/// Date-indexed view of everything logged, used to drive the calendar page.
#[derive(Debug, Clone, Default)]
pub struct EntryCache {
    entries: BTreeMap<NaiveDate, DateEntry>,
}

/// An event decoded from the calendar-events feed.
///
/// `partial` events come from the older one-activity-per-event shape and
/// must be merged with what is already cached for the date.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedEvent {
    pub entry: DateEntry,
    pub partial: bool,
}

impl EntryCache {
    pub fn get(&self, date: NaiveDate) -> DateEntry {
        self.entries
            .get(&date)
            .cloned()
            .unwrap_or_else(|| DateEntry::empty(date))
    }

    /// Stores `entry` for `date`, or forgets the date when the entry is empty.
    pub fn update_for_date(&mut self, date: NaiveDate, entry: DateEntry) {
        if entry.has_any_activity() {
            self.entries.insert(
                date,
                DateEntry {
                    date,
                    drinking: entry.drinking,
                    gambling: entry.gambling,
                },
            );
        } else {
            self.entries.remove(&date);
        }
    }

    /// Applies a calendar-events feed. Returns how many events were usable.
    pub fn load(&mut self, events: &[Value]) -> usize {
        let mut applied = 0;
        for event in events {
            let Some(normalized) = normalize_event(event) else {
                continue;
            };
            let date = normalized.entry.date;
            if normalized.partial {
                let existing = self.get(date);
                self.update_for_date(
                    date,
                    DateEntry {
                        date,
                        drinking: normalized.entry.drinking.or(existing.drinking),
                        gambling: normalized.entry.gambling.or(existing.gambling),
                    },
                );
            } else {
                self.update_for_date(date, normalized.entry);
            }
            applied += 1;
        }
        applied
    }
}

/// Decodes one feed event. Events carrying `drinking`/`gambling` objects, or
/// neither, describe the whole date; single-activity `type` events are partial.
pub fn normalize_event(event: &Value) -> Option<NormalizedEvent> {
    let raw_date = event.get("date")?.as_str()?;
    let date = parse_iso_date(raw_date.split('T').next().unwrap_or_default())?;

    let drinking = event.get("drinking").filter(|value| is_present(value));
    let gambling = event.get("gambling").filter(|value| is_present(value));
    if drinking.is_some() || gambling.is_some() {
        return Some(NormalizedEvent {
            entry: DateEntry {
                date,
                drinking: drinking.map(drinking_entry),
                gambling: gambling.map(gambling_entry),
            },
            partial: false,
        });
    }

    let mut entry = DateEntry::empty(date);
    let partial = match event.get("type").and_then(Value::as_str) {
        Some("drinking") => {
            entry.drinking = Some(drinking_entry(event));
            true
        }
        Some("gambling") => {
            entry.gambling = Some(gambling_entry(event));
            true
        }
        _ => false,
    };
    Some(NormalizedEvent { entry, partial })
}

/// `null`, `false`, zero and `""` all mean the activity is absent.
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn drinking_entry(value: &Value) -> DrinkingEntry {
    DrinkingEntry {
        id: value.get("id").and_then(Value::as_u64).unwrap_or_default(),
        details: serde_json::from_value(value.clone()).unwrap_or_default(),
    }
}

fn gambling_entry(value: &Value) -> GamblingEntry {
    GamblingEntry {
        id: value.get("id").and_then(Value::as_u64).unwrap_or_default(),
        details: serde_json::from_value(value.clone()).unwrap_or_default(),
    }
}
