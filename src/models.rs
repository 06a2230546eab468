use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Drinking,
    Gambling,
}

impl ActivityKind {
    pub const ALL: [ActivityKind; 2] = [ActivityKind::Drinking, ActivityKind::Gambling];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "drinking" => Some(Self::Drinking),
            "gambling" => Some(Self::Gambling),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Drinking => "drinking",
            Self::Gambling => "gambling",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Drinking => "Drinking",
            Self::Gambling => "Gambling",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DrinkingDetails {
    #[serde(default, deserialize_with = "clean_value")]
    pub drinks: Option<String>,
    #[serde(default, deserialize_with = "clean_value")]
    pub money_spent: Option<String>,
    #[serde(default, deserialize_with = "clean_value")]
    pub trigger: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GamblingDetails {
    #[serde(default, deserialize_with = "clean_value")]
    pub gambling_type: Option<String>,
    #[serde(default, deserialize_with = "clean_value")]
    pub time_spent: Option<String>,
    #[serde(default, deserialize_with = "clean_value")]
    pub money_intended: Option<String>,
    #[serde(default, deserialize_with = "clean_value")]
    pub money_spent: Option<String>,
    #[serde(default, deserialize_with = "clean_value")]
    pub money_earned: Option<String>,
    #[serde(default, deserialize_with = "clean_value")]
    pub drinks_while_gambling: Option<String>,
    #[serde(default, deserialize_with = "clean_value")]
    pub emotion_before: Option<String>,
    #[serde(default, deserialize_with = "clean_value")]
    pub emotion_during: Option<String>,
    #[serde(default, deserialize_with = "clean_value")]
    pub emotion_after: Option<String>,
}

impl DrinkingDetails {
    pub const FIELDS: [&'static str; 3] = ["drinks", "money_spent", "trigger"];

    /// Values in `FIELDS` order.
    pub fn values(&self) -> [Option<&str>; 3] {
        [
            self.drinks.as_deref(),
            self.money_spent.as_deref(),
            self.trigger.as_deref(),
        ]
    }
}

impl GamblingDetails {
    pub const FIELDS: [&'static str; 9] = [
        "gambling_type",
        "time_spent",
        "money_intended",
        "money_spent",
        "money_earned",
        "drinks_while_gambling",
        "emotion_before",
        "emotion_during",
        "emotion_after",
    ];

    /// Values in `FIELDS` order.
    pub fn values(&self) -> [Option<&str>; 9] {
        [
            self.gambling_type.as_deref(),
            self.time_spent.as_deref(),
            self.money_intended.as_deref(),
            self.money_spent.as_deref(),
            self.money_earned.as_deref(),
            self.drinks_while_gambling.as_deref(),
            self.emotion_before.as_deref(),
            self.emotion_during.as_deref(),
            self.emotion_after.as_deref(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ActivityDetails {
    Drinking(DrinkingDetails),
    Gambling(GamblingDetails),
}

impl ActivityDetails {
    pub fn kind(&self) -> ActivityKind {
        match self {
            Self::Drinking(_) => ActivityKind::Drinking,
            Self::Gambling(_) => ActivityKind::Gambling,
        }
    }
}

/// A single stored activity. At most one record exists per date and kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: u64,
    pub date: NaiveDate,
    pub details: ActivityDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppData {
    #[serde(default)]
    pub next_id: u64,
    #[serde(default)]
    pub activities: BTreeMap<u64, ActivityRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrinkingEntry {
    pub id: u64,
    #[serde(flatten)]
    pub details: DrinkingDetails,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GamblingEntry {
    pub id: u64,
    #[serde(flatten)]
    pub details: GamblingDetails,
}

/// Everything logged for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateEntry {
    pub date: NaiveDate,
    #[serde(default)]
    pub drinking: Option<DrinkingEntry>,
    #[serde(default)]
    pub gambling: Option<GamblingEntry>,
}

impl DateEntry {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            drinking: None,
            gambling: None,
        }
    }

    pub fn has_any_activity(&self) -> bool {
        self.drinking.is_some() || self.gambling.is_some()
    }

    pub fn has(&self, kind: ActivityKind) -> bool {
        match kind {
            ActivityKind::Drinking => self.drinking.is_some(),
            ActivityKind::Gambling => self.gambling.is_some(),
        }
    }
}

/// The activities selected in one save request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Activities {
    pub drinking: Option<DrinkingDetails>,
    pub gambling: Option<GamblingDetails>,
}

impl Activities {
    pub fn is_empty(&self) -> bool {
        self.drinking.is_none() && self.gambling.is_none()
    }
}

#[derive(Debug, Deserialize)]
pub struct DeleteActivityRequest {
    pub date: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteEntryRequest {
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EntryQuery {
    pub date: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct CalendarQuery {
    pub month: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ReportQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ActivityResponse {
    pub status: &'static str,
    pub message: String,
    pub entry: DateEntry,
}

impl ActivityResponse {
    pub fn success(message: impl Into<String>, entry: DateEntry) -> Self {
        Self {
            status: "success",
            message: message.into(),
            entry,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SaveEntryResponse {
    pub success: bool,
    pub entry: DateEntry,
}

/// Trims strings, turns blanks into `None` and keeps numbers and booleans as text.
pub fn clean_json(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn clean_value<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(clean_json))
}
