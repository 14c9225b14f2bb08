use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

pub const ARCHIVED: &str = "ARCHIVED";

/// Which day a project belongs to, or `Archived` when it is hidden from the
/// daily list while keeping its history. Persisted as `YYYY-MM-DD` or
/// `"ARCHIVED"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveDay {
    Active(NaiveDate),
    Archived,
}

impl ActiveDay {
    pub fn is_on(&self, day: NaiveDate) -> bool {
        matches!(self, ActiveDay::Active(active) if *active == day)
    }

    pub fn is_archived(&self) -> bool {
        matches!(self, ActiveDay::Archived)
    }

    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            ActiveDay::Active(day) => Some(*day),
            ActiveDay::Archived => None,
        }
    }

    /// Lenient parse used when reading persisted data. Anything that is neither
    /// the archive marker nor a valid day is treated as missing.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw == ARCHIVED {
            return Some(ActiveDay::Archived);
        }
        parse_day(raw).map(ActiveDay::Active)
    }
}

impl fmt::Display for ActiveDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActiveDay::Active(day) => write!(f, "{}", day_key(*day)),
            ActiveDay::Archived => f.write_str(ARCHIVED),
        }
    }
}

impl Serialize for ActiveDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ActiveDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ActiveDay::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid active day: {raw}")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub count: u64,
    pub logs: BTreeMap<NaiveDate, u64>,
    pub created_at: i64,
    pub last_active_date: ActiveDay,
}

impl Project {
    pub fn new(id: String, name: String, today: NaiveDate, created_at: i64) -> Self {
        Self {
            id,
            name,
            count: 0,
            logs: BTreeMap::new(),
            created_at,
            last_active_date: ActiveDay::Active(today),
        }
    }

    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }

    /// Any positive entry strictly before `today`.
    pub fn has_history(&self, today: NaiveDate) -> bool {
        self.logs.range(..today).any(|(_, value)| *value > 0)
    }

    pub fn log_on(&self, day: NaiveDate) -> u64 {
        self.logs.get(&day).copied().unwrap_or_default()
    }
}

/// Persisted project as read back from storage. Older data may lack fields or
/// carry numeric ids, so everything here is optional and gets repaired by
/// [`StoredProject::into_project`].
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredProject {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub logs: BTreeMap<NaiveDate, u64>,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub last_active_date: Option<String>,
}

impl StoredProject {
    /// Builds a full project. A missing active day is inferred from the most
    /// recent log date, or `today` when there are no logs.
    pub fn into_project(
        self,
        today: NaiveDate,
        fresh_id: impl FnOnce() -> String,
        now_millis: i64,
    ) -> Project {
        let last_active_date = self
            .last_active_date
            .as_deref()
            .and_then(ActiveDay::parse)
            .unwrap_or_else(|| {
                let latest = self.logs.keys().next_back().copied().unwrap_or(today);
                ActiveDay::Active(latest)
            });

        Project {
            id: self.id.filter(|id| !id.is_empty()).unwrap_or_else(fresh_id),
            name: self.name.unwrap_or_default(),
            count: self.count.unwrap_or_default(),
            logs: self.logs,
            created_at: self.created_at.unwrap_or(now_millis),
            last_active_date,
        }
    }
}

fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(id)) => Some(id),
        Some(serde_json::Value::Number(id)) => Some(id.to_string()),
        _ => None,
    })
}

pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn parse_day(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    Archived,
    Deleted,
}

#[derive(Debug, Deserialize)]
pub struct NameRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct LogValueRequest {
    pub value: u64,
}

#[derive(Debug, Deserialize)]
pub struct StatsStartRequest {
    pub start_date: String,
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub start: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProjectView {
    pub id: String,
    pub name: String,
    pub count: u64,
    pub today_log: u64,
    pub active: bool,
    pub archived: bool,
    pub last_active_date: String,
    pub logs: BTreeMap<String, u64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TodayResponse {
    pub date: String,
    pub active_id: Option<String>,
    pub projects: Vec<ProjectView>,
    pub recent_names: Vec<String>,
    pub can_undo: bool,
    pub can_redo: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub outcome: DeleteOutcome,
    pub today: TodayResponse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    pub rank: usize,
    pub name: String,
    pub total: u64,
    pub occurrences: u64,
    pub average: String,
    pub podium: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub name: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryDay {
    pub date: String,
    pub entries: Vec<HistoryEntry>,
    pub total: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub start_date: String,
    pub aggregate: Vec<AggregateRow>,
    pub history: Vec<HistoryDay>,
}
