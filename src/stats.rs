use crate::models::{AggregateRow, HistoryDay, HistoryEntry, Project, StatsResponse, day_key};
use chrono::{Months, NaiveDate};
use std::collections::{BTreeMap, HashMap};

pub const DEFAULT_WINDOW_MONTHS: u32 = 6;
const PODIUM_SIZE: usize = 3;

/// Six calendar months back, clamped to the end of shorter months.
pub fn default_start_date(today: NaiveDate) -> NaiveDate {
    today
        .checked_sub_months(Months::new(DEFAULT_WINDOW_MONTHS))
        .unwrap_or(today)
}

pub fn build_stats(projects: &[Project], start: NaiveDate) -> StatsResponse {
    StatsResponse {
        start_date: day_key(start),
        aggregate: aggregate(projects, start),
        history: history(projects, start),
    }
}

/// Totals per normalized name over positive log entries on or after `start`,
/// highest total first. Equal totals keep first-seen order.
pub fn aggregate(projects: &[Project], start: NaiveDate) -> Vec<AggregateRow> {
    struct Tally {
        name: String,
        total: u64,
        occurrences: u64,
    }

    let mut tallies: Vec<Tally> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();

    for project in projects {
        for value in project.logs.range(start..).map(|(_, value)| *value) {
            if value == 0 {
                continue;
            }
            let slot = *slots.entry(project.normalized_name()).or_insert_with(|| {
                tallies.push(Tally {
                    name: project.name.trim().to_string(),
                    total: 0,
                    occurrences: 0,
                });
                tallies.len() - 1
            });
            let tally = &mut tallies[slot];
            tally.total = tally.total.saturating_add(value);
            tally.occurrences += 1;
        }
    }

    tallies.retain(|tally| tally.total > 0);
    tallies.sort_by(|a, b| b.total.cmp(&a.total));

    tallies
        .into_iter()
        .enumerate()
        .map(|(index, tally)| AggregateRow {
            rank: index + 1,
            podium: index < PODIUM_SIZE,
            average: format_average(tally.total as f64 / tally.occurrences as f64),
            name: tally.name,
            total: tally.total,
            occurrences: tally.occurrences,
        })
        .collect()
}

/// Per-day breakdown, most recent day first. Days with nothing positive are
/// left out.
pub fn history(projects: &[Project], start: NaiveDate) -> Vec<HistoryDay> {
    let mut days: BTreeMap<NaiveDate, Vec<HistoryEntry>> = BTreeMap::new();

    for project in projects {
        for (date, value) in project.logs.range(start..) {
            if *value > 0 {
                days.entry(*date).or_default().push(HistoryEntry {
                    name: project.name.clone(),
                    count: *value,
                });
            }
        }
    }

    days.into_iter()
        .rev()
        .map(|(date, entries)| HistoryDay {
            date: day_key(date),
            total: entries.iter().map(|entry| entry.count).sum(),
            entries,
        })
        .collect()
}

/// One decimal place, halves rounded up, without a trailing `.0`.
pub fn format_average(value: f64) -> String {
    let rounded = (value * 10.0).round() / 10.0;
    let formatted = format!("{rounded:.1}");
    match formatted.strip_suffix(".0") {
        Some(whole) => whole.to_string(),
        None => formatted,
    }
}
