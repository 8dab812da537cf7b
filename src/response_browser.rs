/// Response browser
///
/// Read-only admin view over every stored intake submission:
/// 1. `refresh` pulls the whole collection (newest first) into a snapshot
/// 2. `apply_filters` projects the snapshot through search + two selects
/// 3. `select_record` opens a single-record detail slot
/// 4. `stats` summarizes the snapshot (not the filtered view)
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::IntakeRecord;
use crate::options::{label_or_verbatim, GoalType, RiskComfort};
use crate::store::ResponseStore;

/// Search text plus the two categorical filters. Empty means "any".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseFilters {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub goal_type: String,
    #[serde(default)]
    pub risk_comfort: String,
}

impl ResponseFilters {
    pub fn new(
        search: impl Into<String>,
        goal_type: impl Into<String>,
        risk_comfort: impl Into<String>,
    ) -> Self {
        Self {
            search: search.into(),
            goal_type: goal_type.into(),
            risk_comfort: risk_comfort.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.search.is_empty() && self.goal_type.is_empty() && self.risk_comfort.is_empty()
    }

    /// True when the record satisfies every non-empty filter.
    ///
    /// Search is a case-insensitive substring match on email, goal type or
    /// employment status; the selects are exact matches.
    pub fn matches(&self, record: &IntakeRecord) -> bool {
        if !self.search.is_empty() {
            let needle = self.search.to_lowercase();
            let hit = [
                &record.email,
                &record.goal_type,
                &record.employment_status,
            ]
            .iter()
            .any(|haystack| haystack.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }

        if !self.goal_type.is_empty() && record.goal_type != self.goal_type {
            return false;
        }

        if !self.risk_comfort.is_empty() && record.risk_comfort != self.risk_comfort {
            return false;
        }

        true
    }
}

/// Projects records through the filters, keeping their order.
pub fn filter_records<'a>(
    records: &'a [IntakeRecord],
    filters: &ResponseFilters,
) -> Vec<&'a IntakeRecord> {
    records.iter().filter(|r| filters.matches(r)).collect()
}

/// Summary figures over a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseStats {
    pub total: usize,
    /// Mean age rounded to the nearest whole year; 0 for an empty snapshot.
    pub average_age: i64,
    /// Most frequent goal type; ties go to the one seen first.
    pub top_goal_type: Option<String>,
}

impl ResponseStats {
    pub fn compute(records: &[IntakeRecord]) -> Self {
        let total = records.len();

        let average_age = if total == 0 {
            0
        } else {
            let sum: i64 = records.iter().map(|r| i64::from(r.age)).sum();
            (sum as f64 / total as f64).round() as i64
        };

        // (goal type, count) in first-encountered order
        let mut counts: Vec<(&str, usize)> = Vec::new();
        for record in records {
            match counts.iter_mut().find(|(goal, _)| *goal == record.goal_type) {
                Some((_, count)) => *count += 1,
                None => counts.push((record.goal_type.as_str(), 1)),
            }
        }

        let mut top: Option<(&str, usize)> = None;
        for (goal, count) in counts {
            if top.map_or(true, |(_, best)| count > best) {
                top = Some((goal, count));
            }
        }

        Self {
            total,
            average_age,
            top_goal_type: top.map(|(goal, _)| goal.to_string()),
        }
    }
}

/// One entry of a filter dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
}

/// Distinct values in first-encountered order.
fn distinct<'a>(values: impl Iterator<Item = &'a String>) -> Vec<&'a String> {
    let mut seen: Vec<&String> = Vec::new();
    for value in values {
        if !seen.contains(&value) {
            seen.push(value);
        }
    }
    seen
}

/// In-memory browser state over the stored submissions.
#[derive(Debug, Default)]
pub struct ResponseBrowser {
    snapshot: Vec<IntakeRecord>,
    filters: ResponseFilters,
    selected: Option<IntakeRecord>,
    is_loading: bool,
    last_refresh_failed: bool,
}

impl ResponseBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a browser over an already fetched snapshot.
    pub fn with_snapshot(snapshot: Vec<IntakeRecord>) -> Self {
        Self {
            snapshot,
            ..Self::default()
        }
    }

    pub fn snapshot(&self) -> &[IntakeRecord] {
        &self.snapshot
    }

    pub fn filters(&self) -> &ResponseFilters {
        &self.filters
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn last_refresh_failed(&self) -> bool {
        self.last_refresh_failed
    }

    /// Replaces the snapshot with a fresh fetch, newest first.
    ///
    /// On failure the previous snapshot is kept and `last_refresh_failed`
    /// is set. There is no retry.
    pub async fn refresh(&mut self, store: &dyn ResponseStore) -> Result<usize, AppError> {
        self.begin_refresh();
        let result = store.list_newest_first().await;
        self.finish_refresh(result)
    }

    /// First half of `refresh`: marks the browser as loading. The fetch
    /// itself can then run without holding the browser.
    pub fn begin_refresh(&mut self) {
        self.is_loading = true;
        tracing::info!("Refreshing intake responses");
    }

    /// Second half of `refresh`: applies the store's answer.
    pub fn finish_refresh(
        &mut self,
        result: Result<Vec<IntakeRecord>, AppError>,
    ) -> Result<usize, AppError> {
        self.is_loading = false;

        match result {
            Ok(records) => {
                let count = records.len();
                self.snapshot = records;
                self.last_refresh_failed = false;
                tracing::info!("✓ Loaded {} intake responses", count);
                Ok(count)
            }
            Err(e) => {
                self.last_refresh_failed = true;
                tracing::error!("Error fetching responses: {}", e);
                Err(e)
            }
        }
    }

    /// Stores the filters and returns the projected view.
    pub fn apply_filters(
        &mut self,
        search: &str,
        goal_type: &str,
        risk_comfort: &str,
    ) -> Vec<&IntakeRecord> {
        self.filters = ResponseFilters::new(search, goal_type, risk_comfort);
        self.filtered()
    }

    pub fn clear_filters(&mut self) {
        self.filters = ResponseFilters::default();
    }

    /// The snapshot projected through the current filters.
    pub fn filtered(&self) -> Vec<&IntakeRecord> {
        filter_records(&self.snapshot, &self.filters)
    }

    /// The snapshot projected through arbitrary filters, leaving the stored
    /// ones untouched.
    pub fn view(&self, filters: &ResponseFilters) -> Vec<&IntakeRecord> {
        filter_records(&self.snapshot, filters)
    }

    pub fn select_record(&mut self, record: IntakeRecord) {
        self.selected = Some(record);
    }

    /// Selects a snapshot record by id; `None` when it is not in the snapshot.
    pub fn select_by_id(&mut self, id: i64) -> Option<&IntakeRecord> {
        let record = self.find(id)?.clone();
        self.selected = Some(record);
        self.selected.as_ref()
    }

    pub fn close_detail(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&IntakeRecord> {
        self.selected.as_ref()
    }

    pub fn find(&self, id: i64) -> Option<&IntakeRecord> {
        self.snapshot.iter().find(|r| r.id == id)
    }

    pub fn stats(&self) -> ResponseStats {
        ResponseStats::compute(&self.snapshot)
    }

    /// Goal types present in the snapshot, for the goal filter dropdown.
    pub fn goal_type_options(&self) -> Vec<FilterOption> {
        distinct(self.snapshot.iter().map(|r| &r.goal_type))
            .into_iter()
            .map(|value| FilterOption {
                value: value.clone(),
                label: label_or_verbatim::<GoalType>(value),
            })
            .collect()
    }

    /// Risk levels present in the snapshot, for the risk filter dropdown.
    pub fn risk_comfort_options(&self) -> Vec<FilterOption> {
        distinct(self.snapshot.iter().map(|r| &r.risk_comfort))
            .into_iter()
            .map(|value| FilterOption {
                value: value.clone(),
                label: label_or_verbatim::<RiskComfort>(value),
            })
            .collect()
    }
}
