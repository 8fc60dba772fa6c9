//! Aggregation over fetched pull-request data.
//!
//! Two views are produced: an organization summary (state and draft counts,
//! org-wide and per repository) and a weekly trend (created/merged counters
//! bucketed by the start of each calendar week).

use crate::store::MemStore;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Typed read-only view of the fields aggregation cares about. The records
/// themselves stay opaque; anything absent or malformed deserializes to
/// `None` and is simply not counted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PullRequest {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub draft: Option<bool>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
}

impl PullRequest {
    pub fn from_value(value: &Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }
}

/// State and draft counts for one set of pull requests.
///
/// `draft` is an orthogonal boolean, not a third state: open + closed may
/// be less than total only when the API reports an unexpected state string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PullCounts {
    pub total: usize,
    pub open: usize,
    pub closed: usize,
    pub draft: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RepoSummary {
    pub name: String,
    #[serde(flatten)]
    pub counts: PullCounts,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrgSummary {
    pub org_name: String,
    pub repo_count: usize,
    #[serde(flatten)]
    pub counts: PullCounts,
    pub repos: Vec<RepoSummary>,
}

/// One week's created/merged counters, keyed by the week's start date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekBucket {
    pub week_of: NaiveDate,
    pub created: usize,
    pub merged: usize,
}

fn count_pulls(pull_values: &[Value]) -> PullCounts {
    let mut counts = PullCounts {
        total: pull_values.len(),
        ..PullCounts::default()
    };

    for value in pull_values {
        let pr = PullRequest::from_value(value);
        match pr.state.as_deref() {
            Some("open") => counts.open += 1,
            Some("closed") => counts.closed += 1,
            _ => {}
        }
        if pr.draft == Some(true) {
            counts.draft += 1;
        }
    }

    counts
}

fn repo_pull_values(repo_record: &Value) -> &[Value] {
    repo_record
        .get("pull_requests")
        .and_then(Value::as_array)
        .map_or(&[], Vec::as_slice)
}

/// Summarizes a store populated by the fetch orchestrator: one entry per
/// repository, each holding a `pull_requests` array.
pub fn summarize(store: &MemStore, org_name: &str) -> OrgSummary {
    let mut org_counts = PullCounts::default();
    let mut repos = Vec::with_capacity(store.len());

    for (name, record) in store.iter() {
        let counts = count_pulls(repo_pull_values(record));

        org_counts.total += counts.total;
        org_counts.open += counts.open;
        org_counts.closed += counts.closed;
        org_counts.draft += counts.draft;

        repos.push(RepoSummary {
            name: name.clone(),
            counts,
        });
    }

    OrgSummary {
        org_name: org_name.to_string(),
        repo_count: store.len(),
        counts: org_counts,
        repos,
    }
}

/// The most recent occurrence of `week_start` on or before `date`.
pub fn week_start_date(date: NaiveDate, week_start: Weekday) -> NaiveDate {
    let days_past = (7 + date.weekday().num_days_from_monday()
        - week_start.num_days_from_monday())
        % 7;
    date - Duration::days(i64::from(days_past))
}

/// Buckets pull requests into calendar weeks by their creation and merge
/// dates. A pull request increments `created` in its creation week and
/// `merged` in its merge week; those may be the same bucket or two
/// different ones. Buckets come back sorted most recent first.
pub fn weekly_trend(pull_values: &[Value], week_start: Weekday) -> Vec<WeekBucket> {
    let mut weeks: BTreeMap<NaiveDate, (usize, usize)> = BTreeMap::new();

    for value in pull_values {
        let pr = PullRequest::from_value(value);

        if let Some(merged_at) = pr.merged_at {
            let week = week_start_date(merged_at.date_naive(), week_start);
            weeks.entry(week).or_default().1 += 1;
        }
        if let Some(created_at) = pr.created_at {
            let week = week_start_date(created_at.date_naive(), week_start);
            weeks.entry(week).or_default().0 += 1;
        }
    }

    weeks
        .into_iter()
        .rev()
        .map(|(week_of, (created, merged))| WeekBucket {
            week_of,
            created,
            merged,
        })
        .collect()
}
