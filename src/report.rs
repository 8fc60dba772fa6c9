//! Plain-text rendering of the two CLI reports.
//!
//! Rendering is separated from printing so the exact output is testable;
//! `main` just writes the returned string to stdout.

use crate::metrics::{OrgSummary, PullRequest, WeekBucket};
use chrono::NaiveDate;
use serde_json::Value;
use std::fmt::Write;

/// Per-repository summary report.
pub fn summary_report(summary: &OrgSummary) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Pull Request summary for {} organization",
        summary.org_name
    );
    let _ = writeln!(out, "{} total repos", summary.repo_count);
    let _ = writeln!(out, "{} total PRs (open+closed)", summary.counts.total);
    let _ = writeln!(out, "{} total open PRs", summary.counts.open);
    let _ = writeln!(out, "{} total closed PRs", summary.counts.closed);
    let _ = writeln!(out, "{} total draft PRs", summary.counts.draft);

    let _ = writeln!(out, "\nBreakdown by repo");
    let _ = writeln!(out, "------------------------");
    for repo in &summary.repos {
        let _ = writeln!(out, "Repo name: {}", repo.name);
        let _ = writeln!(out, "Total PRs (open+closed): {}", repo.counts.total);
        let _ = writeln!(out, "Total open PRs: {}", repo.counts.open);
        let _ = writeln!(out, "Total closed PRs: {}", repo.counts.closed);
        let _ = writeln!(out, "Total draft PRs: {}", repo.counts.draft);
        let _ = writeln!(out, "---");
    }

    out
}

/// Week-over-week trend report. `today` is the reference point for the
/// date-range header.
pub fn trend_report(
    org_name: &str,
    pull_values: &[Value],
    buckets: &[WeekBucket],
    today: NaiveDate,
) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Weekly Pull Request summary for {org_name} organization"
    );
    let _ = writeln!(out, "------------");
    let _ = writeln!(
        out,
        "Total PRs (open+closed+draft): {}",
        pull_values.len()
    );

    if let Some(earliest) = earliest_created(pull_values) {
        let _ = writeln!(out, "Full date range: {earliest} through {today}");
    }
    let _ = writeln!(out, "------------");

    for bucket in buckets {
        let _ = writeln!(
            out,
            "Week of {}... Created: {}, Merged: {}",
            bucket.week_of, bucket.created, bucket.merged
        );
    }

    out
}

fn earliest_created(pull_values: &[Value]) -> Option<NaiveDate> {
    pull_values
        .iter()
        .filter_map(|v| PullRequest::from_value(v).created_at)
        .min()
        .map(|dt| dt.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{summarize, weekly_trend};
    use crate::store::MemStore;
    use chrono::Weekday;
    use serde_json::json;

    #[test]
    fn test_summary_report_contents() {
        let mut store = MemStore::new("acme/repos");
        store.update_from_array(
            vec![json!({
                "name": "api",
                "pull_requests": [
                    {"state": "open", "draft": false},
                    {"state": "closed", "draft": true},
                ],
            })],
            "name",
        );

        let report = summary_report(&summarize(&store, "acme"));

        assert!(report.contains("Pull Request summary for acme organization"));
        assert!(report.contains("1 total repos"));
        assert!(report.contains("2 total PRs (open+closed)"));
        assert!(report.contains("1 total open PRs"));
        assert!(report.contains("1 total draft PRs"));
        assert!(report.contains("Repo name: api"));
    }

    #[test]
    fn test_trend_report_contents() {
        let pulls = vec![json!({
            "state": "closed",
            "created_at": "2024-01-03T10:00:00Z",
            "merged_at": "2024-01-09T15:30:00Z",
        })];
        let buckets = weekly_trend(&pulls, Weekday::Mon);
        let today = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();

        let report = trend_report("acme", &pulls, &buckets, today);

        assert!(report.contains("Weekly Pull Request summary for acme organization"));
        assert!(report.contains("Total PRs (open+closed+draft): 1"));
        assert!(report.contains("Full date range: 2024-01-03 through 2024-02-01"));
        assert!(report.contains("Week of 2024-01-08... Created: 0, Merged: 1"));
        assert!(report.contains("Week of 2024-01-01... Created: 1, Merged: 0"));
    }

    #[test]
    fn test_trend_report_no_pull_requests() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let report = trend_report("acme", &[], &[], today);
        assert!(report.contains("Total PRs (open+closed+draft): 0"));
        assert!(!report.contains("Full date range"));
    }
}
