//! Concurrent fetch orchestration.
//!
//! One fetch future per repository runs through a bounded `buffer_unordered`
//! stream; the collect below it is the join barrier, so callers only ever
//! see a fully-populated store. The store is owned by the orchestrator
//! alone and written after each task joins, so there is exactly one writer
//! and the per-repository paths can never race.
//!
//! Failure policy: the first failed repository fetch aborts the whole batch.
//! No partial store is returned.

use crate::config::AppConfig;
use crate::github::GithubClient;
use crate::store::{FilterOutcome, MemStore};
use anyhow::Result;
use futures::stream::{self, StreamExt, TryStreamExt};
use serde_json::Value;

/// Path segment under each repository that holds its pull-request list.
pub const PULL_REQUESTS_KEY: &str = "pull_requests";

/// All repositories for the given org, indexed by repository name.
pub async fn org_repos(client: &GithubClient, org: &str) -> Result<MemStore> {
    let repos = client.list_org_repos(org).await?;
    let mut store = MemStore::new(&format!("{org}/repos"));
    store.update_from_array(repos, "name");
    Ok(store)
}

/// Fetches every repository of an organization along with its pull
/// requests, stored under the `<repo>:pull_requests` key path.
///
/// At most `fetch_concurrency_limit` repository fetches are in flight at
/// once; each one pages through the full pull-request listing.
pub async fn fetch_org_repos_with_prs(
    client: &GithubClient,
    config: &AppConfig,
    org: &str,
) -> Result<MemStore> {
    let mut store = org_repos(client, org).await?;
    let repo_names: Vec<String> = store.keys().cloned().collect();
    tracing::info!(org, repos = repo_names.len(), "Fetching pull requests");

    let results: Vec<(String, Value)> = stream::iter(repo_names)
        .map(|repo_name| {
            let client = client.clone();
            let org = org.to_string();
            async move {
                let prs = client.list_pull_requests(&org, &repo_name).await?;
                tracing::debug!(repo = %repo_name, count = prs.len(), "Fetched pull requests");
                let path = MemStore::build_path(&[&repo_name, PULL_REQUESTS_KEY]);
                Ok::<_, anyhow::Error>((path, Value::Array(prs)))
            }
        })
        .buffer_unordered(config.fetch_concurrency_limit)
        .try_collect()
        .await?;

    for (path, prs) in results {
        // Each task targets a distinct repository, so every path is vacant.
        debug_assert!(store.get_path(&path).is_err());
        store.set_path(&path, prs)?;
    }

    Ok(store)
}

/// Flattens a populated store into one list of pull requests across all
/// repositories.
pub fn collect_org_prs(store: &MemStore) -> Vec<Value> {
    let populated = store.filter(
        |_, record| {
            if record.get(PULL_REQUESTS_KEY).is_some() {
                FilterOutcome::Include
            } else {
                FilterOutcome::Exclude
            }
        },
        false,
    );

    let mut prs = Vec::new();
    for record in populated.values() {
        if let Some(list) = record.get(PULL_REQUESTS_KEY).and_then(Value::as_array) {
            prs.extend(list.iter().cloned());
        }
    }
    prs
}
