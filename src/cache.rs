//! JSON file persistence for fetched pull-request data.
//!
//! One cache file per organization holds the flat list of pull requests
//! across all its repositories. A missing file is not fatal: `load_or_fetch`
//! runs one fetch-and-save cycle and retries the load once.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::File;
use std::future::Future;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("no cache file at {0}")]
    NotFound(PathBuf),

    #[error("failed to access cache file: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache file is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// The cached aggregate: an organization name plus the flat list of its
/// pull requests across all repositories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrgPullRequests {
    pub org_name: String,
    pub pull_requests: Vec<Value>,
}

impl OrgPullRequests {
    pub fn new(org_name: &str, pull_requests: Vec<Value>) -> Self {
        Self {
            org_name: org_name.to_string(),
            pull_requests,
        }
    }

    /// Default cache location for an organization: `<cache_dir>/<org>_prs.json`.
    pub fn default_file_name(org_name: &str, cache_dir: &Path) -> PathBuf {
        cache_dir.join(format!("{org_name}_prs.json"))
    }

    pub fn save(&self, path: &Path) -> Result<(), CacheError> {
        let file = File::create(path)?;
        serde_json::to_writer(BufWriter::new(file), self)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, CacheError> {
        let file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CacheError::NotFound(path.to_path_buf())
            } else {
                CacheError::Io(e)
            }
        })?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

/// Loads the cached pull requests for `org_name`, fetching and saving them
/// first when no cache file exists yet. The fetch runs at most once; the
/// load is retried exactly once after it.
pub async fn load_or_fetch<F, Fut>(
    path: &Path,
    org_name: &str,
    fetch: F,
) -> anyhow::Result<OrgPullRequests>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = anyhow::Result<Vec<Value>>>,
{
    match OrgPullRequests::load(path) {
        Ok(cached) => Ok(cached),
        Err(CacheError::NotFound(_)) => {
            tracing::info!(org = org_name, path = %path.display(), "No cache file, fetching");
            let prs = fetch().await?;
            OrgPullRequests::new(org_name, prs).save(path)?;
            Ok(OrgPullRequests::load(path)?)
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;
    use tempfile::tempdir;

    fn sample_prs() -> Vec<Value> {
        vec![
            json!({"state": "open", "draft": false}),
            json!({"state": "closed", "draft": true}),
        ]
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = OrgPullRequests::default_file_name("acme", dir.path());
        assert!(path.ends_with("acme_prs.json"));

        let cached = OrgPullRequests::new("acme", sample_prs());
        cached.save(&path).unwrap();

        let loaded = OrgPullRequests::load(&path).unwrap();
        assert_eq!(loaded.org_name, "acme");
        assert_eq!(loaded.pull_requests, sample_prs());
    }

    #[test]
    fn test_load_missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nope.json");
        let err = OrgPullRequests::load(&path).unwrap_err();
        assert!(matches!(err, CacheError::NotFound(_)));
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = OrgPullRequests::load(&path).unwrap_err();
        assert!(matches!(err, CacheError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_load_or_fetch_runs_one_fetch_cycle_when_cache_absent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("acme_prs.json");
        let fetches = Cell::new(0);

        let loaded = load_or_fetch(&path, "acme", || {
            fetches.set(fetches.get() + 1);
            async { Ok(sample_prs()) }
        })
        .await
        .unwrap();

        assert_eq!(fetches.get(), 1);
        assert_eq!(loaded.pull_requests.len(), 2);
        // The cycle persisted the cache for next time.
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_load_or_fetch_skips_fetch_when_cache_present() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("acme_prs.json");
        OrgPullRequests::new("acme", sample_prs())
            .save(&path)
            .unwrap();

        async fn forbidden_fetch() -> anyhow::Result<Vec<Value>> {
            panic!("fetch must not run when the cache exists")
        }

        let loaded = load_or_fetch(&path, "acme", forbidden_fetch).await.unwrap();

        assert_eq!(loaded.org_name, "acme");
    }

    #[tokio::test]
    async fn test_load_or_fetch_propagates_fetch_failure() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("acme_prs.json");

        let result = load_or_fetch(&path, "acme", || async {
            Err(anyhow::anyhow!("boom"))
        })
        .await;

        assert!(result.is_err());
        assert!(!path.exists());
    }
}
