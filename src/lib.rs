//! orgpulse: fetch, aggregate, and cache pull-request data for every
//! repository of a GitHub organization.
//!
//! The flow runs in four stages: the paginated [`github`] client lists
//! repositories and pull requests, the [`fetcher`] fans the per-repository
//! fetches out with bounded concurrency into a keyed [`store`], the
//! [`metrics`] aggregator summarizes the populated store, and [`report`]
//! renders the result. [`cache`] persists the flat pull-request list per
//! organization so trend reports can run off a local file.

pub mod cache;
pub mod config;
pub mod creds;
pub mod fetcher;
pub mod github;
pub mod metrics;
pub mod report;
pub mod store;

use config::AppConfig;
use github::{api_hostname, Auth};

/// Resolves how the API client authenticates, in order of precedence:
/// a configured token, then a basic-auth pair from the credentials file,
/// otherwise anonymous. A configured credentials file with no entry for
/// the API host is an error, not a silent fallback.
pub fn resolve_auth(config: &AppConfig) -> anyhow::Result<Auth> {
    if let Some(token) = &config.github_token {
        return Ok(Auth::Token(token.clone()));
    }

    if let Some(cred_file) = &config.credentials_file {
        let hostname = api_hostname(&config.github_api_base);
        let credentials = creds::credentials_from_file_store(hostname, cred_file, "https")?;
        return Ok(Auth::Basic {
            username: credentials.username,
            password: credentials.password,
        });
    }

    Ok(Auth::Anonymous)
}
