use chrono::Utc;
use clap::{Parser, Subcommand};
use orgpulse::cache::{self, OrgPullRequests};
use orgpulse::config::AppConfig;
use orgpulse::fetcher;
use orgpulse::github::GithubClient;
use orgpulse::{metrics, report, resolve_auth};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "orgpulse", about = "Pull-request reports for a GitHub organization")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Per-repository pull-request summary for an organization
    Summary {
        /// Organization name on the GitHub host
        org: String,
    },
    /// Week-over-week created/merged trend for an organization
    Trend {
        /// Organization name on the GitHub host
        org: String,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Initialize tracing (logging)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "orgpulse=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("{e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    let auth = resolve_auth(&config)?;
    let client = GithubClient::new(&config, auth)?;

    match cli.command {
        Commands::Summary { org } => {
            let store = fetcher::fetch_org_repos_with_prs(&client, &config, &org).await?;
            let summary = metrics::summarize(&store, &org);
            print!("{}", report::summary_report(&summary));
        }
        Commands::Trend { org } => {
            let cache_path = OrgPullRequests::default_file_name(&org, &config.cache_dir());
            let fetch_client = client.clone();
            let fetch_config = config.clone();
            let fetch_org = org.clone();
            let cached = cache::load_or_fetch(&cache_path, &org, move || async move {
                let store =
                    fetcher::fetch_org_repos_with_prs(&fetch_client, &fetch_config, &fetch_org)
                        .await?;
                Ok(fetcher::collect_org_prs(&store))
            })
            .await?;

            let buckets = metrics::weekly_trend(&cached.pull_requests, config.week_start()?);
            print!(
                "{}",
                report::trend_report(
                    &org,
                    &cached.pull_requests,
                    &buckets,
                    Utc::now().date_naive()
                )
            );
        }
    }

    Ok(())
}
