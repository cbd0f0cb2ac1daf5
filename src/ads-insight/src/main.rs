//! Ads Insight: marketing performance dashboard for advertising accounts.
//!
//! Command-line front end: manages the persisted session, runs fetch cycles
//! against the live platform (or demo data) and prints or exports the result.

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use insight_cache::{LocalMetricsCache, MetricsCache, RedisMetricsCache};
use insight_coordinator::{DataMode, SessionController};
use insight_core::config::AppConfig;
use insight_core::types::{DateRange, TimeRange};
use insight_core::SessionStore;
use insight_integrations::{GraphApiClient, MockGenerator};
use insight_reporting::{DashboardSnapshot, SortConfig, SortDirection, SortKey};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "ads-insight")]
#[command(about = "Marketing performance dashboard for advertising accounts")]
#[command(version)]
struct Cli {
    /// Session state file (overrides config)
    #[arg(long, env = "ADS_INSIGHT__SESSION__STATE_PATH")]
    state: Option<String>,

    /// Redis URL for the metrics cache (overrides config)
    #[arg(long, env = "ADS_INSIGHT__CACHE__REDIS_URL")]
    redis_url: Option<String>,

    /// Seed for reproducible demo data (overrides config)
    #[arg(long, env = "ADS_INSIGHT__MOCK__SEED")]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sign in to the advertising platform and switch to live data
    Login,

    /// Sign out and reset every filter
    Logout,

    /// Show the signed-in user, data mode and active filters
    Status,

    /// List the ad accounts available to the session
    Accounts,

    /// List the campaigns of the selected account
    Campaigns,

    /// Change the account and/or campaign filter (`all` for every one)
    Select {
        #[arg(long)]
        account: Option<String>,

        #[arg(long)]
        campaign: Option<String>,
    },

    /// Change the reporting window: today, last-7, last-30, previous-month, year, custom
    Range {
        mode: TimeRange,

        /// First day of a custom range (YYYY-MM-DD)
        #[arg(long, requires = "end")]
        start: Option<NaiveDate>,

        /// Last day of a custom range (YYYY-MM-DD)
        #[arg(long, requires = "start")]
        end: Option<NaiveDate>,
    },

    /// Fetch and print the dashboard
    Report {
        #[command(flatten)]
        table: TableArgs,

        /// Print the snapshot as JSON
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Re-fetch every N seconds until interrupted
        #[arg(long)]
        watch: Option<u64>,
    },

    /// Fetch and write the daily table as CSV
    Export {
        #[command(flatten)]
        table: TableArgs,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[derive(clap::Args, Debug)]
struct TableArgs {
    /// Keep rows whose date contains this text
    #[arg(long)]
    search: Option<String>,

    /// Sort column: date, spend, leads, messaging, conversions, roas
    #[arg(long)]
    sort: Option<SortKey>,

    /// Sort ascending instead of descending
    #[arg(long, default_value_t = false)]
    asc: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ads_insight=info,insight_coordinator=info".into()),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    if let Some(state) = cli.state {
        config.session.state_path = state;
    }
    if let Some(url) = cli.redis_url {
        config.cache.redis_url = Some(url);
    }
    if let Some(seed) = cli.seed {
        config.mock.seed = Some(seed);
    }

    info!(
        graph = %config.graph.base_url,
        version = %config.graph.api_version,
        cache = config.cache.is_configured(),
        state = %config.session.state_path,
        "Configuration loaded"
    );

    let live = Arc::new(GraphApiClient::new(&config.graph)?);
    let cache: Arc<dyn MetricsCache> = if config.cache.is_configured() {
        Arc::new(RedisMetricsCache::new(&config.cache)?)
    } else {
        Arc::new(LocalMetricsCache::new())
    };

    let mut controller = SessionController::new(
        SessionStore::new(&config.session.state_path),
        live,
        cache,
        MockGenerator::new(&config.mock),
    );
    controller.load_accounts().await;

    match cli.command {
        Commands::Login => match controller.login().await {
            Ok(user) => {
                println!("Signed in as {} ({})", user.name, user.id);
                print_accounts(&controller);
            }
            Err(e) => anyhow::bail!("Sign-in failed: {e}"),
        },
        Commands::Logout => {
            controller.logout();
            println!("Signed out");
        }
        Commands::Status => print_status(&controller),
        Commands::Accounts => print_accounts(&controller),
        Commands::Campaigns => {
            let campaigns = controller.active_campaigns();
            if campaigns.is_empty() {
                println!("No campaigns (select an account first)");
            }
            for campaign in campaigns {
                println!("{:<24} {}", campaign.id, campaign.name);
            }
        }
        Commands::Select { account, campaign } => {
            if let Some(account) = account {
                controller.select_account(&account).await;
            }
            if let Some(campaign) = campaign {
                controller.select_campaign(&campaign);
            }
            print_status(&controller);
        }
        Commands::Range { mode, start, end } => {
            if let (Some(start), Some(end)) = (start, end) {
                controller.set_custom_range(DateRange::new(start, end));
            }
            controller.set_time_range(mode);
            let ranges = controller.ranges();
            println!(
                "{}: {} ({})",
                mode, ranges.current, ranges.comparison_label
            );
        }
        Commands::Report { table, json, watch } => {
            apply_table_args(&mut controller, &table);
            match watch {
                Some(secs) => {
                    let mut ticker = tokio::time::interval(Duration::from_secs(secs.max(1)));
                    loop {
                        ticker.tick().await;
                        controller.refresh().await;
                        print_report(&controller, json)?;
                    }
                }
                None => {
                    controller.refresh().await;
                    print_report(&controller, json)?;
                }
            }
        }
        Commands::Export { table, output } => {
            apply_table_args(&mut controller, &table);
            controller.refresh().await;
            if let Some(err) = controller.last_error() {
                warn!(error = %err, "Exporting without data");
            }
            let csv = controller.export_csv();
            match output {
                Some(path) => {
                    std::fs::write(&path, &csv)
                        .with_context(|| format!("writing export to {path}"))?;
                    info!(path = %path, rows = controller.table_rows().len(), "Export written");
                }
                None => println!("{csv}"),
            }
        }
    }

    controller.flush().await;
    Ok(())
}

fn apply_table_args(controller: &mut SessionController, args: &TableArgs) {
    if let Some(term) = &args.search {
        controller.set_search(term);
    }
    let sort = sort_from_args(controller.table().sort, args.sort, args.asc);
    controller.set_sort(sort);
}

/// `--sort` picks the column and defaults to descending; `--asc` alone
/// flips the current column to ascending.
fn sort_from_args(current: SortConfig, key: Option<SortKey>, asc: bool) -> SortConfig {
    let direction = if asc {
        SortDirection::Asc
    } else if key.is_some() {
        SortDirection::Desc
    } else {
        current.direction
    };
    SortConfig {
        key: key.unwrap_or(current.key),
        direction,
    }
}

fn print_status(controller: &SessionController) {
    let state = controller.state();
    match controller.user() {
        Some(user) => println!("User:     {} <{}>", user.name, user.email),
        None => println!("User:     (signed out)"),
    }
    let mode = match controller.mode() {
        DataMode::Live => "live",
        DataMode::Mock => "demo",
    };
    println!("Data:     {mode}");
    println!("Account:  {}", state.selected_account_id);
    println!("Campaign: {}", state.selected_campaign_id);
    println!("Range:    {} {}", state.time_range, controller.ranges().current);
}

fn print_accounts(controller: &SessionController) {
    let accounts = controller.active_accounts();
    if accounts.is_empty() {
        println!("No ad accounts");
    }
    for account in accounts {
        println!("{:<24} {:<32} {}", account.id, account.name, account.currency);
    }
}

fn print_report(controller: &SessionController, json: bool) -> anyhow::Result<()> {
    let Some(snapshot) = controller.snapshot() else {
        println!("No data");
        return Ok(());
    };

    if json {
        let body = serde_json::json!({
            "source": controller.last_source(),
            "error": controller.last_error(),
            "snapshot": snapshot,
            "rows": controller.table_rows(),
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    if let Some(err) = controller.last_error() {
        match err.code() {
            Some(code) => println!("! {err} (code {code})"),
            None => println!("! {err}"),
        }
    }
    print_cards(snapshot, controller.last_source());

    println!();
    println!(
        "{:<12} {:>10} {:>8} {:>11} {:>9} {:>6} {:>11} {:>10} {:>6}",
        "Date", "Spend", "Clicks", "Impressions", "Messaging", "Leads", "Conversions", "Revenue",
        "ROAS"
    );
    for row in controller.table_rows() {
        println!(
            "{:<12} {:>10.2} {:>8} {:>11} {:>9} {:>6} {:>11} {:>10.2} {:>6.2}",
            row.date.to_string(),
            row.spend,
            row.clicks,
            row.impressions,
            row.messaging,
            row.leads,
            row.conversions,
            row.revenue,
            row.roas()
        );
    }
    Ok(())
}

fn print_cards(snapshot: &DashboardSnapshot, source: &str) {
    println!(
        "{} .. {} [{source}]",
        snapshot.ranges.current.start_date, snapshot.ranges.current.end_date
    );
    for card in &snapshot.cards {
        let marker = if card.is_negative { "v" } else { "^" };
        println!(
            "{:<12} {:>12.2}  {marker} {:>8} {}",
            card.label, card.value, card.trend, card.comparison_label
        );
    }
}
