use chrono::Utc;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use volunteer::config::Config;
use volunteer::database::{self, campaigns_repo};
use volunteer::services::campaign_status_service;

// One scheduler pass; meant to be run from cron.
#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("config error: {}", e);
            std::process::exit(2);
        }
    };

    let pool = match database::connect(&config).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("database connection failed: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = database::migrate(&pool).await {
        eprintln!("migration failed: {}", e);
        std::process::exit(1);
    }

    match campaign_status_service::auto_transition_campaigns(&pool, Utc::now()).await {
        Ok(report) => {
            println!(
                "campaign transitions: total={}, approved_to_ongoing={}, ongoing_to_completed={}",
                report.total_updated,
                report.details.approved_to_ongoing,
                report.details.ongoing_to_completed
            );
        }
        Err(e) => {
            eprintln!("campaign transitions failed: {}", e);
            std::process::exit(1);
        }
    }

    match campaigns_repo::list_counter_drift(&pool).await {
        Ok(drift) => {
            for row in drift {
                warn!(
                    campaign_id = %row.campaign_id,
                    current_volunteers = row.current_volunteers,
                    registration_count = row.registration_count,
                    "campaign volunteer counter drift"
                );
            }
        }
        Err(e) => warn!("counter drift check failed: {}", e),
    }
}
