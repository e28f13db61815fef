use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use thiserror::Error;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use fareflow_core::config::{AppConfig, ConfigError, LoadOptions};
use fareflow_core::domain::flight::RawOffer;
use fareflow_core::{Ranker, Reconciler, SourceReliability};
use fareflow_db::{connect, migrations, DbPool, SessionStore, SqlSessionRepository};
use fareflow_providers::{
    AmadeusSource, FlightSource, LoggingNotifier, SourceError, SourceFanout, StaticSource,
    UpiPaymentLinks,
};

use crate::chat;
use crate::health;
use crate::turn::TurnHandler;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub router: Router,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("flight source construction failed: {0}")]
    Source(#[source] SourceError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool = connect(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(event_name = "system.bootstrap.database_connected", "database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    let sources = build_sources(&config)?;
    let fanout = SourceFanout::new(sources, Duration::from_secs(config.search.source_timeout_secs));
    info!(
        event_name = "system.bootstrap.sources_ready",
        sources = ?fanout.source_names(),
        "flight sources configured"
    );

    let store = Arc::new(SessionStore::new(
        Arc::new(SqlSessionRepository::new(db_pool.clone())),
        config.session.ttl_secs,
    ));
    let turns = Arc::new(TurnHandler::new(
        store,
        fanout,
        Arc::new(Reconciler::new(SourceReliability::new(config.sources.reliability.clone()))),
        Ranker::new(config.search.display_results),
        Arc::new(UpiPaymentLinks),
        Arc::new(LoggingNotifier),
        config.search.max_offers_per_source,
    ));

    let router = chat::router(turns)
        .merge(health::router(db_pool.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    Ok(Application { config, db_pool, router })
}

/// Live Amadeus when credentials are present, otherwise a deterministic
/// demo catalog spread across two canned sources.
fn build_sources(config: &AppConfig) -> Result<Vec<Arc<dyn FlightSource>>, BootstrapError> {
    if config.sources.amadeus.is_configured() {
        let amadeus = AmadeusSource::new(&config.sources.amadeus, &config.search)
            .map_err(BootstrapError::Source)?;
        return Ok(vec![Arc::new(amadeus)]);
    }

    info!(
        event_name = "system.bootstrap.demo_sources",
        "no source credentials configured, serving canned offers"
    );
    Ok(vec![
        Arc::new(StaticSource::new("Skyscanner", demo_offers())),
        Arc::new(StaticSource::new("Cleartrip", demo_offers_alternate())),
    ])
}

fn demo_offer(
    airline: &str,
    code: &str,
    time: &str,
    price: i64,
    duration: &str,
    stops: u32,
) -> RawOffer {
    RawOffer {
        airline: airline.to_owned(),
        flight_code: code.to_owned(),
        departure_time: time.to_owned(),
        price,
        duration: duration.to_owned(),
        stops,
        source: String::new(),
    }
}

fn demo_offers() -> Vec<RawOffer> {
    vec![
        demo_offer("6E", "6E-101", "06:15", 3450, "2:10:00", 0),
        demo_offer("AI", "AI-864", "09:40", 5120, "2:05:00", 0),
        demo_offer("SG", "SG-8169", "13:25", 2899, "2:20:00", 0),
        demo_offer("QP", "QP-1128", "18:50", 4275, "3:35:00", 1),
    ]
}

fn demo_offers_alternate() -> Vec<RawOffer> {
    vec![
        demo_offer("6E", "6E-101", "06:20", 3500, "2:10:00", 0),
        demo_offer("AI", "AI-864", "09:40", 4990, "2:05:00", 0),
        demo_offer("G8", "G8-334", "21:05", 3150, "2:15:00", 0),
    ]
}

#[cfg(test)]
mod tests {
    use fareflow_core::config::{ConfigOverrides, LoadOptions};

    use crate::bootstrap::bootstrap;

    fn memory_options() -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:?cache=shared".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_prepares_schema_and_router() {
        let app = bootstrap(memory_options()).await.expect("bootstrap should succeed");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'sessions'",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("schema should be queryable after bootstrap");
        assert_eq!(table_count, 1, "bootstrap should create the sessions table");

        app.db_pool.close().await;
    }

    #[tokio::test]
    async fn bootstrap_surfaces_config_validation_failures() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:".to_string()),
                amadeus_api_key: Some("key-without-secret".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await;

        let message = result.err().expect("half credentials should fail").to_string();
        assert!(message.contains("amadeus"));
    }
}
