use futures::future::join_all;
use price_pulse::analyzer::{Analyzer, TrendAnalyzer};
use price_pulse::config::{AppConfig, load_config};
use price_pulse::model::Product;
use price_pulse::storage::SqliteStorage;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Duration, sleep};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Set panic hook to log details about any panic
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Panic occurred: {:?}", panic_info);
    }));

    // Load configuration from file
    let config: Arc<AppConfig> = match load_config("config.json") {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            error!("Config load error: {}", e);
            return;
        }
    };

    let analyzer = TrendAnalyzer::new();

    // Initialize storage (SQLite) with async access (wrapped in a Mutex)
    let storage = match SqliteStorage::new(&config.database_path) {
        Ok(s) => Arc::new(Mutex::new(s)),
        Err(e) => {
            error!("Failed to initialize storage: {:?}", e);
            return;
        }
    };

    info!("price-pulse started");

    // Main processing loop
    loop {
        let products = match storage.lock().await.list_products() {
            Ok(p) => p,
            Err(e) => {
                error!("Product listing failed: {:?}", e);
                Vec::new()
            }
        };
        info!("Products to analyze: {}", products.len());

        // Analyze all products concurrently
        let tasks: Vec<_> = products
            .iter()
            .map(|product| process_product(product, &analyzer, storage.clone()))
            .collect();
        join_all(tasks).await;

        info!(
            "Waiting {}s until the next pass...",
            config.check_interval_seconds
        );
        sleep(Duration::from_secs(config.check_interval_seconds)).await;
    }
}

/// Runs one analysis pass for a single product: loads its history, logs
/// the forecast and refreshes the cached summary row.
async fn process_product(
    product: &Product,
    analyzer: &TrendAnalyzer,
    storage: Arc<Mutex<SqliteStorage>>,
) {
    info!("Analyzing product: {}", product.name);

    // Previous cached stats, for the log only
    {
        let storage_guard = storage.lock().await;
        if let Ok(Some(prev)) = storage_guard.get_stats(&product.id) {
            info!(
                "Previous stats: avg {:.2} | updated {}",
                prev.avg_price, prev.last_updated
            );
        }
    }

    let history = match storage.lock().await.get_history(&product.id) {
        Ok(h) => h,
        Err(e) => {
            warn!("History load failed for {}: {:?}", product.name, e);
            return;
        }
    };

    match analyzer.analyze(&history) {
        Some(prediction) => {
            info!(
                "{}: trend {} | confidence {}% | next price {:.2}",
                product.name, prediction.trend, prediction.confidence, prediction.predicted_price
            );
            info!("{}", prediction.analysis);
        }
        None => {
            // Normal state for a freshly added product, not an error.
            info!(
                "{}: not enough data yet ({} observation(s))",
                product.name,
                history.len()
            );
        }
    }

    if let Some(stats) = analyzer.calculate_stats(&history) {
        if let Err(e) = storage.lock().await.update_stats(&stats) {
            warn!("Stats update failed: {:?}", e);
        }
    }
}
