mod api;
mod config;
mod model;
mod normalizer;
mod storage;
mod utils;

use api::{AmadeusClient, FlightSearchApi};
use config::{AppConfig, RouteConfig, load_config};
use model::{SearchContext, SearchRequest};
use normalizer::normalize_all;
use storage::CsvStore;
use utils::parse_date;

use chrono::Local;
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Duration, sleep};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Load configuration from file
    let config: Arc<AppConfig> = match load_config("config.json") {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            error!("Config load error: {}", e);
            return;
        }
    };

    let client = Arc::new(AmadeusClient::new(&config));

    // Initialize the offer log with async access (wrapped in a Mutex)
    let store = match CsvStore::new(&config.csv_path) {
        Ok(s) => Arc::new(Mutex::new(s)),
        Err(e) => {
            error!("Failed to initialize store: {}", e);
            return;
        }
    };

    // Main processing loop
    loop {
        info!("Entering search cycle...");
        info!("Routes to process: {}", config.routes.len());

        // Process all routes concurrently
        let tasks: Vec<_> = config
            .routes
            .iter()
            .map(|route| process_route(route, client.clone(), store.clone(), config.clone()))
            .collect();
        join_all(tasks).await;

        info!(
            "Waiting {}s until next cycle...",
            config.check_interval_seconds
        );
        sleep(Duration::from_secs(config.check_interval_seconds)).await;
    }
}

/// Runs one search cycle for a single route: fetch offers, normalize the
/// whole batch, append it to the log. Any failure aborts this route's cycle
/// only; nothing is appended for a batch that did not fully normalize.
async fn process_route(
    route: &RouteConfig,
    client: Arc<AmadeusClient>,
    store: Arc<Mutex<CsvStore>>,
    config: Arc<AppConfig>,
) {
    let logged_at = Local::now();
    let search_date = match &route.departure_date {
        Some(date_str) => match parse_date(date_str) {
            Some(date) => date,
            None => {
                warn!(
                    "Invalid departure_date '{}' for {} -> {}",
                    date_str, route.origin, route.destination
                );
                return;
            }
        },
        None => logged_at.date_naive(),
    };

    let request = SearchRequest {
        origin: route.origin.clone(),
        destination: route.destination.clone(),
        departure_date: search_date,
        currency: config.currency.clone(),
        max_results: route.max_results,
        included_airline: route.included_airline.clone(),
    };

    info!(
        "Searching {} -> {} (date={})...",
        route.origin, route.destination, search_date
    );
    let response = match client.search(&request).await {
        Ok(r) => r,
        Err(e) => {
            warn!(
                "Search error for {} -> {}: {}",
                route.origin, route.destination, e
            );
            return;
        }
    };

    // Zero offers is a valid outcome, not an error: nothing to record.
    if response.data.is_empty() {
        info!("No offers found for {} -> {}", route.origin, route.destination);
        return;
    }

    let ctx = SearchContext {
        logged_at,
        search_date,
        origin: route.origin.clone(),
        destination: route.destination.clone(),
    };

    let records = match normalize_all(&response.data, &response.dictionaries.carriers, &ctx) {
        Ok(r) => r,
        Err(e) => {
            warn!(
                "Malformed offer for {} -> {}, batch dropped: {}",
                route.origin, route.destination, e
            );
            return;
        }
    };

    let count = records.len();
    if let Err(e) = store.lock().await.append(&records) {
        warn!("Store append error: {}", e);
        return;
    }

    info!(
        "Saved {} offers for {} -> {} (date={})",
        count, route.origin, route.destination, search_date
    );
}
