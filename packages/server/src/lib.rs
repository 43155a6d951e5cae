#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the prix-map application.
//!
//! Serves the REST API the map frontend consumes: zoned price
//! statistics per commune, price/m² summaries per geographic level,
//! adaptive rendering parameters, and adjacent-commune boundaries. The
//! data store is injected as a [`DataStore`] trait object; each request
//! runs one fetch → zone → aggregate pass with no shared mutable state
//! across requests.

mod handlers;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use prix_map_database::{DataStore, MemoryStore};
use prix_map_geography_models::Commune;
use prix_map_transaction_models::Transaction;
use prix_map_zoning::ZoningConfig;
use serde::{Deserialize, Serialize};

/// Shared application state.
pub struct AppState {
    /// Injected data-access boundary.
    pub store: Arc<dyn DataStore>,
    /// Zoning thresholds, fixed at startup.
    pub config: ZoningConfig,
}

/// Seed file layout for the in-memory store used in local development.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedData {
    /// Commune rows, geometry included.
    pub communes: Vec<Commune>,
    /// Pairs of commune codes sharing a boundary.
    #[serde(default)]
    pub adjacences: Vec<(String, String)>,
    /// Department code → region code pairs.
    #[serde(default)]
    pub departement_regions: Vec<(String, String)>,
    /// Transaction rows.
    pub transactions: Vec<Transaction>,
}

/// Loads a [`MemoryStore`] from a JSON seed file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_seed(path: &std::path::Path) -> Result<MemoryStore, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)?;
    let seed: SeedData = serde_json::from_str(&raw)?;

    let mut store = MemoryStore::new();
    for commune in seed.communes {
        store.insert_commune(commune);
    }
    for (a, b) in &seed.adjacences {
        store.insert_adjacency(a, b);
    }
    for (dept, region) in &seed.departement_regions {
        store.insert_departement_region(dept, region);
    }
    let count = seed.transactions.len();
    store.insert_transactions(seed.transactions);
    log::info!("Seeded store with {count} transactions");
    Ok(store)
}

/// Starts the prix-map API server on `BIND_ADDR`/`PORT` (defaults
/// `127.0.0.1:8080`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind
/// or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server(store: Arc<dyn DataStore>) -> std::io::Result<()> {
    let state = web::Data::new(AppState {
        store,
        config: ZoningConfig::default(),
    });

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .service(
                web::scope("/api")
                    .route("/health", web::get().to(handlers::health))
                    .route("/stats-zones", web::get().to(handlers::stats_zones))
                    .route("/prix-m2", web::get().to(handlers::prix_m2))
                    .route("/render-params", web::get().to(handlers::render_params))
                    .route(
                        "/communes-limitrophes",
                        web::get().to(handlers::communes_limitrophes),
                    ),
            )
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
