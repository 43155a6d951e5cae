#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

use std::path::PathBuf;
use std::sync::Arc;

use prix_map_server::{load_seed, run_server};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let seed_path = std::env::var("DATA_FILE")
        .map_or_else(|_| PathBuf::from("data/seed.json"), PathBuf::from);

    let store = match load_seed(&seed_path) {
        Ok(store) => store,
        Err(e) => {
            log::error!("Failed to load seed data from {}: {e}", seed_path.display());
            return Err(std::io::Error::other(e.to_string()));
        }
    };

    run_server(Arc::new(store)).await
}
