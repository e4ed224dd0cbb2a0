// src/utils/env.rs
use log::{debug, info, warn};

/// Loads `.env` from the working directory (or a parent) if one exists.
pub fn load_env() {
    match dotenv::dotenv() {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => debug!("No .env file found, using process environment only"),
        Err(e) => warn!("Failed to load .env file: {}", e),
    }
}
