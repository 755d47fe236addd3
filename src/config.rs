use serde::Deserialize;
use std::env;
use std::fs;

fn default_max_results() -> u32 {
    5
}

#[derive(Debug, Deserialize)]
pub struct RouteConfig {
    pub origin: String,
    pub destination: String,
    /// Fixed departure date (YYYY-MM-DD). Absent means "today" at cycle time.
    #[serde(default)]
    pub departure_date: Option<String>,
    /// Restricts the search to one carrier code, e.g. "7C".
    #[serde(default)]
    pub included_airline: Option<String>,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub amadeus_client_id: String,
    #[serde(default)]
    pub amadeus_client_secret: String,
    /// "test" or "production".
    pub amadeus_hostname: String,
    pub currency: String,
    pub csv_path: String,
    pub routes: Vec<RouteConfig>,
    pub check_interval_seconds: u64,
}

pub fn load_config(path: &str) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;
    let mut config: AppConfig = serde_json::from_str(&content)?;

    // Credentials may be injected via the environment (CI secrets) instead of
    // the config file. The environment wins when both are present.
    if let Ok(id) = env::var("AMADEUS_CLIENT_ID") {
        config.amadeus_client_id = id;
    }
    if let Ok(secret) = env::var("AMADEUS_CLIENT_SECRET") {
        config.amadeus_client_secret = secret;
    }
    if config.amadeus_client_id.is_empty() || config.amadeus_client_secret.is_empty() {
        return Err("AMADEUS_CLIENT_ID / AMADEUS_CLIENT_SECRET are required".into());
    }

    Ok(config)
}
