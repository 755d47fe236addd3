use crate::api::traits::FlightSearchApi;
use crate::api::types::SearchResponse;
use crate::config::AppConfig;
use crate::model::{ApiError, SearchRequest};

use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Tokens are refreshed this many seconds before the server-reported expiry.
const TOKEN_REFRESH_MARGIN_SECS: u64 = 60;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

pub struct AmadeusClient {
    client: Client,
    base_url: String,
    client_id: String,
    client_secret: String,
    token: Mutex<Option<CachedToken>>,
}

impl AmadeusClient {
    pub fn new(config: &AppConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to create HTTP client");

        let base_url = match config.amadeus_hostname.as_str() {
            "production" => "https://api.amadeus.com".to_string(),
            _ => "https://test.api.amadeus.com".to_string(),
        };

        Self {
            client,
            base_url,
            client_id: config.amadeus_client_id.clone(),
            client_secret: config.amadeus_client_secret.clone(),
            token: Mutex::new(None),
        }
    }

    /// Returns a valid bearer token, requesting a fresh one via the OAuth2
    /// client-credentials flow when the cached token is absent or stale.
    async fn access_token(&self) -> Result<String, ApiError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.access_token.clone());
            }
        }

        let url = format!("{}/v1/security/oauth2/token", self.base_url);
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];

        let response = self.client.post(&url).form(&params).send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Auth(format!("status {status}: {body}")));
        }

        let token: TokenResponse = response.json().await?;
        let expires_at = Instant::now()
            + Duration::from_secs(token.expires_in.saturating_sub(TOKEN_REFRESH_MARGIN_SECS));
        let access_token = token.access_token.clone();
        *cached = Some(CachedToken {
            access_token: token.access_token,
            expires_at,
        });

        Ok(access_token)
    }
}

#[async_trait::async_trait]
impl FlightSearchApi for AmadeusClient {
    async fn search(&self, req: &SearchRequest) -> Result<SearchResponse, ApiError> {
        let token = self.access_token().await?;
        let url = format!("{}/v2/shopping/flight-offers", self.base_url);

        let mut query: Vec<(&str, String)> = vec![
            ("originLocationCode", req.origin.clone()),
            ("destinationLocationCode", req.destination.clone()),
            ("departureDate", req.departure_date.to_string()),
            ("adults", "1".to_string()),
            ("currencyCode", req.currency.clone()),
            ("max", req.max_results.to_string()),
        ];
        if let Some(airline) = &req.included_airline {
            query.push(("includedAirlineCodes", airline.clone()));
        }

        let response = self
            .client
            .get(&url)
            .bearer_auth(&token)
            .query(&query)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::InvalidResponse { status, body });
        }

        Ok(response.json::<SearchResponse>().await?)
    }
}
