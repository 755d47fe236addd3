// Core structs: FlatRecord, SearchContext, SearchRequest
use chrono::{DateTime, Local, NaiveDate};
use thiserror::Error;

/// One search request against the flight-offers API, derived from a
/// configured route plus the date resolved for this cycle.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub currency: String,
    pub max_results: u32,
    pub included_airline: Option<String>,
}

/// Caller-supplied context shared by every offer of one search batch.
#[derive(Debug, Clone)]
pub struct SearchContext {
    pub logged_at: DateTime<Local>,
    pub search_date: NaiveDate,
    pub origin: String,
    pub destination: String,
}

/// Denormalized single-row view of an offer's first itinerary, in the exact
/// column order of the store file. Everything except `stops` is kept as an
/// opaque string so the logged values round-trip byte-for-byte.
///
/// Only the first itinerary of an offer is represented; return legs of a
/// round-trip offer are not captured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatRecord {
    pub logged_at: String,
    pub search_date: String,
    pub origin: String,
    pub destination: String,
    pub dep_airport: String,
    pub dep_time: String,
    pub arr_airport: String,
    pub arr_time: String,
    pub airline: String,
    pub flight_no: String,
    pub stops: u32,
    pub duration: String,
    pub price_total: String,
    pub currency: String,
    pub baggage: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("unexpected response (status {status}): {body}")]
    InvalidResponse { status: u16, body: String },
}

/// An offer that cannot be normalized. The whole batch fails rather than
/// silently dropping the bad offer, so a later failure can never leave a
/// partially-written batch in the store.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MalformedOfferError {
    #[error("offer field `{0}` is missing")]
    MissingField(&'static str),
    #[error("offer field `{0}` is empty")]
    EmptyField(&'static str),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store write error: {0}")]
    Csv(#[from] csv::Error),
}
