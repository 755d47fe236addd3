// Wire model of the flight-offers search response.
//
// Every field the normalizer needs is optional here: a hole in the payload
// surfaces as a `MalformedOfferError` from the normalizer, not as a
// deserialization failure that would throw away the whole response.
use serde::Deserialize;
use std::collections::HashMap;

/// Carrier code → display name, shared by all offers of one response.
pub type CarrierLookup = HashMap<String, String>;

#[derive(Debug, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub data: Vec<RawOffer>,
    #[serde(default)]
    pub dictionaries: Dictionaries,
}

#[derive(Debug, Default, Deserialize)]
pub struct Dictionaries {
    #[serde(default)]
    pub carriers: CarrierLookup,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOffer {
    #[serde(default)]
    pub itineraries: Vec<Itinerary>,
    #[serde(default)]
    pub price: Option<Price>,
    #[serde(default)]
    pub traveler_pricings: Vec<TravelerPricing>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Itinerary {
    /// ISO-8601 duration, e.g. "PT2H25M".
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    #[serde(default)]
    pub departure: Option<FlightEndpoint>,
    #[serde(default)]
    pub arrival: Option<FlightEndpoint>,
    #[serde(default)]
    pub carrier_code: Option<String>,
    #[serde(default)]
    pub number: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightEndpoint {
    #[serde(default)]
    pub iata_code: Option<String>,
    /// Local timestamp at the airport, copied verbatim into the log.
    #[serde(default)]
    pub at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    #[serde(default)]
    pub grand_total: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelerPricing {
    #[serde(default)]
    pub fare_details_by_segment: Vec<FareDetails>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FareDetails {
    #[serde(default)]
    pub included_checked_bags: Option<CheckedBags>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckedBags {
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub weight: Option<u32>,
    #[serde(default)]
    pub weight_unit: Option<String>,
}
