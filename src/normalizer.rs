use crate::api::types::{CarrierLookup, RawOffer};
use crate::model::{FlatRecord, MalformedOfferError, SearchContext};
use crate::utils::format_timestamp;

/// Normalizes a whole search batch in arrival order. Fails on the first
/// malformed offer so the caller appends either every record or none.
pub fn normalize_all(
    offers: &[RawOffer],
    carriers: &CarrierLookup,
    ctx: &SearchContext,
) -> Result<Vec<FlatRecord>, MalformedOfferError> {
    offers
        .iter()
        .map(|offer| normalize_offer(offer, carriers, ctx))
        .collect()
}

/// Flattens one offer into a record. The first itinerary's first segment
/// supplies departure info and its last segment arrival info, so a multi-stop
/// connection collapses to a single origin → final-destination span.
pub fn normalize_offer(
    offer: &RawOffer,
    carriers: &CarrierLookup,
    ctx: &SearchContext,
) -> Result<FlatRecord, MalformedOfferError> {
    let itinerary = offer
        .itineraries
        .first()
        .ok_or(MalformedOfferError::EmptyField("itineraries"))?;
    let first = itinerary
        .segments
        .first()
        .ok_or(MalformedOfferError::EmptyField("segments"))?;
    let last = itinerary
        .segments
        .last()
        .ok_or(MalformedOfferError::EmptyField("segments"))?;

    let departure = first
        .departure
        .as_ref()
        .ok_or(MalformedOfferError::MissingField("departure"))?;
    let arrival = last
        .arrival
        .as_ref()
        .ok_or(MalformedOfferError::MissingField("arrival"))?;

    let carrier_code = first
        .carrier_code
        .as_deref()
        .ok_or(MalformedOfferError::MissingField("carrierCode"))?;
    let number = first
        .number
        .as_deref()
        .ok_or(MalformedOfferError::MissingField("number"))?;

    let airline = carriers
        .get(carrier_code)
        .cloned()
        .unwrap_or_else(|| carrier_code.to_string());

    let price = offer
        .price
        .as_ref()
        .ok_or(MalformedOfferError::MissingField("price"))?;

    Ok(FlatRecord {
        logged_at: format_timestamp(&ctx.logged_at),
        search_date: ctx.search_date.to_string(),
        origin: ctx.origin.clone(),
        destination: ctx.destination.clone(),
        dep_airport: departure
            .iata_code
            .clone()
            .ok_or(MalformedOfferError::MissingField("departure.iataCode"))?,
        dep_time: departure
            .at
            .clone()
            .ok_or(MalformedOfferError::MissingField("departure.at"))?,
        arr_airport: arrival
            .iata_code
            .clone()
            .ok_or(MalformedOfferError::MissingField("arrival.iataCode"))?,
        arr_time: arrival
            .at
            .clone()
            .ok_or(MalformedOfferError::MissingField("arrival.at"))?,
        airline,
        flight_no: format!("{carrier_code}{number}"),
        stops: (itinerary.segments.len() - 1) as u32,
        duration: itinerary.duration.clone().unwrap_or_default(),
        price_total: price
            .grand_total
            .clone()
            .ok_or(MalformedOfferError::MissingField("price.grandTotal"))?,
        currency: price
            .currency
            .clone()
            .ok_or(MalformedOfferError::MissingField("price.currency"))?,
        baggage: baggage_allowance(offer),
    })
}

/// First checked-bag allowance found across traveler pricings, in order.
/// First match wins; an entry with neither a quantity nor a weight+unit pair
/// is skipped and scanning continues.
fn baggage_allowance(offer: &RawOffer) -> String {
    for pricing in &offer.traveler_pricings {
        for fare in &pricing.fare_details_by_segment {
            let Some(bags) = &fare.included_checked_bags else {
                continue;
            };
            if let Some(quantity) = bags.quantity {
                return format!("Checked x{quantity}");
            }
            if let (Some(weight), Some(unit)) = (bags.weight, bags.weight_unit.as_deref()) {
                return format!("Checked {weight}{unit}");
            }
        }
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, NaiveDate, TimeZone};
    use serde_json::json;

    fn ctx() -> SearchContext {
        SearchContext {
            logged_at: Local.with_ymd_and_hms(2026, 8, 7, 9, 30, 0).unwrap(),
            search_date: NaiveDate::from_ymd_opt(2026, 8, 7).unwrap(),
            origin: "ICN".to_string(),
            destination: "NRT".to_string(),
        }
    }

    fn segment(dep: &str, dep_at: &str, arr: &str, arr_at: &str) -> serde_json::Value {
        json!({
            "departure": { "iataCode": dep, "at": dep_at },
            "arrival": { "iataCode": arr, "at": arr_at },
            "carrierCode": "7C",
            "number": "1106"
        })
    }

    fn offer_with_segments(segments: Vec<serde_json::Value>) -> RawOffer {
        serde_json::from_value(json!({
            "itineraries": [ { "duration": "PT2H25M", "segments": segments } ],
            "price": { "grandTotal": "98500.00", "currency": "KRW" }
        }))
        .unwrap()
    }

    fn nonstop_offer() -> RawOffer {
        offer_with_segments(vec![segment(
            "ICN",
            "2026-08-07T10:30:00",
            "NRT",
            "2026-08-07T12:55:00",
        )])
    }

    #[test]
    fn nonstop_flight_has_zero_stops() {
        let record = normalize_offer(&nonstop_offer(), &CarrierLookup::new(), &ctx()).unwrap();
        assert_eq!(record.stops, 0);
        assert_eq!(record.dep_airport, "ICN");
        assert_eq!(record.arr_airport, "NRT");
        assert_eq!(record.flight_no, "7C1106");
        assert_eq!(record.duration, "PT2H25M");
        assert_eq!(record.price_total, "98500.00");
        assert_eq!(record.currency, "KRW");
        assert_eq!(record.logged_at, "2026-08-07 09:30:00");
        assert_eq!(record.search_date, "2026-08-07");
    }

    #[test]
    fn stops_equal_segment_count_minus_one() {
        for (count, expected) in [(1usize, 0u32), (2, 1), (3, 2)] {
            let segments = (0..count)
                .map(|_| segment("ICN", "2026-08-07T10:30:00", "NRT", "2026-08-07T18:00:00"))
                .collect();
            let record =
                normalize_offer(&offer_with_segments(segments), &CarrierLookup::new(), &ctx())
                    .unwrap();
            assert_eq!(record.stops, expected);
        }
    }

    #[test]
    fn connection_spans_first_departure_to_last_arrival() {
        let offer = offer_with_segments(vec![
            segment("ICN", "2026-08-07T10:30:00", "FUK", "2026-08-07T12:00:00"),
            segment("FUK", "2026-08-07T14:00:00", "NRT", "2026-08-07T15:45:00"),
        ]);
        let record = normalize_offer(&offer, &CarrierLookup::new(), &ctx()).unwrap();
        assert_eq!(record.dep_airport, "ICN");
        assert_eq!(record.dep_time, "2026-08-07T10:30:00");
        assert_eq!(record.arr_airport, "NRT");
        assert_eq!(record.arr_time, "2026-08-07T15:45:00");
        assert_eq!(record.stops, 1);
    }

    #[test]
    fn airline_resolves_through_lookup() {
        let mut carriers = CarrierLookup::new();
        carriers.insert("7C".to_string(), "JEJU AIR".to_string());
        let record = normalize_offer(&nonstop_offer(), &carriers, &ctx()).unwrap();
        assert_eq!(record.airline, "JEJU AIR");
    }

    #[test]
    fn airline_falls_back_to_raw_code() {
        let record = normalize_offer(&nonstop_offer(), &CarrierLookup::new(), &ctx()).unwrap();
        assert_eq!(record.airline, "7C");
    }

    #[test]
    fn baggage_takes_first_match_across_pricings() {
        let offer: RawOffer = serde_json::from_value(json!({
            "itineraries": [ { "duration": "PT2H25M", "segments": [
                segment("ICN", "2026-08-07T10:30:00", "NRT", "2026-08-07T12:55:00")
            ] } ],
            "price": { "grandTotal": "98500.00", "currency": "KRW" },
            "travelerPricings": [
                { "fareDetailsBySegment": [ {} ] },
                { "fareDetailsBySegment": [
                    { "includedCheckedBags": { "quantity": 2 } },
                    { "includedCheckedBags": { "quantity": 1 } }
                ] }
            ]
        }))
        .unwrap();

        let record = normalize_offer(&offer, &CarrierLookup::new(), &ctx()).unwrap();
        assert_eq!(record.baggage, "Checked x2");
    }

    #[test]
    fn baggage_formats_weight_when_quantity_absent() {
        let offer: RawOffer = serde_json::from_value(json!({
            "itineraries": [ { "segments": [
                segment("ICN", "2026-08-07T10:30:00", "NRT", "2026-08-07T12:55:00")
            ] } ],
            "price": { "grandTotal": "98500.00", "currency": "KRW" },
            "travelerPricings": [
                { "fareDetailsBySegment": [
                    { "includedCheckedBags": { "weight": 15, "weightUnit": "KG" } }
                ] }
            ]
        }))
        .unwrap();

        let record = normalize_offer(&offer, &CarrierLookup::new(), &ctx()).unwrap();
        assert_eq!(record.baggage, "Checked 15KG");
    }

    #[test]
    fn baggage_empty_when_no_pricing_carries_bags() {
        let record = normalize_offer(&nonstop_offer(), &CarrierLookup::new(), &ctx()).unwrap();
        assert_eq!(record.baggage, "");
    }

    #[test]
    fn duration_defaults_to_empty_string() {
        let offer: RawOffer = serde_json::from_value(json!({
            "itineraries": [ { "segments": [
                segment("ICN", "2026-08-07T10:30:00", "NRT", "2026-08-07T12:55:00")
            ] } ],
            "price": { "grandTotal": "98500.00", "currency": "KRW" }
        }))
        .unwrap();

        let record = normalize_offer(&offer, &CarrierLookup::new(), &ctx()).unwrap();
        assert_eq!(record.duration, "");
    }

    #[test]
    fn missing_itineraries_is_malformed() {
        let offer: RawOffer = serde_json::from_value(json!({
            "price": { "grandTotal": "98500.00", "currency": "KRW" }
        }))
        .unwrap();

        let err = normalize_offer(&offer, &CarrierLookup::new(), &ctx()).unwrap_err();
        assert_eq!(err, MalformedOfferError::EmptyField("itineraries"));
    }

    #[test]
    fn missing_price_is_malformed() {
        let offer: RawOffer = serde_json::from_value(json!({
            "itineraries": [ { "segments": [
                segment("ICN", "2026-08-07T10:30:00", "NRT", "2026-08-07T12:55:00")
            ] } ]
        }))
        .unwrap();

        let err = normalize_offer(&offer, &CarrierLookup::new(), &ctx()).unwrap_err();
        assert_eq!(err, MalformedOfferError::MissingField("price"));
    }

    #[test]
    fn one_bad_offer_fails_the_whole_batch() {
        let bad: RawOffer = serde_json::from_value(json!({})).unwrap();
        let offers = vec![nonstop_offer(), bad];
        assert!(normalize_all(&offers, &CarrierLookup::new(), &ctx()).is_err());
    }

    #[test]
    fn batch_preserves_offer_order() {
        let mut second = nonstop_offer();
        second.price = Some(serde_json::from_value(json!({
            "grandTotal": "120000.00", "currency": "KRW"
        })).unwrap());

        let records =
            normalize_all(&[nonstop_offer(), second], &CarrierLookup::new(), &ctx()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].price_total, "98500.00");
        assert_eq!(records[1].price_total, "120000.00");
    }
}
