//! Turn a GeoJSON feed document into canonical earthquake records.
//!
//! A feed document looks like:
//!
//! ```json
//! {
//!   "type": "FeatureCollection",
//!   "features": [
//!     {
//!       "id": "us7000abcd",
//!       "properties": {"place": "10 km N of Somewhere", "mag": 4.6, "tsunami": 0, "time": 1744363492000},
//!       "geometry": {"type": "Point", "coordinates": [-122.816, 38.831, 1.55]}
//!     }
//!   ]
//! }
//! ```
//!
//! Coordinates are `[longitude, latitude, depth]`.
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::warn;

use crate::error::NormalizeError;
use crate::types::{EarthquakeRecord, NormalizedFeed, RejectedEntry};

/// Normalize every feature entry of a feed document.
///
/// A document without a `features` list normalizes to an empty feed. Entries
/// that fail to normalize are skipped and reported in `rejected`; they never
/// prevent the rest of the document from being normalized.
pub fn normalize(document: &Value) -> NormalizedFeed {
    let Some(features) = document.get("features").and_then(Value::as_array) else {
        return NormalizedFeed::default();
    };

    let mut feed = NormalizedFeed {
        records: Vec::with_capacity(features.len()),
        rejected: Vec::new(),
    };

    for (index, feature) in features.iter().enumerate() {
        match normalize_feature(feature) {
            Ok(record) => feed.records.push(record),
            Err(error) => {
                let id = feature.get("id").and_then(Value::as_str).map(str::to_owned);
                warn!(index, id = ?id, "skipping feature entry: {}", error);
                feed.rejected.push(RejectedEntry { index, id, error });
            }
        }
    }

    feed
}

/// Normalize a single feature entry.
pub fn normalize_feature(feature: &Value) -> Result<EarthquakeRecord, NormalizeError> {
    if !feature.is_object() {
        return Err(NormalizeError::NotAnObject);
    }

    let id = required(feature, "/id", "id")?
        .as_str()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| invalid("id", "expected a non-empty string"))?
        .to_owned();

    let place = match feature.pointer("/properties/place") {
        None => return Err(NormalizeError::MissingField("properties.place")),
        Some(Value::Null) => String::new(),
        Some(Value::String(place)) => place.clone(),
        Some(_) => return Err(invalid("properties.place", "expected a string")),
    };

    let magnitude = number(feature, "/properties/mag", "properties.mag")?;

    let coordinates = required(feature, "/geometry/coordinates", "geometry.coordinates")?
        .as_array()
        .ok_or_else(|| invalid("geometry.coordinates", "expected an array"))?;
    if coordinates.len() < 3 {
        return Err(invalid(
            "geometry.coordinates",
            &format!(
                "expected [lon, lat, depth], got {} values",
                coordinates.len()
            ),
        ));
    }
    let coordinate = |position: usize| {
        coordinates[position]
            .as_f64()
            .ok_or_else(|| invalid("geometry.coordinates", "expected numbers"))
    };
    let longitude = coordinate(0)?;
    let latitude = coordinate(1)?;
    let depth = coordinate(2)?;

    let tsunami = required(feature, "/properties/tsunami", "properties.tsunami")?
        .as_i64()
        .ok_or_else(|| invalid("properties.tsunami", "expected an integer"))?;

    let millis = required(feature, "/properties/time", "properties.time")?
        .as_i64()
        .ok_or_else(|| invalid("properties.time", "expected epoch milliseconds"))?;
    let occurred_at = DateTime::<Utc>::from_timestamp_millis(millis)
        .ok_or_else(|| invalid("properties.time", "timestamp out of range"))?;

    Ok(EarthquakeRecord {
        id,
        place,
        magnitude,
        depth,
        latitude,
        longitude,
        tsunami_flag: tsunami == 1,
        occurred_at,
    })
}

// A JSON null counts as missing.
fn required<'a>(
    feature: &'a Value,
    pointer: &str,
    field: &'static str,
) -> Result<&'a Value, NormalizeError> {
    match feature.pointer(pointer) {
        None | Some(Value::Null) => Err(NormalizeError::MissingField(field)),
        Some(value) => Ok(value),
    }
}

fn number(feature: &Value, pointer: &str, field: &'static str) -> Result<f64, NormalizeError> {
    required(feature, pointer, field)?
        .as_f64()
        .ok_or_else(|| invalid(field, "expected a number"))
}

fn invalid(field: &'static str, reason: &str) -> NormalizeError {
    NormalizeError::InvalidField {
        field,
        reason: reason.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn feature(id: &str, mag: f64, tsunami: i64, coordinates: Value) -> Value {
        json!({
            "type": "Feature",
            "id": id,
            "properties": {"place": "Atlantic Ocean", "mag": mag, "tsunami": tsunami, "time": 1744363492000i64},
            "geometry": {"type": "Point", "coordinates": coordinates}
        })
    }

    #[test]
    fn test_normalize_extracts_fields() {
        let document = json!({
            "features": [{
                "id": "t1",
                "properties": {"place": "X", "mag": 3.5, "tsunami": 1, "time": 189876532456i64},
                "geometry": {"coordinates": [7, 8, 9]}
            }]
        });

        let feed = normalize(&document);

        assert!(feed.rejected.is_empty());
        assert_eq!(
            feed.records,
            vec![EarthquakeRecord {
                id: "t1".to_owned(),
                place: "X".to_owned(),
                magnitude: 3.5,
                depth: 9.0,
                latitude: 8.0,
                longitude: 7.0,
                tsunami_flag: true,
                occurred_at: Utc.timestamp_millis_opt(189876532456).unwrap(),
            }]
        );
    }

    #[test]
    fn test_coordinates_are_lon_lat_depth() {
        let document = json!({
            "features": [feature("us1", 4.6, 0, json!([-122.816, 38.831, 1.55]))]
        });

        let record = &normalize(&document).records[0];

        assert_eq!(record.longitude, -122.816);
        assert_eq!(record.latitude, 38.831);
        assert_eq!(record.depth, 1.55);
    }

    #[test]
    fn test_tsunami_flag_is_true_only_for_one() {
        for (source, expected) in [(0, false), (1, true), (2, false), (-1, false)] {
            let record =
                normalize_feature(&feature("t", 1.0, source, json!([0.0, 0.0, 0.0]))).unwrap();
            assert_eq!(record.tsunami_flag, expected, "tsunami = {source}");
        }
    }

    #[test]
    fn test_timestamp_keeps_millisecond_precision() {
        let record = normalize_feature(&feature("t", 1.0, 0, json!([0, 0, 0]))).unwrap();

        assert_eq!(record.occurred_at.timestamp(), 1744363492);
        assert_eq!(record.occurred_at.timestamp_subsec_millis(), 0);

        let mut entry = feature("t", 1.0, 0, json!([0, 0, 0]));
        entry["properties"]["time"] = json!(1744363492123i64);
        let record = normalize_feature(&entry).unwrap();
        assert_eq!(record.occurred_at.timestamp_subsec_millis(), 123);
    }

    #[test]
    fn test_missing_feature_collection_is_empty() {
        assert_eq!(normalize(&json!({})), NormalizedFeed::default());
        assert_eq!(
            normalize(&json!({"type": "FeatureCollection", "metadata": {}})),
            NormalizedFeed::default()
        );
        assert_eq!(
            normalize(&json!({"features": {"not": "a list"}})),
            NormalizedFeed::default()
        );
        assert_eq!(normalize(&json!([])), NormalizedFeed::default());
        assert_eq!(
            normalize(&json!({"features": []})),
            NormalizedFeed::default()
        );
    }

    #[test]
    fn test_malformed_entry_is_skipped() {
        let mut no_magnitude = feature("bad", 2.0, 0, json!([1, 2, 3]));
        no_magnitude["properties"]
            .as_object_mut()
            .unwrap()
            .remove("mag");

        let document = json!({
            "features": [
                feature("first", 1.0, 0, json!([1, 2, 3])),
                no_magnitude,
                feature("third", 3.0, 0, json!([1, 2, 3])),
            ]
        });

        let feed = normalize(&document);

        let ids: Vec<_> = feed.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "third"]);
        assert_eq!(
            feed.rejected,
            vec![RejectedEntry {
                index: 1,
                id: Some("bad".to_owned()),
                error: NormalizeError::MissingField("properties.mag"),
            }]
        );
        assert_eq!(feed.total_entries(), 3);
    }

    #[test]
    fn test_required_field_errors() {
        let base = feature("t", 1.0, 0, json!([1, 2, 3]));

        let mut entry = base.clone();
        entry["properties"]["mag"] = Value::Null;
        assert_eq!(
            normalize_feature(&entry),
            Err(NormalizeError::MissingField("properties.mag"))
        );

        let mut entry = base.clone();
        entry.as_object_mut().unwrap().remove("id");
        assert_eq!(
            normalize_feature(&entry),
            Err(NormalizeError::MissingField("id"))
        );

        let mut entry = base.clone();
        entry["id"] = json!("");
        assert!(matches!(
            normalize_feature(&entry),
            Err(NormalizeError::InvalidField { field: "id", .. })
        ));

        let mut entry = base.clone();
        entry["geometry"]["coordinates"] = json!([1, 2]);
        assert!(matches!(
            normalize_feature(&entry),
            Err(NormalizeError::InvalidField {
                field: "geometry.coordinates",
                ..
            })
        ));

        let mut entry = base.clone();
        entry["geometry"]["coordinates"] = json!([1, "north", 3]);
        assert!(matches!(
            normalize_feature(&entry),
            Err(NormalizeError::InvalidField {
                field: "geometry.coordinates",
                ..
            })
        ));

        let mut entry = base.clone();
        entry.as_object_mut().unwrap().remove("geometry");
        assert_eq!(
            normalize_feature(&entry),
            Err(NormalizeError::MissingField("geometry.coordinates"))
        );

        let mut entry = base.clone();
        entry["properties"]["tsunami"] = json!("yes");
        assert!(matches!(
            normalize_feature(&entry),
            Err(NormalizeError::InvalidField {
                field: "properties.tsunami",
                ..
            })
        ));

        let mut entry = base.clone();
        entry["properties"]["time"] = json!("2025-04-11T09:24:52Z");
        assert!(matches!(
            normalize_feature(&entry),
            Err(NormalizeError::InvalidField {
                field: "properties.time",
                ..
            })
        ));

        assert_eq!(
            normalize_feature(&json!("not an object")),
            Err(NormalizeError::NotAnObject)
        );
    }

    #[test]
    fn test_null_place_is_empty() {
        let mut entry = feature("t", 1.0, 0, json!([1, 2, 3]));
        entry["properties"]["place"] = Value::Null;
        assert_eq!(normalize_feature(&entry).unwrap().place, "");

        entry["properties"].as_object_mut().unwrap().remove("place");
        assert_eq!(
            normalize_feature(&entry),
            Err(NormalizeError::MissingField("properties.place"))
        );
    }

    #[test]
    fn test_duplicates_and_order_are_preserved() {
        let document = json!({
            "features": [
                feature("b", 1.0, 0, json!([1, 2, 3])),
                feature("a", 2.0, 0, json!([1, 2, 3])),
                feature("b", 3.0, 0, json!([1, 2, 3])),
            ]
        });

        let feed = normalize(&document);

        let seen: Vec<_> = feed
            .records
            .iter()
            .map(|r| (r.id.as_str(), r.magnitude))
            .collect();
        assert_eq!(seen, vec![("b", 1.0), ("a", 2.0), ("b", 3.0)]);
    }
}
