//! 🗺️ GeoJSON → documents, with a mapping that tells the index what a coordinate is.
//!
//! 🧠 Knowledge graph:
//! - `geo_point`: only points survive. `Point` → one doc, `MultiPoint` → one doc per point.
//!   Lines and polygons are quietly left at the border. They know what they did.
//! - `geo_shape`: everything survives, wrapped as `{type: <lowercase>, coordinates}`.
//!   A `GeometryCollection` has no coordinates of its own and travels as
//!   `{type: "geometrycollection", geometries}`. Under `geo_point` it stays home with the lines.
//! - Every doc is `{coordinates, ...properties}`. Properties win key collisions,
//!   same as a JS object spread would.
//! - Mappings: `{properties: {coordinates: {type: <field type>}}}`, one shard, empty pipeline.

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use super::TransformStrategy;
use crate::common::{IndexingDetails, empty_object};
use crate::errors::UploadError;

const POINT_TYPES: [&str; 2] = ["Point", "MultiPoint"];
const GEOMETRY_COLLECTION: &str = "GeometryCollection";

/// 📍 The two ways an index can hold geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoFieldType {
    GeoPoint,
    GeoShape,
}

impl GeoFieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeoFieldType::GeoPoint => "geo_point",
            GeoFieldType::GeoShape => "geo_shape",
        }
    }
}

impl fmt::Display for GeoFieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GeoFieldType {
    type Err = UploadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "geo_point" => Ok(GeoFieldType::GeoPoint),
            "geo_shape" => Ok(GeoFieldType::GeoShape),
            other => Err(UploadError::UnsupportedGeoFieldType(other.to_string())),
        }
    }
}

/// 🧭 Which field types can hold these geometry types, best fit first.
///
/// All points → `[geo_point, geo_shape]` (shapes can hold points too, just less snugly).
/// Anything else in the mix → `[geo_shape]`. Nothing at all → `[]`.
pub fn geo_index_types_for_features(feature_types: &[&str]) -> Vec<GeoFieldType> {
    if feature_types.is_empty() {
        Vec::new()
    } else if feature_types.iter().all(|t| POINT_TYPES.contains(t)) {
        vec![GeoFieldType::GeoPoint, GeoFieldType::GeoShape]
    } else {
        vec![GeoFieldType::GeoShape]
    }
}

/// 🗺️ The built-in `geo` transform.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoJsonTransform;

impl TransformStrategy for GeoJsonTransform {
    fn indexing_details(
        &self,
        parsed_file: &Value,
        data_type: Option<&str>,
    ) -> Result<Option<IndexingDetails>, UploadError> {
        let features = features_of(parsed_file)?;
        let geometries = features
            .iter()
            .filter_map(|feature| geometry_of(feature).transpose())
            .collect::<Result<Vec<_>, _>>()?;

        let field_type = match data_type {
            Some(requested) => requested.parse()?,
            None => {
                let types: Vec<&str> = geometries.iter().map(|geometry| geometry.kind).collect();
                // -- 🧭 no features at all still needs a mapping. shapes hold anything.
                let inferred = geo_index_types_for_features(&types)
                    .first()
                    .copied()
                    .unwrap_or(GeoFieldType::GeoShape);
                debug!("🧭 No geo field type requested, inferred '{}'", inferred);
                inferred
            }
        };

        let data = geo_json_to_docs(&geometries, field_type);
        debug!(
            "🗺️ {} features became {} {} documents",
            features.len(),
            data.len(),
            field_type
        );

        Ok(Some(IndexingDetails {
            mappings: json!({ "properties": { "coordinates": { "type": field_type.as_str() } } }),
            settings: json!({ "number_of_shards": 1 }),
            ingest_pipeline: empty_object(),
            ..IndexingDetails::from_records(data)
        }))
    }
}

/// 📐 What we read off a feature. `body` is `coordinates`, or `geometries` for a collection.
struct Geometry<'a> {
    kind: &'a str,
    body: &'a Value,
    properties: Option<&'a Map<String, Value>>,
}

fn features_of(parsed_file: &Value) -> Result<Vec<&Value>, UploadError> {
    match parsed_file.get("type").and_then(Value::as_str) {
        Some("Feature") => Ok(vec![parsed_file]),
        Some("FeatureCollection") => parsed_file
            .get("features")
            .and_then(Value::as_array)
            .map(|features| features.iter().collect())
            .ok_or_else(|| UploadError::malformed("FeatureCollection without a features array")),
        Some(other) => Err(UploadError::malformed(format!(
            "expected a Feature or FeatureCollection, found '{other}'"
        ))),
        None => Err(UploadError::malformed("not a GeoJSON document")),
    }
}

/// 🔍 `Ok(None)` for a feature with a null geometry: legal GeoJSON, nothing to index.
fn geometry_of(feature: &Value) -> Result<Option<Geometry<'_>>, UploadError> {
    let geometry = match feature.get("geometry") {
        None => return Err(UploadError::malformed("feature without a geometry member")),
        Some(Value::Null) => {
            warn!("⚠️ Skipping feature with a null geometry");
            return Ok(None);
        }
        Some(geometry) => geometry,
    };
    let kind = geometry
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| UploadError::malformed("geometry without a type"))?;
    let member = if kind == GEOMETRY_COLLECTION { "geometries" } else { "coordinates" };
    let body = geometry
        .get(member)
        .ok_or_else(|| UploadError::malformed(format!("{kind} geometry without {member}")))?;
    Ok(Some(Geometry {
        kind,
        body,
        properties: feature.get("properties").and_then(Value::as_object),
    }))
}

fn geo_json_to_docs(geometries: &[Geometry<'_>], field_type: GeoFieldType) -> Vec<Value> {
    let mut docs = Vec::with_capacity(geometries.len());
    for &Geometry { kind, body, properties } in geometries {
        match field_type {
            GeoFieldType::GeoShape => {
                let shape = if kind == GEOMETRY_COLLECTION {
                    json!({ "type": kind.to_lowercase(), "geometries": body })
                } else {
                    json!({ "type": kind.to_lowercase(), "coordinates": body })
                };
                docs.push(doc_with(shape, properties));
            }
            GeoFieldType::GeoPoint => match kind {
                "Point" => docs.push(doc_with(body.clone(), properties)),
                "MultiPoint" => {
                    for point in body.as_array().into_iter().flatten() {
                        docs.push(doc_with(point.clone(), properties));
                    }
                }
                // -- 🚪 not a point, not our problem
                _ => {}
            },
        }
    }
    docs
}

fn doc_with(coordinates: Value, properties: Option<&Map<String, Value>>) -> Value {
    let mut doc = Map::new();
    doc.insert("coordinates".to_string(), coordinates);
    if let Some(properties) = properties {
        doc.extend(properties.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    Value::Object(doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mixed_collection() -> Value {
        json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "geometry": { "type": "Point", "coordinates": [-73.98, 40.75] },
                    "properties": { "name": "Times Square" }
                },
                {
                    "type": "Feature",
                    "geometry": { "type": "MultiPoint", "coordinates": [[1.0, 2.0], [3.0, 4.0]] },
                    "properties": { "name": "twins" }
                },
                {
                    "type": "Feature",
                    "geometry": { "type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 1.0]] },
                    "properties": {}
                }
            ]
        })
    }

    #[test]
    fn the_one_where_points_fan_out_and_lines_stay_home() {
        let details = GeoJsonTransform
            .indexing_details(&mixed_collection(), Some("geo_point"))
            .unwrap()
            .unwrap();

        assert_eq!(
            details.data,
            vec![
                json!({ "coordinates": [-73.98, 40.75], "name": "Times Square" }),
                json!({ "coordinates": [1.0, 2.0], "name": "twins" }),
                json!({ "coordinates": [3.0, 4.0], "name": "twins" }),
            ]
        );
        assert_eq!(details.mappings["properties"]["coordinates"]["type"], "geo_point");
        assert_eq!(details.settings, json!({ "number_of_shards": 1 }));
        assert_eq!(details.ingest_pipeline, json!({}));
    }

    #[test]
    fn the_one_where_shapes_keep_everyone_and_lowercase_their_names() {
        let details = GeoJsonTransform
            .indexing_details(&mixed_collection(), Some("geo_shape"))
            .unwrap()
            .unwrap();

        assert_eq!(details.data.len(), 3);
        assert_eq!(details.data[2]["coordinates"]["type"], "linestring");
        assert_eq!(details.data[0]["coordinates"]["type"], "point");
        assert_eq!(details.data[0]["name"], "Times Square");
    }

    #[test]
    fn the_one_where_a_lone_feature_gets_inferred_as_a_point() {
        let feature = json!({
            "type": "Feature",
            "geometry": { "type": "Point", "coordinates": [10.0, 20.0] },
            "properties": null
        });
        let details = GeoJsonTransform.indexing_details(&feature, None).unwrap().unwrap();

        assert_eq!(details.data, vec![json!({ "coordinates": [10.0, 20.0] })]);
        assert_eq!(details.mappings["properties"]["coordinates"]["type"], "geo_point");
    }

    #[test]
    fn the_one_where_a_polygon_forces_the_shape_mapping() {
        let details = GeoJsonTransform
            .indexing_details(&mixed_collection(), None)
            .unwrap()
            .unwrap();
        assert_eq!(details.mappings["properties"]["coordinates"]["type"], "geo_shape");
    }

    #[test]
    fn the_one_where_a_geometry_collection_rides_along_as_a_shape() {
        let members = json!([
            { "type": "Point", "coordinates": [100.0, 0.0] },
            { "type": "LineString", "coordinates": [[101.0, 0.0], [102.0, 1.0]] }
        ]);
        let collection = json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "geometry": { "type": "GeometryCollection", "geometries": members },
                    "properties": { "name": "campus" }
                },
                {
                    "type": "Feature",
                    "geometry": { "type": "Point", "coordinates": [5.0, 6.0] },
                    "properties": { "name": "gate" }
                }
            ]
        });

        let shapes = GeoJsonTransform.indexing_details(&collection, None).unwrap().unwrap();
        assert_eq!(shapes.mappings["properties"]["coordinates"]["type"], "geo_shape");
        assert_eq!(
            shapes.data[0],
            json!({
                "coordinates": { "type": "geometrycollection", "geometries": members },
                "name": "campus"
            })
        );
        assert_eq!(shapes.data.len(), 2);

        let points = GeoJsonTransform
            .indexing_details(&collection, Some("geo_point"))
            .unwrap()
            .unwrap();
        assert_eq!(points.data, vec![json!({ "coordinates": [5.0, 6.0], "name": "gate" })]);
    }

    #[test]
    fn the_one_where_a_collection_without_members_is_malformed() {
        let feature = json!({
            "type": "Feature",
            "geometry": { "type": "GeometryCollection" },
            "properties": {}
        });
        let err = GeoJsonTransform
            .indexing_details(&feature, Some("geo_shape"))
            .unwrap_err();
        assert_eq!(
            err,
            UploadError::malformed("GeometryCollection geometry without geometries")
        );
    }

    #[test]
    fn the_one_where_field_type_suggestions_follow_the_geometry() {
        assert!(geo_index_types_for_features(&[]).is_empty());
        assert_eq!(
            geo_index_types_for_features(&["Point", "MultiPoint"]),
            vec![GeoFieldType::GeoPoint, GeoFieldType::GeoShape]
        );
        assert_eq!(
            geo_index_types_for_features(&["Point", "Polygon"]),
            vec![GeoFieldType::GeoShape]
        );
    }

    #[test]
    fn the_one_where_bad_inputs_are_named() {
        let err = GeoJsonTransform
            .indexing_details(&mixed_collection(), Some("geo_blob"))
            .unwrap_err();
        assert_eq!(err, UploadError::UnsupportedGeoFieldType("geo_blob".to_string()));

        let err = GeoJsonTransform
            .indexing_details(&json!({ "hello": "world" }), None)
            .unwrap_err();
        assert!(matches!(err, UploadError::MalformedFile(_)));

        let null_geometry = json!({ "type": "Feature", "geometry": null, "properties": {} });
        let details = GeoJsonTransform
            .indexing_details(&null_geometry, Some("geo_shape"))
            .unwrap()
            .unwrap();
        assert!(details.data.is_empty());
    }
}
