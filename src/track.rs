//! Reading and writing the track files handled by `simplify_track`.
//!
//! Two inputs are understood: GeoJSON (a collection of point features, or
//! a line string) and Sensor Logger JSON exports, of which only the
//! `Location` samples are used.

use std::fs;
use std::path::{Path, PathBuf};

use error_stack::Report;
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, Value};
use log::{info, warn};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value as JsonValue};

use crate::accessor::{json_number, Coordinates, CoordinateProvider, Dimensions, DirectAccessor, FeatureAccessor};
use crate::error::{SimplifyError, TrackError};
use crate::simplify::{select, Simplifier, SimplifyOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Auto,
    GeoJson,
    SensorLogger,
}

const GEOJSON_TYPES: [&str; 9] = [
    "FeatureCollection",
    "Feature",
    "Point",
    "MultiPoint",
    "LineString",
    "MultiLineString",
    "Polygon",
    "MultiPolygon",
    "GeometryCollection",
];

fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = JsonValue::deserialize(deserializer)?;
    json_number(&value).ok_or_else(|| D::Error::custom(format!("expected a number, got {}", value)))
}

fn optional_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    match Option::<JsonValue>::deserialize(deserializer)? {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::String(s)) if s.trim().is_empty() => Ok(None),
        Some(value) => json_number(&value)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("expected a number, got {}", value))),
    }
}

fn optional_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match Option::<JsonValue>::deserialize(deserializer)? {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::String(s)) => Ok(Some(s)),
        Some(other) => Ok(Some(other.to_string())),
    }
}

/// One `Location` sample of a Sensor Logger export.
///
/// Only longitude, latitude and altitude take part in simplification; the
/// remaining fields ride along and are re-keyed by the retained markers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationRecord {
    #[serde(default, deserialize_with = "optional_text")]
    pub time: Option<String>,
    #[serde(deserialize_with = "number")]
    pub longitude: f64,
    #[serde(deserialize_with = "number")]
    pub latitude: f64,
    #[serde(default, deserialize_with = "optional_number")]
    pub altitude: Option<f64>,
    #[serde(default, deserialize_with = "optional_number")]
    pub horizontal_accuracy: Option<f64>,
    #[serde(default, deserialize_with = "optional_number")]
    pub vertical_accuracy: Option<f64>,
    #[serde(default, deserialize_with = "optional_number")]
    pub speed: Option<f64>,
}

/// Reads `(longitude, latitude, altitude)` from location records. Records
/// without an altitude only provide two coordinates.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocationAccessor;

impl<C> CoordinateProvider<LocationRecord, C> for LocationAccessor {
    fn coordinates(&self, points: &[LocationRecord], index: usize, _context: &C) -> Coordinates {
        let record = &points[index];
        match record.altitude {
            Some(altitude) => Coordinates::xyz(record.longitude, record.latitude, altitude),
            None => Coordinates::xy(record.longitude, record.latitude),
        }
    }
}

/// A loaded track, in whatever representation the input file used.
#[derive(Debug, Clone, PartialEq)]
pub enum Track {
    Features(Vec<Feature>),
    Positions(Vec<Vec<f64>>),
    Locations(Vec<LocationRecord>),
}

impl Track {
    pub fn len(&self) -> usize {
        match self {
            Track::Features(features) => features.len(),
            Track::Positions(positions) => positions.len(),
            Track::Locations(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Retained indices, using the accessor that fits the representation.
    pub fn markers(
        &self,
        dimensions: Dimensions,
        options: &SimplifyOptions,
    ) -> Result<Vec<usize>, Report<SimplifyError>> {
        match self {
            Track::Features(features) => {
                Simplifier::new(dimensions, FeatureAccessor).markers(features, options, &())
            }
            Track::Positions(positions) => {
                Simplifier::new(dimensions, DirectAccessor).markers(positions, options, &())
            }
            Track::Locations(records) => {
                Simplifier::new(dimensions, LocationAccessor).markers(records, options, &())
            }
        }
    }

    /// The subsequence of this track at `markers`.
    pub fn retain(&self, markers: &[usize]) -> Track {
        match self {
            Track::Features(features) => {
                Track::Features(select(features, markers).into_iter().cloned().collect())
            }
            Track::Positions(positions) => {
                Track::Positions(select(positions, markers).into_iter().cloned().collect())
            }
            Track::Locations(records) => {
                Track::Locations(select(records, markers).into_iter().cloned().collect())
            }
        }
    }

    /// Positions along the track. Features without a point geometry are
    /// skipped; altitude is included when known.
    pub fn positions(&self) -> Vec<Vec<f64>> {
        match self {
            Track::Features(features) => features
                .iter()
                .filter_map(|f| match f.geometry.as_ref().map(|g| &g.value) {
                    Some(Value::Point(position)) => Some(position.clone()),
                    _ => None,
                })
                .collect(),
            Track::Positions(positions) => positions.clone(),
            Track::Locations(records) => records
                .iter()
                .map(|r| match r.altitude {
                    Some(altitude) => vec![r.longitude, r.latitude, altitude],
                    None => vec![r.longitude, r.latitude],
                })
                .collect(),
        }
    }

    /// The track as a feature collection: one line string feature, followed
    /// by the point features themselves when the input had them.
    ///
    /// A line string needs two positions, so shorter tracks get no line
    /// feature.
    pub fn to_feature_collection(&self, name: &str) -> FeatureCollection {
        let mut features = Vec::with_capacity(self.len() + 1);

        let positions = self.positions();
        if positions.len() >= 2 {
            let mut properties = serde_json::Map::new();
            properties.insert(String::from("name"), JsonValue::String(name.to_string()));
            properties.insert(String::from("points"), JsonValue::from(self.len()));

            features.push(Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::LineString(positions))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            });
        }

        if let Track::Features(points) = self {
            features.extend(points.iter().cloned());
        }

        FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }
}

/// Retained indices of `track` for the command-line settings.
///
/// A `tolerance` of zero or below turns simplification off and keeps every
/// point. `fast` enables the radial distance pre-pass.
pub fn simplify_markers(
    track: &Track,
    tolerance: f64,
    fast: bool,
    dimensions: Dimensions,
) -> Result<Vec<usize>, Report<SimplifyError>> {
    if tolerance.is_nan() || tolerance > 0.0 {
        let options = SimplifyOptions::new(tolerance).highest_quality(!fast);
        track.markers(dimensions, &options)
    } else {
        Ok((0..track.len()).collect())
    }
}

/// The line printed by `simplify_track --markers`.
pub fn markers_json(path: &Path, markers: &[usize]) -> JsonValue {
    json!({"file": path.display().to_string(), "markers": markers})
}

/// Writes the simplified `kept` track next to `input` (or into `out_dir`)
/// and returns the files written.
///
/// With `csv` set, Sensor Logger records are also written as CSV; other
/// inputs have no records to write and are skipped with a warning.
pub fn write_simplified(
    kept: &Track,
    input: &Path,
    out_dir: Option<&Path>,
    csv: bool,
) -> Result<Vec<PathBuf>, Report<TrackError>> {
    let name = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let geojson = output_path(input, out_dir, "geojson");
    write_geojson(kept, &name, &geojson)?;
    let mut written = vec![geojson];

    if csv {
        match kept {
            Track::Locations(records) => {
                let path = output_path(input, out_dir, "csv");
                write_csv(records, &path)?;
                written.push(path);
            }
            _ => warn!("{}: --csv only applies to Sensor Logger input", input.display()),
        }
    }

    Ok(written)
}

fn read_error(path: &Path) -> impl FnOnce(std::io::Error) -> Report<TrackError> + '_ {
    move |e| {
        Report::new(e)
            .change_context(TrackError::Read)
            .attach_printable(format!("path: {}", path.display()))
    }
}

fn parse_error(path: &Path) -> impl FnOnce(serde_json::Error) -> Report<TrackError> + '_ {
    move |e| {
        Report::new(e)
            .change_context(TrackError::Parse)
            .attach_printable(format!("path: {}", path.display()))
    }
}

fn looks_like_geojson(value: &JsonValue) -> bool {
    value
        .get("type")
        .and_then(JsonValue::as_str)
        .map(|t| GEOJSON_TYPES.contains(&t))
        .unwrap_or(false)
}

fn line_string(geometry: Option<&Geometry>) -> Option<Vec<Vec<f64>>> {
    match geometry.map(|g| &g.value) {
        Some(Value::LineString(positions)) => Some(positions.clone()),
        _ => None,
    }
}

fn type_name(geometry: Option<&Geometry>) -> String {
    let name = match geometry.map(|g| &g.value) {
        None => "null geometry",
        Some(Value::Point(_)) => "Point",
        Some(Value::MultiPoint(_)) => "MultiPoint",
        Some(Value::LineString(_)) => "LineString",
        Some(Value::MultiLineString(_)) => "MultiLineString",
        Some(Value::Polygon(_)) => "Polygon",
        Some(Value::MultiPolygon(_)) => "MultiPolygon",
        Some(Value::GeometryCollection(_)) => "GeometryCollection",
    };
    name.to_string()
}

/// Interprets a GeoJSON document as a track.
///
/// A feature collection holding a line string yields its positions (the
/// first one, if there are several); otherwise it must hold point features.
/// A single line string feature or geometry also works.
pub fn track_from_geojson(geojson: GeoJson) -> Result<Track, Report<TrackError>> {
    match geojson {
        GeoJson::FeatureCollection(collection) => {
            let lines: Vec<Vec<Vec<f64>>> = collection
                .features
                .iter()
                .filter_map(|f| line_string(f.geometry.as_ref()))
                .collect();

            if let Some(first) = lines.into_iter().next() {
                return Ok(Track::Positions(first));
            }

            if let Some(other) = collection.features.iter().find(|f| {
                !matches!(f.geometry.as_ref().map(|g| &g.value), Some(Value::Point(_)))
            }) {
                return Err(Report::new(TrackError::UnsupportedGeoJson(type_name(
                    other.geometry.as_ref(),
                ))));
            }

            Ok(Track::Features(collection.features))
        }
        GeoJson::Feature(feature) => line_string(feature.geometry.as_ref())
            .map(Track::Positions)
            .ok_or_else(|| {
                Report::new(TrackError::UnsupportedGeoJson(type_name(feature.geometry.as_ref())))
            }),
        GeoJson::Geometry(geometry) => line_string(Some(&geometry))
            .map(Track::Positions)
            .ok_or_else(|| Report::new(TrackError::UnsupportedGeoJson(type_name(Some(&geometry))))),
    }
}

/// Extracts the `Location` samples of a Sensor Logger export.
///
/// Both the raw export (an array of samples tagged with `sensor`) and the
/// grouped form (an object keyed by sensor name) are accepted. Samples that
/// fail to parse are skipped with a warning.
pub fn locations_from_sensor_logger(value: &JsonValue) -> Result<Vec<LocationRecord>, Report<TrackError>> {
    let samples: Vec<&JsonValue> = match value {
        JsonValue::Array(samples) => samples
            .iter()
            .filter(|s| s.get("sensor").and_then(JsonValue::as_str) == Some("Location"))
            .collect(),
        JsonValue::Object(groups) => match groups.get("Location") {
            Some(JsonValue::Array(samples)) => samples.iter().collect(),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    let mut records = Vec::with_capacity(samples.len());
    for sample in samples {
        match LocationRecord::deserialize(sample) {
            Ok(record) => records.push(record),
            Err(e) => warn!("skipping location sample {}: {}", sample, e),
        }
    }

    if records.is_empty() {
        return Err(Report::new(TrackError::Parse)
            .attach_printable("no usable Location samples"));
    }

    Ok(records)
}

/// Loads a track file.
pub fn read_track(path: &Path, format: InputFormat) -> Result<Track, Report<TrackError>> {
    let text = fs::read_to_string(path).map_err(read_error(path))?;
    let value: JsonValue = serde_json::from_str(&text).map_err(parse_error(path))?;

    let format = match format {
        InputFormat::Auto if looks_like_geojson(&value) => InputFormat::GeoJson,
        InputFormat::Auto => InputFormat::SensorLogger,
        explicit => explicit,
    };

    let track = match format {
        InputFormat::GeoJson => {
            let geojson: GeoJson = serde_json::from_value(value).map_err(parse_error(path))?;
            track_from_geojson(geojson)
        }
        _ => locations_from_sensor_logger(&value).map(Track::Locations),
    }
    .map_err(|e| e.attach_printable(format!("path: {}", path.display())))?;

    info!("read {} points from {}", track.len(), path.display());
    Ok(track)
}

/// `<dir>/<stem>_simplified.<extension>`, where `dir` defaults to the
/// directory of `input`.
pub fn output_path(input: &Path, out_dir: Option<&Path>, extension: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| String::from("track"));
    let dir = out_dir
        .map(Path::to_path_buf)
        .or_else(|| input.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    dir.join(format!("{}_simplified.{}", stem, extension))
}

fn write_error(path: &Path) -> impl FnOnce(Report<TrackError>) -> Report<TrackError> + '_ {
    move |e| e.attach_printable(format!("path: {}", path.display()))
}

pub fn write_geojson(track: &Track, name: &str, path: &Path) -> Result<(), Report<TrackError>> {
    let collection = track.to_feature_collection(name);
    let text = serde_json::to_string_pretty(&collection)
        .map_err(|e| Report::new(e).change_context(TrackError::Write))
        .map_err(write_error(path))?;

    fs::write(path, text)
        .map_err(|e| Report::new(e).change_context(TrackError::Write))
        .map_err(write_error(path))?;

    info!("wrote {} ({} points)", path.display(), track.len());
    Ok(())
}

pub fn write_csv(records: &[LocationRecord], path: &Path) -> Result<(), Report<TrackError>> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| Report::new(e).change_context(TrackError::Write))
        .map_err(write_error(path))?;

    for record in records {
        writer
            .serialize(record)
            .map_err(|e| Report::new(e).change_context(TrackError::Write))
            .map_err(write_error(path))?;
    }

    writer
        .flush()
        .map_err(|e| Report::new(e).change_context(TrackError::Write))
        .map_err(write_error(path))?;

    info!("wrote {} ({} records)", path.display(), records.len());
    Ok(())
}
