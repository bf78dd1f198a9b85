//! Wire types for the tile-set and observation API.
//!
//! This module defines:
//! - Tile-set metadata (`GET /api/tiles/metadata?version=N`)
//! - Observations (`GET /api/observations`)
//! - Location patches (`PATCH /api/observations/{id}/location`)
//! - Tile coordinates and row-order schemes used to address tile images
//!
//! Metadata is decoded into a raw wire struct first and then validated, so
//! a payload that parses but breaks an invariant never reaches the viewer.

use foundation::{BoundsError, MERCATOR_HALF_EXTENT, ProjectedBounds};
use serde::{Deserialize, Serialize};

use crate::template::{TemplateError, UrlTemplate};

/// Tile-set version selector value (`?version=`).
pub type MapVersion = u32;

/// Backend-assigned observation id.
pub type ObservationId = i64;

/// Deepest native level a tile set may declare.
pub const MAX_NATIVE_ZOOM: u8 = 30;

/// Deepest display level. Columns and rows at this level still fit in `u32`.
pub const MAX_DISPLAY_ZOOM: u8 = 32;

/// Tile coordinate in ZXY scheme (row 0 is the northernmost row).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl TileCoord {
    pub fn new(z: u8, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// Number of tiles along one axis at zoom `z`.
    pub fn tiles_per_axis(z: u8) -> u64 {
        1u64 << z
    }

    pub fn is_valid(&self) -> bool {
        let n = Self::tiles_per_axis(self.z);
        (self.x as u64) < n && (self.y as u64) < n
    }

    /// Row index counted from the south (TMS).
    pub fn tms_y(&self) -> u32 {
        (Self::tiles_per_axis(self.z) - 1 - self.y as u64) as u32
    }

    /// Row index for the given scheme.
    pub fn row(&self, scheme: TileScheme) -> u32 {
        match scheme {
            TileScheme::Xyz => self.y,
            TileScheme::Tms => self.tms_y(),
        }
    }

    /// Extent of this tile in Web Mercator meters.
    pub fn mercator_bounds(&self) -> ProjectedBounds {
        let size = tile_span_m(self.z);
        let min_x = -MERCATOR_HALF_EXTENT + self.x as f64 * size;
        let max_y = MERCATOR_HALF_EXTENT - self.y as f64 * size;
        ProjectedBounds::new(min_x, max_y - size, min_x + size, max_y)
    }

    /// Tiles at zoom `z` intersecting `bounds`, row-major from the north-west.
    pub fn covering(bounds: &ProjectedBounds, z: u8) -> Vec<TileCoord> {
        let size = tile_span_m(z);
        let last = Self::tiles_per_axis(z) as i64 - 1;
        let col = |mx: f64| (((mx + MERCATOR_HALF_EXTENT) / size).floor() as i64).clamp(0, last);
        let row = |my: f64| (((MERCATOR_HALF_EXTENT - my) / size).floor() as i64).clamp(0, last);

        // Upper edges are exclusive so a box ending on a tile seam does not pull
        // in the neighbour.
        let x0 = col(bounds.min_x);
        let x1 = col(bounds.max_x - size * 1e-9).max(x0);
        let y0 = row(bounds.max_y);
        let y1 = row(bounds.min_y + size * 1e-9).max(y0);

        let mut out = Vec::with_capacity(((x1 - x0 + 1) * (y1 - y0 + 1)) as usize);
        for y in y0..=y1 {
            for x in x0..=x1 {
                out.push(TileCoord::new(z, x as u32, y as u32));
            }
        }
        out
    }

}

fn tile_span_m(z: u8) -> f64 {
    2.0 * MERCATOR_HALF_EXTENT / TileCoord::tiles_per_axis(z) as f64
}

/// Row order used by a tile server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileScheme {
    /// Row 0 at the north (slippy-map convention).
    #[default]
    Xyz,
    /// Row 0 at the south.
    Tms,
}

/// Projected bounding box as sent on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl From<WireBounds> for ProjectedBounds {
    fn from(b: WireBounds) -> Self {
        ProjectedBounds::new(b.min_x, b.min_y, b.max_x, b.max_y)
    }
}

impl From<ProjectedBounds> for WireBounds {
    fn from(b: ProjectedBounds) -> Self {
        WireBounds {
            min_x: b.min_x,
            min_y: b.min_y,
            max_x: b.max_x,
            max_y: b.max_y,
        }
    }
}

/// Tile-set descriptor exactly as the backend sends it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileSetMetadataWire {
    pub min_zoom: u8,
    pub max_zoom: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tile_url_template: Option<String>,
    pub bounds: WireBounds,
    /// Row order for `{y}`; `{-y}` is always TMS.
    #[serde(default)]
    pub tms: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subdomains: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MetadataError {
    /// A required field is absent or empty. Unrecoverable for this fetch.
    MissingField(&'static str),
    InvalidZoomRange { min: u8, max: u8 },
    /// `maxZoom` is deeper than [`MAX_NATIVE_ZOOM`].
    ZoomOutOfRange { max: u8 },
    InvalidBounds(BoundsError),
    InvalidTemplate(TemplateError),
    Json(String),
}

impl std::fmt::Display for MetadataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetadataError::MissingField(name) => write!(f, "metadata missing required field `{name}`"),
            MetadataError::InvalidZoomRange { min, max } => {
                write!(f, "metadata zoom range inverted: minZoom={min} maxZoom={max}")
            }
            MetadataError::ZoomOutOfRange { max } => {
                write!(f, "metadata maxZoom={max} exceeds the supported maximum {MAX_NATIVE_ZOOM}")
            }
            MetadataError::InvalidBounds(e) => write!(f, "metadata bounds invalid: {e}"),
            MetadataError::InvalidTemplate(e) => write!(f, "metadata tile template invalid: {e}"),
            MetadataError::Json(msg) => write!(f, "metadata is not valid JSON: {msg}"),
        }
    }
}

impl std::error::Error for MetadataError {}

/// Validated tile-set descriptor. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct TileSetMetadata {
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub template: UrlTemplate,
    pub bounds: ProjectedBounds,
    pub attribution: Option<String>,
}

impl TileSetMetadata {
    pub fn from_json(body: &str) -> Result<Self, MetadataError> {
        let wire: TileSetMetadataWire =
            serde_json::from_str(body).map_err(|e| MetadataError::Json(e.to_string()))?;
        Self::try_from(wire)
    }

    pub fn scheme(&self) -> TileScheme {
        self.template.scheme()
    }

    pub fn to_wire(&self) -> TileSetMetadataWire {
        TileSetMetadataWire {
            min_zoom: self.min_zoom,
            max_zoom: self.max_zoom,
            tile_url_template: Some(self.template.as_str().to_string()),
            bounds: self.bounds.into(),
            tms: self.scheme() == TileScheme::Tms,
            subdomains: self.template.subdomains().to_vec(),
            attribution: self.attribution.clone(),
        }
    }
}

impl TryFrom<TileSetMetadataWire> for TileSetMetadata {
    type Error = MetadataError;

    fn try_from(wire: TileSetMetadataWire) -> Result<Self, Self::Error> {
        let raw = wire
            .tile_url_template
            .filter(|t| !t.trim().is_empty())
            .ok_or(MetadataError::MissingField("tileUrlTemplate"))?;

        if wire.min_zoom > wire.max_zoom {
            return Err(MetadataError::InvalidZoomRange {
                min: wire.min_zoom,
                max: wire.max_zoom,
            });
        }
        if wire.max_zoom > MAX_NATIVE_ZOOM {
            return Err(MetadataError::ZoomOutOfRange { max: wire.max_zoom });
        }

        let bounds = ProjectedBounds::from(wire.bounds);
        bounds.validate().map_err(MetadataError::InvalidBounds)?;

        let scheme = if wire.tms { TileScheme::Tms } else { TileScheme::Xyz };
        let template =
            UrlTemplate::new(raw, scheme, wire.subdomains).map_err(MetadataError::InvalidTemplate)?;

        Ok(Self {
            min_zoom: wire.min_zoom,
            max_zoom: wire.max_zoom,
            template,
            bounds,
            attribution: wire.attribution,
        })
    }
}

/// A point marker stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub id: ObservationId,
    pub lat: f64,
    pub lon: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Body of `PATCH /api/observations/{id}/location`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationPatch {
    pub lat: f64,
    pub lon: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"{
        "minZoom": 10,
        "maxZoom": 18,
        "tileUrlTemplate": "/tiles/v3/{z}/{x}/{y}.png",
        "bounds": { "minX": 0, "minY": 0, "maxX": 1000, "maxY": 1000 }
    }"#;

    #[test]
    fn decodes_camel_case_metadata() {
        let meta = TileSetMetadata::from_json(SAMPLE).expect("valid metadata");
        assert_eq!(meta.min_zoom, 10);
        assert_eq!(meta.max_zoom, 18);
        assert_eq!(meta.template.as_str(), "/tiles/v3/{z}/{x}/{y}.png");
        assert_eq!(meta.bounds, ProjectedBounds::new(0.0, 0.0, 1000.0, 1000.0));
        assert_eq!(meta.scheme(), TileScheme::Xyz);
    }

    #[test]
    fn missing_template_is_a_missing_field() {
        let body = r#"{"minZoom":1,"maxZoom":2,"bounds":{"minX":0,"minY":0,"maxX":1,"maxY":1}}"#;
        assert_eq!(
            TileSetMetadata::from_json(body),
            Err(MetadataError::MissingField("tileUrlTemplate"))
        );
        let blank = r#"{"minZoom":1,"maxZoom":2,"tileUrlTemplate":"  ","bounds":{"minX":0,"minY":0,"maxX":1,"maxY":1}}"#;
        assert_eq!(
            TileSetMetadata::from_json(blank),
            Err(MetadataError::MissingField("tileUrlTemplate"))
        );
    }

    #[test]
    fn inverted_zoom_range_is_rejected() {
        let body = r#"{"minZoom":5,"maxZoom":2,"tileUrlTemplate":"{z}/{x}/{y}","bounds":{"minX":0,"minY":0,"maxX":1,"maxY":1}}"#;
        assert_eq!(
            TileSetMetadata::from_json(body),
            Err(MetadataError::InvalidZoomRange { min: 5, max: 2 })
        );
    }

    #[test]
    fn degenerate_bounds_are_rejected() {
        let body = r#"{"minZoom":1,"maxZoom":2,"tileUrlTemplate":"{z}/{x}/{y}","bounds":{"minX":5,"minY":0,"maxX":5,"maxY":1}}"#;
        assert!(matches!(
            TileSetMetadata::from_json(body),
            Err(MetadataError::InvalidBounds(_))
        ));
    }

    #[test]
    fn malformed_json_is_reported() {
        assert!(matches!(
            TileSetMetadata::from_json("{not json"),
            Err(MetadataError::Json(_))
        ));
    }

    #[test]
    fn wire_round_trip_keeps_scheme() {
        let body = r#"{"minZoom":0,"maxZoom":3,"tileUrlTemplate":"{z}/{x}/{y}.png","tms":true,"bounds":{"minX":-1,"minY":-1,"maxX":1,"maxY":1}}"#;
        let meta = TileSetMetadata::from_json(body).unwrap();
        assert_eq!(meta.scheme(), TileScheme::Tms);
        let wire = meta.to_wire();
        assert!(wire.tms);
        assert_eq!(TileSetMetadata::try_from(wire).unwrap(), meta);
    }

    #[test]
    fn observation_optional_fields_default() {
        let obs: Vec<Observation> = serde_json::from_str(
            r#"[{"id":1,"lat":40.2,"lon":-7.5},{"id":2,"lat":1,"lon":2,"iconKey":"tree","label":"Oak"}]"#,
        )
        .unwrap();
        assert_eq!(obs[0].icon_key, None);
        assert_eq!(obs[1].icon_key.as_deref(), Some("tree"));
        assert_eq!(obs[1].label.as_deref(), Some("Oak"));
    }

    #[test]
    fn location_patch_serializes_lat_lon() {
        let body = serde_json::to_string(&LocationPatch { lat: 1.5, lon: -2.0 }).unwrap();
        assert_eq!(body, r#"{"lat":1.5,"lon":-2.0}"#);
    }

    #[test]
    fn zoom_deeper_than_supported_is_rejected() {
        let body = r#"{"minZoom":10,"maxZoom":40,"tileUrlTemplate":"/t/{z}/{x}/{y}.png","bounds":{"minX":0,"minY":0,"maxX":1000,"maxY":1000}}"#;
        assert_eq!(
            TileSetMetadata::from_json(body),
            Err(MetadataError::ZoomOutOfRange { max: 40 })
        );
        let deepest = r#"{"minZoom":10,"maxZoom":30,"tileUrlTemplate":"/t/{z}/{x}/{y}.png","bounds":{"minX":0,"minY":0,"maxX":1000,"maxY":1000}}"#;
        assert_eq!(TileSetMetadata::from_json(deepest).unwrap().max_zoom, MAX_NATIVE_ZOOM);
    }

    #[test]
    fn covering_at_deepest_display_zoom_keeps_full_columns() {
        // Half a centimetre against the eastern edge, just north of the equator.
        let h = MERCATOR_HALF_EXTENT;
        let b = ProjectedBounds::new(h - 0.005, 0.0, h, 0.005);
        let tiles = TileCoord::covering(&b, MAX_DISPLAY_ZOOM);
        assert_eq!(tiles, vec![TileCoord::new(32, u32::MAX, (1u32 << 31) - 1)]);
        assert!(tiles[0].is_valid());
    }

    #[test]
    fn tms_row_flips() {
        let t = TileCoord::new(3, 2, 1);
        assert_eq!(t.tms_y(), 6);
        assert_eq!(t.row(TileScheme::Xyz), 1);
        assert_eq!(t.row(TileScheme::Tms), 6);
    }

    #[test]
    fn mercator_bounds_of_root_tile_is_world() {
        let b = TileCoord::new(0, 0, 0).mercator_bounds();
        assert!((b.min_x + MERCATOR_HALF_EXTENT).abs() < 1e-6);
        assert!((b.max_y - MERCATOR_HALF_EXTENT).abs() < 1e-6);
    }

    #[test]
    fn covering_small_box_at_origin() {
        // Just north-east of the origin: the north-east quadrant at z1.
        let b = ProjectedBounds::new(0.0, 0.0, 1000.0, 1000.0);
        assert_eq!(TileCoord::covering(&b, 1), vec![TileCoord::new(1, 1, 0)]);
    }

    #[test]
    fn covering_full_world_lists_every_tile() {
        let h = MERCATOR_HALF_EXTENT;
        let tiles = TileCoord::covering(&ProjectedBounds::new(-h, -h, h, h), 2);
        assert_eq!(tiles.len(), 16);
        assert_eq!(tiles[0], TileCoord::new(2, 0, 0));
        assert_eq!(tiles[15], TileCoord::new(2, 3, 3));
    }
}
