use foundation::{BoundsError, GeoBounds, YAxis, geo_bounds_from_projected};
use streaming::{MapVersion, NativeTile, TileCoord, TileSetMetadata, ZoomPolicy};

use crate::viewport::Viewport;

/// One tile image to fetch for one display tile.
#[derive(Debug, Clone, PartialEq)]
pub struct TileFetch {
    pub display: TileCoord,
    pub native: NativeTile,
    pub url: String,
}

/// Tile source bound to exactly one tile-set version.
///
/// Swapping versions means building a new layer; nothing here is mutable,
/// so tiles and bounds can never come from different versions.
#[derive(Debug, Clone, PartialEq)]
pub struct TileLayer {
    version: MapVersion,
    metadata: TileSetMetadata,
    policy: ZoomPolicy,
    geo_bounds: GeoBounds,
}

impl TileLayer {
    pub fn new(version: MapVersion, metadata: TileSetMetadata, slack: u8) -> Result<Self, BoundsError> {
        // Metadata bounds are EPSG:3857, whose Y axis grows northward whatever
        // the tile row order is.
        let geo_bounds = geo_bounds_from_projected(&metadata.bounds, YAxis::NorthUp)?;
        let policy = ZoomPolicy::for_metadata(&metadata, slack);
        Ok(Self {
            version,
            metadata,
            policy,
            geo_bounds,
        })
    }

    pub fn version(&self) -> MapVersion {
        self.version
    }

    pub fn metadata(&self) -> &TileSetMetadata {
        &self.metadata
    }

    pub fn policy(&self) -> &ZoomPolicy {
        &self.policy
    }

    pub fn geo_bounds(&self) -> &GeoBounds {
        &self.geo_bounds
    }

    /// Whether a tile response tagged with `version` may be drawn.
    pub fn accepts(&self, version: MapVersion) -> bool {
        self.version == version
    }

    /// Native fetches for one display tile.
    pub fn fetches_for(&self, display: TileCoord) -> Vec<TileFetch> {
        self.policy
            .requests_for(display)
            .into_iter()
            .map(|native| TileFetch {
                display,
                native,
                url: self.metadata.template.expand(native.coord),
            })
            .collect()
    }

    /// Fetches covering the part of the viewport that overlaps the tile set.
    pub fn visible_fetches(&self, viewport: &Viewport) -> Vec<TileFetch> {
        let Some(area) = viewport.visible_projected().intersection(&self.metadata.bounds) else {
            return Vec::new();
        };
        let z = self.policy.tile_zoom_for(viewport.zoom());
        TileCoord::covering(&area, z)
            .into_iter()
            .flat_map(|display| self.fetches_for(display))
            .collect()
    }
}
