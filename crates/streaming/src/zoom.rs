//! Zoom range policy: native tile levels versus displayable levels.
//!
//! The display may zoom `slack` levels past the deepest native level; tiles
//! for those levels are served by upscaling a native ancestor. Display tiles
//! shallower than the native range are assembled from native descendants.
//! Tile requests never leave `[native_min, native_max]`.

use crate::protocol::{MAX_DISPLAY_ZOOM, MAX_NATIVE_ZOOM, TileCoord, TileSetMetadata};

/// Levels of over-zoom allowed past the native maximum.
pub const DEFAULT_ZOOM_SLACK: u8 = 2;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ZoomPolicy {
    native_min: u8,
    native_max: u8,
    slack: u8,
}

/// Axis-aligned rectangle in unit tile space (`0..=1` on both axes).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct UnitRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl UnitRect {
    pub const FULL: UnitRect = UnitRect {
        x: 0.0,
        y: 0.0,
        w: 1.0,
        h: 1.0,
    };
}

/// One native tile fetch and where its pixels land in the display tile.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct NativeTile {
    pub coord: TileCoord,
    /// Part of the native image to sample.
    pub source: UnitRect,
    /// Part of the display tile to cover.
    pub dest: UnitRect,
}

impl ZoomPolicy {
    /// Native levels are capped at [`MAX_NATIVE_ZOOM`] and `slack` is cut so
    /// the display range never passes [`MAX_DISPLAY_ZOOM`].
    pub fn new(native_min: u8, native_max: u8, slack: u8) -> Self {
        debug_assert!(native_min <= native_max, "native zoom range inverted");
        let native_max = native_max.min(MAX_NATIVE_ZOOM);
        let native_min = native_min.min(native_max);
        Self {
            native_min,
            native_max,
            slack: slack.min(MAX_DISPLAY_ZOOM - native_max),
        }
    }

    pub fn for_metadata(meta: &TileSetMetadata, slack: u8) -> Self {
        Self::new(meta.min_zoom, meta.max_zoom, slack)
    }

    pub fn native_min(&self) -> u8 {
        self.native_min
    }

    pub fn native_max(&self) -> u8 {
        self.native_max
    }

    pub fn slack(&self) -> u8 {
        self.slack
    }

    pub fn display_min_zoom(&self) -> u8 {
        self.native_min
    }

    /// `native_max + slack`.
    pub fn display_max_zoom(&self) -> u8 {
        self.native_max.saturating_add(self.slack)
    }

    pub fn clamp_display_zoom(&self, zoom: f64) -> f64 {
        zoom.clamp(self.display_min_zoom() as f64, self.display_max_zoom() as f64)
    }

    /// Nearest native level for a tile zoom.
    pub fn native_zoom_for(&self, z: u8) -> u8 {
        z.clamp(self.native_min, self.native_max)
    }

    /// Integer tile level the display should lay out for a fractional view zoom.
    pub fn tile_zoom_for(&self, view_zoom: f64) -> u8 {
        self.clamp_display_zoom(view_zoom).round() as u8
    }

    /// Native tiles needed to draw `display`.
    pub fn requests_for(&self, display: TileCoord) -> Vec<NativeTile> {
        let native = self.native_zoom_for(display.z);

        if native == display.z {
            return vec![NativeTile {
                coord: display,
                source: UnitRect::FULL,
                dest: UnitRect::FULL,
            }];
        }

        if native < display.z {
            // Over-zoom: crop the ancestor and upscale.
            let dz = display.z - native;
            let scale = 1.0 / (1u64 << dz) as f64;
            let mask = (1u64 << dz) - 1;
            let (x, y) = (display.x as u64, display.y as u64);
            let parent = TileCoord::new(native, (x >> dz) as u32, (y >> dz) as u32);
            return vec![NativeTile {
                coord: parent,
                source: UnitRect {
                    x: (x & mask) as f64 * scale,
                    y: (y & mask) as f64 * scale,
                    w: scale,
                    h: scale,
                },
                dest: UnitRect::FULL,
            }];
        }

        // Under-zoom: tile the descendants and downscale.
        let dz = native - display.z;
        let n = 1u32 << dz;
        let scale = 1.0 / n as f64;
        let mut out = Vec::with_capacity(n as usize * n as usize);
        for dy in 0..n {
            for dx in 0..n {
                out.push(NativeTile {
                    coord: TileCoord::new(native, (display.x << dz) + dx, (display.y << dz) + dy),
                    source: UnitRect::FULL,
                    dest: UnitRect {
                        x: dx as f64 * scale,
                        y: dy as f64 * scale,
                        w: scale,
                        h: scale,
                    },
                });
            }
        }
        out
    }
}
