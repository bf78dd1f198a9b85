use std::env;
use std::time::Duration;

use streaming::{DEFAULT_ZOOM_SLACK, MAX_DISPLAY_ZOOM};
use tracing::warn;

use crate::versions::{MapVersionMark, VersionMarks};
use crate::viewport::ViewportSize;

#[derive(Debug, Clone)]
pub struct ViewerConfig {
    /// Origin that serves `/api`, `/tiles` and `/icons`.
    pub api_base: String,
    pub zoom_slack: u8,
    /// Feature flag for the edit-mode toggle.
    pub edit_mode_enabled: bool,
    pub tile_size: u32,
    pub request_timeout: Option<Duration>,
    pub viewport: ViewportSize,
    pub versions: VersionMarks,
    /// Path prefix for marker icons; icons live at `{icon_base}/{iconKey}.png`.
    pub icon_base: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:8080".to_string(),
            zoom_slack: DEFAULT_ZOOM_SLACK,
            edit_mode_enabled: true,
            tile_size: 256,
            request_timeout: None,
            viewport: ViewportSize::new(1280, 720),
            versions: VersionMarks::default(),
            icon_base: "/icons".to_string(),
        }
    }
}

impl ViewerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset or unparsable keys keep defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let d = Self::default();
        let width = parse_or(&lookup, "VIEWER_VIEWPORT_WIDTH", d.viewport.width);
        let height = parse_or(&lookup, "VIEWER_VIEWPORT_HEIGHT", d.viewport.height);
        let mut zoom_slack = parse_or(&lookup, "VIEWER_ZOOM_SLACK", d.zoom_slack);
        if zoom_slack > MAX_DISPLAY_ZOOM {
            warn!("VIEWER_ZOOM_SLACK={zoom_slack} capped at {MAX_DISPLAY_ZOOM}");
            zoom_slack = MAX_DISPLAY_ZOOM;
        }
        let versions = lookup("VIEWER_VERSIONS")
            .and_then(|raw| parse_version_marks(&raw))
            .unwrap_or(d.versions);

        Self {
            api_base: lookup("VIEWER_API_BASE").unwrap_or(d.api_base),
            zoom_slack,
            edit_mode_enabled: parse_or(&lookup, "VIEWER_EDIT_MODE", d.edit_mode_enabled),
            tile_size: parse_or(&lookup, "VIEWER_TILE_SIZE", d.tile_size),
            request_timeout: lookup("VIEWER_TIMEOUT_MS")
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_millis),
            viewport: ViewportSize::new(width, height),
            versions,
            icon_base: lookup("VIEWER_ICON_BASE").unwrap_or(d.icon_base),
        }
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("ignoring unparsable {key}={raw:?}");
            default
        }),
        None => default,
    }
}

/// Parse `"2:Aug 25,3:Dec 25"` into version marks.
pub fn parse_version_marks(raw: &str) -> Option<VersionMarks> {
    let mut marks = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (value, label) = part.split_once(':').unwrap_or((part, ""));
        let Ok(value) = value.trim().parse() else {
            warn!("ignoring version mark {part:?}");
            continue;
        };
        marks.push(MapVersionMark::new(value, label.trim()));
    }
    VersionMarks::new(marks)
}
