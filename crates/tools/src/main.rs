//! `atlas-view`: drive the viewer core against a live backend from the shell.

use std::time::Duration;

use clap::{Parser, Subcommand};
use foundation::{GeoBounds, LatLon};
use serde::Serialize;
use streaming::{MapVersion, ObservationId, TileSetMetadataWire};
use tracing_subscriber::EnvFilter;
use viewer::{
    HttpBackend, MarkerView, MoveOutcome, VersionChange, ViewerConfig, ViewerSession,
    ViewportSize,
};

#[derive(Debug, Parser)]
#[command(name = "atlas-view", about = "Inspect versioned tile sets and observations")]
struct Cli {
    /// Backend origin; overrides VIEWER_API_BASE.
    #[arg(long, global = true)]
    api_base: Option<String>,
    /// Extra display zoom levels beyond the native maximum.
    #[arg(long, global = true)]
    slack: Option<u8>,
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the configured versions.
    Versions,
    /// Fetch and summarize tile-set metadata for one version.
    Metadata {
        #[arg(long)]
        version: MapVersion,
    },
    /// List observations as markers.
    Observations,
    /// Move one observation and persist its new location.
    Move {
        id: ObservationId,
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lon: f64,
    },
    /// Tile URLs visible for a version at a given view.
    Tiles {
        #[arg(long)]
        version: MapVersion,
        #[arg(long)]
        zoom: Option<f64>,
        #[arg(long, allow_negative_numbers = true)]
        lat: Option<f64>,
        #[arg(long, allow_negative_numbers = true)]
        lon: Option<f64>,
        #[arg(long, default_value_t = 1280)]
        width: u32,
        #[arg(long, default_value_t = 720)]
        height: u32,
    },
}

#[derive(Debug, Serialize)]
struct VersionRow {
    value: MapVersion,
    label: String,
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MetadataSummary {
    version: MapVersion,
    metadata: TileSetMetadataWire,
    display_min_zoom: u8,
    display_max_zoom: u8,
    geo_bounds: BoundsRow,
}

#[derive(Debug, Serialize)]
struct BoundsRow {
    south: f64,
    west: f64,
    north: f64,
    east: f64,
}

impl From<&GeoBounds> for BoundsRow {
    fn from(b: &GeoBounds) -> Self {
        Self {
            south: b.south,
            west: b.west,
            north: b.north,
            east: b.east,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MarkerRow {
    id: ObservationId,
    lat: f64,
    lon: f64,
    title: String,
    icon_url: String,
}

impl From<&MarkerView> for MarkerRow {
    fn from(m: &MarkerView) -> Self {
        Self {
            id: m.id,
            lat: m.position.lat,
            lon: m.position.lon,
            title: m.title.clone(),
            icon_url: m.icon.url.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TileRow {
    display: String,
    native: String,
    url: String,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = rt.block_on(real_main(cli)) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn config_for(cli: &Cli, base: ViewerConfig) -> ViewerConfig {
    let mut cfg = base;
    if let Some(api_base) = &cli.api_base {
        cfg.api_base = api_base.clone();
    }
    if let Some(slack) = cli.slack {
        cfg.zoom_slack = slack;
    }
    if let Some(ms) = cli.timeout_ms {
        cfg.request_timeout = Some(Duration::from_millis(ms));
    }
    if let Command::Tiles { width, height, .. } = &cli.command {
        cfg.viewport = ViewportSize::new(*width, *height);
    }
    cfg
}

async fn real_main(cli: Cli) -> Result<(), String> {
    let cfg = config_for(&cli, ViewerConfig::from_env());

    if let Command::Versions = cli.command {
        let rows: Vec<VersionRow> = cfg
            .versions
            .iter()
            .map(|m| VersionRow {
                value: m.value,
                label: m.label.clone(),
                text: cfg.versions.value_text(m.value),
            })
            .collect();
        return print_json(&rows);
    }

    let backend = HttpBackend::from_config(&cfg).map_err(|e| e.to_string())?;
    let mut session = ViewerSession::new(backend, cfg);

    match cli.command {
        Command::Versions => Ok(()),
        Command::Metadata { version } => {
            apply_version(&mut session, version).await?;
            let Some(layer) = session.layer() else {
                return Err(format!("version {version} was not applied"));
            };
            print_json(&MetadataSummary {
                version,
                metadata: layer.metadata().to_wire(),
                display_min_zoom: layer.policy().display_min_zoom(),
                display_max_zoom: layer.policy().display_max_zoom(),
                geo_bounds: BoundsRow::from(layer.geo_bounds()),
            })
        }
        Command::Observations => {
            session.load_observations().await.map_err(|e| e.to_string())?;
            let rows: Vec<MarkerRow> = session.markers().iter().map(MarkerRow::from).collect();
            print_json(&rows)
        }
        Command::Move { id, lat, lon } => {
            session.load_observations().await.map_err(|e| e.to_string())?;
            if !session.set_edit_mode(true) {
                return Err("edit mode is disabled (VIEWER_EDIT_MODE)".to_string());
            }
            let outcome = session
                .move_observation(id, LatLon::new(lat, lon))
                .await
                .map_err(|e| e.to_string())?;
            match outcome {
                MoveOutcome::Committed { id, position } => {
                    println!("observation {id} moved to {}, {}", position.lat, position.lon);
                    Ok(())
                }
                MoveOutcome::Reverted { id, error, .. } => {
                    Err(format!("observation {id} not moved: {error}"))
                }
                MoveOutcome::Discarded { id } => Err(format!("observation {id} vanished")),
            }
        }
        Command::Tiles {
            version, zoom, lat, lon, ..
        } => {
            apply_version(&mut session, version).await?;
            if let (Some(lat), Some(lon)) = (lat, lon) {
                session.viewport_mut().pan_to(LatLon::new(lat, lon));
            }
            if let Some(zoom) = zoom {
                session.viewport_mut().zoom_to(zoom);
            }
            let rows: Vec<TileRow> = session
                .visible_tiles()
                .into_iter()
                .map(|t| TileRow {
                    display: format!("{}/{}/{}", t.display.z, t.display.x, t.display.y),
                    native: format!("{}/{}/{}", t.native.coord.z, t.native.coord.x, t.native.coord.y),
                    url: t.url,
                })
                .collect();
            print_json(&rows)
        }
    }
}

async fn apply_version(
    session: &mut ViewerSession<HttpBackend>,
    version: MapVersion,
) -> Result<(), String> {
    match session.select_version(version).await.map_err(|e| e.to_string())? {
        VersionChange::Applied { .. } => Ok(()),
        VersionChange::Stale { version } => Err(format!("response for version {version} was stale")),
        VersionChange::Failed { version, error } => Err(format!("version {version}: {error}")),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let s = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{s}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_move_with_negative_coordinates() {
        let cli = Cli::try_parse_from(["atlas-view", "move", "7", "40.2", "-7.5"]).unwrap();
        match cli.command {
            Command::Move { id, lat, lon } => {
                assert_eq!(id, 7);
                assert_eq!(lat, 40.2);
                assert_eq!(lon, -7.5);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from([
            "atlas-view",
            "--api-base",
            "http://api:9000",
            "--slack",
            "3",
            "tiles",
            "--version",
            "3",
            "--width",
            "512",
            "--height",
            "256",
        ])
        .unwrap();
        let cfg = config_for(&cli, ViewerConfig::default());
        assert_eq!(cfg.api_base, "http://api:9000");
        assert_eq!(cfg.zoom_slack, 3);
        assert_eq!(cfg.viewport, ViewportSize::new(512, 256));
        assert_eq!(cfg.request_timeout, None);
    }

    #[test]
    fn metadata_requires_version() {
        assert!(Cli::try_parse_from(["atlas-view", "metadata"]).is_err());
    }
}
