//! Viewer session: the single owner of view state.
//!
//! All mutation goes through `&mut self`, so the host's event loop is the only
//! writer. Network calls are awaited outside any borrow of the state they
//! will update; the two-phase `begin_*`/`finish_*` methods let a host keep
//! several requests in flight and feed answers back in completion order.

use foundation::{GeoBounds, LatLon};
use runtime::EventBus;
use streaming::{LocationPatch, MapVersion, ObservationId, TileSetMetadata};
use tracing::{error, info, warn};

use crate::backend::Backend;
use crate::config::ViewerConfig;
use crate::error::{BackendError, ViewerError};
use crate::observations::{MarkerView, MoveOutcome, ObservationOverlay, PendingMove};
use crate::selector::{MetadataTicket, Resolution, VersionSelector};
use crate::tiles::{TileFetch, TileLayer};
use crate::viewport::Viewport;

/// Snapshot of the derived view state.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub center: LatLon,
    pub zoom: f64,
    /// Geographic extent currently on screen.
    pub visible: GeoBounds,
    pub edit_mode: bool,
    pub selected_version: MapVersion,
    pub applied_version: Option<MapVersion>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum VersionChange {
    Applied { version: MapVersion },
    /// Superseded by a newer selection; nothing changed.
    Stale { version: MapVersion },
    /// Kept the previous tile set.
    Failed {
        version: MapVersion,
        error: BackendError,
    },
}

pub struct ViewerSession<B: Backend> {
    backend: B,
    config: ViewerConfig,
    viewport: Viewport,
    layer: Option<TileLayer>,
    selector: VersionSelector,
    overlay: ObservationOverlay,
    events: EventBus,
}

impl<B: Backend> ViewerSession<B> {
    pub fn new(backend: B, config: ViewerConfig) -> Self {
        let viewport = Viewport::new(config.viewport, config.tile_size);
        let selector = VersionSelector::new(config.versions.clone());
        let overlay = ObservationOverlay::new(config.icon_base.clone(), config.edit_mode_enabled);
        Self {
            backend,
            config,
            viewport,
            layer: None,
            selector,
            overlay,
            events: EventBus::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn layer(&self) -> Option<&TileLayer> {
        self.layer.as_ref()
    }

    pub fn selector(&self) -> &VersionSelector {
        &self.selector
    }

    pub fn overlay(&self) -> &ObservationOverlay {
        &self.overlay
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    pub fn view_state(&self) -> ViewState {
        ViewState {
            center: self.viewport.center(),
            zoom: self.viewport.zoom(),
            visible: self.viewport.visible_bounds(),
            edit_mode: self.overlay.edit_mode(),
            selected_version: self.selector.selected(),
            applied_version: self.selector.applied(),
        }
    }

    /// Fetch metadata for `version` and apply it if still current.
    pub async fn select_version(&mut self, version: MapVersion) -> Result<VersionChange, ViewerError> {
        let ticket = self.begin_version_change(version)?;
        let result = self.backend.tile_metadata(version).await;
        Ok(self.finish_version_change(ticket, result))
    }

    pub fn begin_version_change(&mut self, version: MapVersion) -> Result<MetadataTicket, ViewerError> {
        let ticket = self.selector.select(version)?;
        info!(version, request = ticket.id.0, "requesting tile-set metadata");
        Ok(ticket)
    }

    pub fn finish_version_change(
        &mut self,
        ticket: MetadataTicket,
        result: Result<TileSetMetadata, BackendError>,
    ) -> VersionChange {
        let previous = self.layer.as_ref().map(TileLayer::version);
        match self.selector.resolve(ticket, result) {
            Resolution::Apply { version, metadata } => {
                match TileLayer::new(version, metadata, self.config.zoom_slack) {
                    Ok(layer) => {
                        self.install_layer(layer);
                        VersionChange::Applied { version }
                    }
                    Err(e) => {
                        self.selector.reject_applied(previous);
                        let error = BackendError::InvalidMetadata(e.to_string());
                        self.report_metadata_failure(version, &error);
                        VersionChange::Failed { version, error }
                    }
                }
            }
            Resolution::Stale { ticket } => {
                info!(
                    version = ticket.version,
                    request = ticket.id.0,
                    "discarding stale tile-set metadata"
                );
                self.events.info(
                    "metadata.stale",
                    format!("version {} (request {})", ticket.version, ticket.id.0),
                );
                VersionChange::Stale {
                    version: ticket.version,
                }
            }
            Resolution::Failed { ticket, error } => {
                self.report_metadata_failure(ticket.version, &error);
                VersionChange::Failed {
                    version: ticket.version,
                    error,
                }
            }
        }
    }

    /// Swap layer, zoom range and bounds in one step.
    fn install_layer(&mut self, layer: TileLayer) {
        let bounds = *layer.geo_bounds();
        self.viewport.apply_zoom_policy(layer.policy());
        self.viewport.set_max_bounds(Some(bounds));
        self.viewport.fit_bounds(&bounds);
        info!(
            version = layer.version(),
            min_zoom = layer.policy().display_min_zoom(),
            max_zoom = layer.policy().display_max_zoom(),
            "tile set applied"
        );
        self.events
            .info("metadata.applied", format!("version {}", layer.version()));
        self.layer = Some(layer);
    }

    fn report_metadata_failure(&mut self, version: MapVersion, err: &BackendError) {
        if err.is_fatal() {
            error!(version, "unrecoverable tile-set metadata: {err}");
        } else {
            error!(version, "tile-set metadata fetch failed: {err}");
        }
        self.events
            .error("metadata.failed", format!("version {version}: {err}"));
    }

    /// Tile fetches for the current view, all from the applied version.
    pub fn visible_tiles(&self) -> Vec<TileFetch> {
        self.layer
            .as_ref()
            .map(|l| l.visible_fetches(&self.viewport))
            .unwrap_or_default()
    }

    /// Whether a tile response for `version` may still be drawn.
    pub fn accepts_tile(&self, version: MapVersion) -> bool {
        self.layer.as_ref().is_some_and(|l| l.accepts(version))
    }

    /// Load the observation list; on failure the overlay is left as it was.
    pub async fn load_observations(&mut self) -> Result<usize, BackendError> {
        match self.backend.observations().await {
            Ok(list) => {
                let received = list.len();
                let dropped = self.overlay.replace_all(list);
                if dropped > 0 {
                    warn!(dropped, "some observations were rejected");
                    self.events
                        .warn("observations.dropped", format!("{dropped} rejected"));
                }
                info!(count = received - dropped, "observations loaded");
                Ok(received - dropped)
            }
            Err(err) => {
                error!("observation fetch failed: {err}");
                self.events.error("observations.failed", err.to_string());
                Err(err)
            }
        }
    }

    pub fn markers(&self) -> Vec<MarkerView> {
        self.overlay.markers()
    }

    pub fn set_edit_mode(&mut self, on: bool) -> bool {
        self.overlay.set_edit_mode(on)
    }

    pub fn toggle_edit_mode(&mut self) -> bool {
        self.overlay.toggle_edit_mode()
    }

    /// Drop a dragged marker at `to` and persist the new location.
    pub async fn move_observation(
        &mut self,
        id: ObservationId,
        to: LatLon,
    ) -> Result<MoveOutcome, ViewerError> {
        let mv = self.begin_move(id, to)?;
        let patch = LocationPatch {
            lat: to.lat,
            lon: to.lon,
        };
        let result = self.backend.patch_location(id, patch).await;
        Ok(self.finish_move(mv, result))
    }

    pub fn begin_move(&mut self, id: ObservationId, to: LatLon) -> Result<PendingMove, ViewerError> {
        let mv = self.overlay.begin_move(id, to)?;
        info!(id, lat = to.lat, lon = to.lon, "observation moved");
        Ok(mv)
    }

    pub fn finish_move(&mut self, mv: PendingMove, result: Result<(), BackendError>) -> MoveOutcome {
        let outcome = self.overlay.complete_move(mv, result);
        match &outcome {
            MoveOutcome::Committed { id, .. } => {
                self.events.info("location.committed", format!("observation {id}"));
            }
            MoveOutcome::Reverted { id, error, .. } => {
                error!(id, "failed to update observation location: {error}");
                self.events
                    .error("location.failed", format!("observation {id}: {error}"));
            }
            MoveOutcome::Discarded { id } => {
                warn!(id, "location update answered after observation vanished");
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BoxFuture;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use streaming::Observation;

    #[derive(Default)]
    struct MockBackend {
        metadata: HashMap<MapVersion, Result<String, BackendError>>,
        observations: Mutex<Option<Result<Vec<Observation>, BackendError>>>,
        patch_error: Option<BackendError>,
        patches: Mutex<Vec<(ObservationId, LocationPatch)>>,
    }

    impl Backend for MockBackend {
        fn tile_metadata(
            &self,
            version: MapVersion,
        ) -> BoxFuture<'_, Result<TileSetMetadata, BackendError>> {
            let r = match self.metadata.get(&version) {
                Some(Ok(body)) => TileSetMetadata::from_json(body).map_err(BackendError::from),
                Some(Err(e)) => Err(e.clone()),
                None => Err(BackendError::Status {
                    url: format!("/api/tiles/metadata?version={version}"),
                    status: 404,
                }),
            };
            Box::pin(async move { r })
        }

        fn observations(&self) -> BoxFuture<'_, Result<Vec<Observation>, BackendError>> {
            let r = self
                .observations
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| Ok(Vec::new()));
            Box::pin(async move { r })
        }

        fn patch_location(
            &self,
            id: ObservationId,
            patch: LocationPatch,
        ) -> BoxFuture<'_, Result<(), BackendError>> {
            self.patches.lock().unwrap().push((id, patch));
            let r = match &self.patch_error {
                Some(e) => Err(e.clone()),
                None => Ok(()),
            };
            Box::pin(async move { r })
        }
    }

    fn body(version: MapVersion, min: u8, max: u8) -> String {
        format!(
            r#"{{"minZoom":{min},"maxZoom":{max},"tileUrlTemplate":"/tiles/v{version}/{{z}}/{{x}}/{{y}}.png",
                "bounds":{{"minX":-950000,"minY":4800000,"maxX":-750000,"maxY":4950000}}}}"#
        )
    }

    fn backend() -> MockBackend {
        let mut b = MockBackend::default();
        b.metadata.insert(2, Ok(body(2, 8, 16)));
        b.metadata.insert(3, Ok(body(3, 10, 18)));
        b.metadata.insert(
            4,
            Ok(r#"{"minZoom":1,"maxZoom":2,"bounds":{"minX":0,"minY":0,"maxX":1,"maxY":1}}"#.into()),
        );
        *b.observations.lock().unwrap() = Some(Ok(vec![
            Observation {
                id: 1,
                lat: 40.2,
                lon: -7.5,
                icon_key: Some("tree".into()),
                label: Some("Oak".into()),
            },
            Observation {
                id: 2,
                lat: 40.3,
                lon: -7.4,
                icon_key: None,
                label: None,
            },
        ]));
        b
    }

    fn session(b: MockBackend) -> ViewerSession<MockBackend> {
        ViewerSession::new(b, ViewerConfig::default())
    }

    #[tokio::test]
    async fn applying_a_version_swaps_layer_zoom_and_bounds() {
        let mut s = session(backend());
        let change = s.select_version(3).await.unwrap();
        assert_eq!(change, VersionChange::Applied { version: 3 });

        let layer = s.layer().unwrap();
        assert_eq!(layer.metadata().template.as_str(), "/tiles/v3/{z}/{x}/{y}.png");
        assert_eq!(layer.metadata().min_zoom, 10);
        assert_eq!(layer.metadata().max_zoom, 18);
        assert_eq!(s.viewport().min_zoom(), 10.0);
        assert_eq!(s.viewport().max_zoom(), 20.0);
        assert_eq!(s.viewport().max_bounds(), Some(layer.geo_bounds()));
        assert!(layer.geo_bounds().contains(s.viewport().center()));
        let state = s.view_state();
        assert_eq!(state.applied_version, Some(3));
        let geo = layer.geo_bounds();
        assert!(state.visible.south >= geo.south - 1e-9);
        assert!(state.visible.north <= geo.north + 1e-9);
        assert!(state.visible.west >= geo.west - 1e-9);
        assert!(state.visible.east <= geo.east + 1e-9);
        assert!(state.visible.contains(state.center));
        assert_eq!(s.events().of_kind("metadata.applied").count(), 1);
    }

    #[tokio::test]
    async fn switching_versions_never_serves_old_tiles() {
        let mut s = session(backend());
        s.select_version(3).await.unwrap();
        s.select_version(2).await.unwrap();

        assert!(s.accepts_tile(2));
        assert!(!s.accepts_tile(3));
        let tiles = s.visible_tiles();
        assert!(!tiles.is_empty());
        assert!(tiles.iter().all(|t| t.url.starts_with("/tiles/v2/")));
        assert_eq!(s.viewport().max_zoom(), 18.0);
    }

    #[tokio::test]
    async fn stale_response_cannot_overwrite_newer_selection() {
        let mut s = session(backend());
        let old = s.begin_version_change(2).unwrap();
        let new = s.begin_version_change(3).unwrap();

        let new_meta = s.backend().tile_metadata(3).await;
        assert_eq!(
            s.finish_version_change(new, new_meta),
            VersionChange::Applied { version: 3 }
        );
        let old_meta = s.backend().tile_metadata(2).await;
        assert_eq!(
            s.finish_version_change(old, old_meta),
            VersionChange::Stale { version: 2 }
        );
        assert_eq!(s.layer().unwrap().version(), 3);
        assert_eq!(s.events().of_kind("metadata.stale").count(), 1);
    }

    #[tokio::test]
    async fn missing_template_is_fatal_and_keeps_previous_layer() {
        let mut s = session(backend());
        s.select_version(3).await.unwrap();
        let change = s.select_version(4).await.unwrap();
        assert_eq!(
            change,
            VersionChange::Failed {
                version: 4,
                error: BackendError::MissingField("tileUrlTemplate")
            }
        );
        assert_eq!(s.layer().unwrap().version(), 3);
        assert_eq!(s.selector().selected(), 3);
        assert_eq!(s.events().errors().count(), 1);
    }

    #[tokio::test]
    async fn failed_first_fetch_leaves_viewer_blank() {
        let mut b = backend();
        b.metadata.insert(
            2,
            Err(BackendError::Transport("connection refused".into())),
        );
        let mut s = session(b);
        let change = s.select_version(2).await.unwrap();
        assert!(matches!(change, VersionChange::Failed { version: 2, .. }));
        assert!(s.layer().is_none());
        assert!(s.visible_tiles().is_empty());
    }

    #[tokio::test]
    async fn too_deep_tile_set_is_refused_and_nothing_is_requested() {
        let mut b = backend();
        b.metadata.insert(
            2,
            Ok(r#"{"minZoom":60,"maxZoom":62,"tileUrlTemplate":"/t/{z}/{x}/{y}.png",
                   "bounds":{"minX":0,"minY":0,"maxX":1000,"maxY":1000}}"#
                .into()),
        );
        let mut s = session(b);
        let change = s.select_version(2).await.unwrap();
        assert!(matches!(
            change,
            VersionChange::Failed {
                version: 2,
                error: BackendError::InvalidMetadata(_)
            }
        ));
        s.viewport_mut().zoom_to(64.0);
        assert!(s.visible_tiles().is_empty());
    }

    #[tokio::test]
    async fn unknown_version_is_rejected_without_fetching() {
        let mut s = session(backend());
        assert_eq!(
            s.select_version(7).await,
            Err(ViewerError::UnknownVersion(7))
        );
    }

    #[tokio::test]
    async fn observations_load_and_render_markers() {
        let mut s = session(backend());
        assert_eq!(s.load_observations().await, Ok(2));
        let markers = s.markers();
        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0].icon.url, "/icons/tree.png");
        assert_eq!(markers[0].title, "Oak");
    }

    #[tokio::test]
    async fn observation_fetch_failure_keeps_overlay_empty() {
        let b = backend();
        *b.observations.lock().unwrap() = Some(Err(BackendError::Status {
            url: "/api/observations".into(),
            status: 502,
        }));
        let mut s = session(b);
        assert!(s.load_observations().await.is_err());
        assert!(s.markers().is_empty());
        assert!(!s.overlay().is_loaded());
        assert_eq!(s.events().of_kind("observations.failed").count(), 1);
    }

    #[tokio::test]
    async fn toggling_edit_mode_does_not_refetch() {
        let mut s = session(backend());
        s.load_observations().await.unwrap();
        *s.backend().observations.lock().unwrap() = Some(Ok(Vec::new()));
        assert!(s.toggle_edit_mode());
        assert_eq!(s.markers().len(), 2);
        assert!(s.markers().iter().all(|m| m.draggable));
    }

    #[tokio::test]
    async fn successful_drag_updates_only_dragged_observation() {
        let mut s = session(backend());
        s.load_observations().await.unwrap();
        s.set_edit_mode(true);

        let out = s.move_observation(1, LatLon::new(40.25, -7.45)).await.unwrap();
        assert!(matches!(out, MoveOutcome::Committed { id: 1, .. }));

        let o1 = s.overlay().get(1).unwrap();
        assert_eq!((o1.lat, o1.lon), (40.25, -7.45));
        let o2 = s.overlay().get(2).unwrap();
        assert_eq!((o2.lat, o2.lon), (40.3, -7.4));

        let patches = s.backend().patches.lock().unwrap().clone();
        assert_eq!(patches, vec![(1, LocationPatch { lat: 40.25, lon: -7.45 })]);
    }

    #[tokio::test]
    async fn failed_drag_keeps_list_and_logs() {
        let mut b = backend();
        b.patch_error = Some(BackendError::Status {
            url: "/api/observations/2/location".into(),
            status: 500,
        });
        let mut s = session(b);
        s.load_observations().await.unwrap();
        s.set_edit_mode(true);

        let out = s.move_observation(2, LatLon::new(0.0, 0.0)).await.unwrap();
        assert!(matches!(out, MoveOutcome::Reverted { id: 2, .. }));
        assert_eq!(s.overlay().observations().len(), 2);
        let o2 = s.overlay().get(2).unwrap();
        assert_eq!((o2.lat, o2.lon), (40.3, -7.4));
        assert_eq!(s.events().of_kind("location.failed").count(), 1);
    }

    #[tokio::test]
    async fn drag_outside_edit_mode_is_refused() {
        let mut s = session(backend());
        s.load_observations().await.unwrap();
        assert_eq!(
            s.move_observation(1, LatLon::new(1.0, 1.0)).await,
            Err(ViewerError::EditModeOff)
        );
        assert!(s.backend().patches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn edit_mode_feature_flag_off_disables_dragging() {
        let cfg = ViewerConfig {
            edit_mode_enabled: false,
            ..ViewerConfig::default()
        };
        let mut s = ViewerSession::new(backend(), cfg);
        s.load_observations().await.unwrap();
        assert!(!s.toggle_edit_mode());
        assert!(s.markers().iter().all(|m| !m.draggable));
    }

    #[tokio::test]
    async fn small_tile_set_caps_zoom_and_recenters_pans() {
        let mut b = backend();
        b.metadata.insert(
            2,
            Ok(r#"{"minZoom":10,"maxZoom":18,"tileUrlTemplate":"/t/{z}/{x}/{y}.png",
                   "bounds":{"minX":0,"minY":0,"maxX":1000,"maxY":1000}}"#
                .into()),
        );
        let mut s = session(b);
        s.select_version(2).await.unwrap();
        assert_eq!(s.viewport().max_zoom(), 20.0);

        let out = s.viewport_mut().pan_to(LatLon::new(10.0, 10.0));
        assert!(out.clamped);
        assert!(s.layer().unwrap().geo_bounds().contains(s.view_state().center));
    }

    #[tokio::test]
    async fn pan_outside_tile_set_is_clamped() {
        let mut s = session(backend());
        s.select_version(3).await.unwrap();
        let bounds = *s.layer().unwrap().geo_bounds();
        let out = s.viewport_mut().pan_to(LatLon::new(60.0, 20.0));
        assert!(out.clamped);
        assert!(bounds.contains(s.view_state().center));
        s.viewport_mut().zoom_to(30.0);
        assert_eq!(s.view_state().zoom, 20.0);
    }
}
