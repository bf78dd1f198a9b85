//! Backend access for tile-set metadata and observations.
//!
//! `Backend` is the seam between the viewer state machines and the network.
//! `HttpBackend` talks to the real API with reqwest; tests plug in an
//! in-memory implementation.

use std::future::Future;
use std::pin::Pin;

use streaming::{LocationPatch, MapVersion, Observation, ObservationId, TileSetMetadata};
use tracing::debug;

use crate::config::ViewerConfig;
use crate::error::BackendError;

/// Type alias for a boxed future that can be sent between threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Methods return boxed futures for dyn-compatibility.
pub trait Backend: Send + Sync {
    /// `GET /api/tiles/metadata?version=<version>`
    fn tile_metadata(&self, version: MapVersion)
    -> BoxFuture<'_, Result<TileSetMetadata, BackendError>>;

    /// `GET /api/observations`
    fn observations(&self) -> BoxFuture<'_, Result<Vec<Observation>, BackendError>>;

    /// `PATCH /api/observations/{id}/location`
    fn patch_location(
        &self,
        id: ObservationId,
        patch: LocationPatch,
    ) -> BoxFuture<'_, Result<(), BackendError>>;
}

#[derive(Debug, Clone)]
pub struct HttpBackend {
    base: String,
    http: reqwest::Client,
}

impl HttpBackend {
    pub fn new(base: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            base: base.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    pub fn from_config(config: &ViewerConfig) -> Result<Self, BackendError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        Ok(Self::new(config.api_base.clone(), http))
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn metadata_url(&self, version: MapVersion) -> String {
        format!("{}/api/tiles/metadata?version={version}", self.base)
    }

    pub fn observations_url(&self) -> String {
        format!("{}/api/observations", self.base)
    }

    pub fn location_url(&self, id: ObservationId) -> String {
        format!("{}/api/observations/{id}/location", self.base)
    }

    async fn get_text(&self, url: String) -> Result<String, BackendError> {
        debug!(%url, "GET");
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        let resp = check_status(url, resp)?;
        resp.text()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))
    }
}

fn check_status(url: String, resp: reqwest::Response) -> Result<reqwest::Response, BackendError> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        Err(BackendError::Status {
            url,
            status: status.as_u16(),
        })
    }
}

impl Backend for HttpBackend {
    fn tile_metadata(
        &self,
        version: MapVersion,
    ) -> BoxFuture<'_, Result<TileSetMetadata, BackendError>> {
        Box::pin(async move {
            let body = self.get_text(self.metadata_url(version)).await?;
            Ok(TileSetMetadata::from_json(&body)?)
        })
    }

    fn observations(&self) -> BoxFuture<'_, Result<Vec<Observation>, BackendError>> {
        Box::pin(async move {
            let body = self.get_text(self.observations_url()).await?;
            serde_json::from_str(&body).map_err(|e| BackendError::Decode(e.to_string()))
        })
    }

    fn patch_location(
        &self,
        id: ObservationId,
        patch: LocationPatch,
    ) -> BoxFuture<'_, Result<(), BackendError>> {
        Box::pin(async move {
            let url = self.location_url(id);
            debug!(%url, lat = patch.lat, lon = patch.lon, "PATCH");
            let resp = self
                .http
                .patch(&url)
                .json(&patch)
                .send()
                .await
                .map_err(|e| BackendError::Transport(e.to_string()))?;
            check_status(url, resp)?;
            Ok(())
        })
    }
}
