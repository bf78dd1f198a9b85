//! Observation overlay and the marker edit flow.
//!
//! Idle -> drag -> pending (marker drawn at the drop point, stored position
//! unchanged) -> committed (stored position updated) or failed (marker
//! reverts to the stored, pre-drag position).

use std::collections::{BTreeMap, HashSet};

use foundation::LatLon;
use streaming::{Observation, ObservationId};
use tracing::warn;

use crate::error::{BackendError, ViewerError};

pub const ICON_SIZE: [u32; 2] = [25, 41];
pub const ICON_ANCHOR: [u32; 2] = [12, 41];
const DEFAULT_ICON_KEY: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerIcon {
    pub url: String,
    pub size: [u32; 2],
    pub anchor: [u32; 2],
}

/// Everything a host needs to draw one marker.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerView {
    pub id: ObservationId,
    pub position: LatLon,
    pub icon: MarkerIcon,
    pub title: String,
    pub draggable: bool,
    pub pending: bool,
}

/// A location update that has been sent but not answered.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PendingMove {
    pub id: ObservationId,
    pub from: LatLon,
    pub to: LatLon,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome {
    Committed {
        id: ObservationId,
        position: LatLon,
    },
    /// The update failed; the marker is back at `position`.
    Reverted {
        id: ObservationId,
        position: LatLon,
        error: BackendError,
    },
    /// The observation disappeared (list reloaded) before the answer arrived.
    Discarded { id: ObservationId },
}

#[derive(Debug)]
pub struct ObservationOverlay {
    observations: Option<Vec<Observation>>,
    edit_mode: bool,
    edit_mode_enabled: bool,
    icon_base: String,
    pending: BTreeMap<ObservationId, PendingMove>,
}

impl ObservationOverlay {
    pub fn new(icon_base: impl Into<String>, edit_mode_enabled: bool) -> Self {
        Self {
            observations: None,
            edit_mode: false,
            edit_mode_enabled,
            icon_base: icon_base.into(),
            pending: BTreeMap::new(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.observations.is_some()
    }

    pub fn observations(&self) -> &[Observation] {
        self.observations.as_deref().unwrap_or(&[])
    }

    pub fn get(&self, id: ObservationId) -> Option<&Observation> {
        self.observations().iter().find(|o| o.id == id)
    }

    /// Replace the list. Out-of-range records and repeated ids are dropped;
    /// returns how many were dropped.
    pub fn replace_all(&mut self, incoming: Vec<Observation>) -> usize {
        let total = incoming.len();
        let mut kept: Vec<Observation> = Vec::with_capacity(total);
        let mut seen: HashSet<ObservationId> = HashSet::with_capacity(total);
        for o in incoming {
            if !LatLon::new(o.lat, o.lon).is_valid() {
                warn!(id = o.id, lat = o.lat, lon = o.lon, "dropping observation with invalid location");
                continue;
            }
            if !seen.insert(o.id) {
                warn!(id = o.id, "dropping duplicate observation id");
                continue;
            }
            kept.push(o);
        }
        let dropped = total - kept.len();
        self.pending.retain(|id, _| seen.contains(id));
        self.observations = Some(kept);
        dropped
    }

    pub fn edit_mode(&self) -> bool {
        self.edit_mode
    }

    pub fn edit_mode_enabled(&self) -> bool {
        self.edit_mode_enabled
    }

    /// Returns the effective mode; stays off when the feature flag is off.
    pub fn set_edit_mode(&mut self, on: bool) -> bool {
        self.edit_mode = on && self.edit_mode_enabled;
        self.edit_mode
    }

    pub fn toggle_edit_mode(&mut self) -> bool {
        self.set_edit_mode(!self.edit_mode)
    }

    pub fn pending(&self, id: ObservationId) -> Option<&PendingMove> {
        self.pending.get(&id)
    }

    /// Start moving a marker to `to`. Stored coordinates do not change yet.
    pub fn begin_move(&mut self, id: ObservationId, to: LatLon) -> Result<PendingMove, ViewerError> {
        if !self.edit_mode {
            return Err(ViewerError::EditModeOff);
        }
        if !to.is_valid() {
            return Err(ViewerError::InvalidLocation {
                lat: to.lat,
                lon: to.lon,
            });
        }
        if self.pending.contains_key(&id) {
            return Err(ViewerError::MovePending(id));
        }
        let current = self.get(id).ok_or(ViewerError::UnknownObservation(id))?;
        let mv = PendingMove {
            id,
            from: LatLon::new(current.lat, current.lon),
            to,
        };
        self.pending.insert(id, mv);
        Ok(mv)
    }

    /// Settle a pending move with the backend's answer.
    pub fn complete_move(
        &mut self,
        mv: PendingMove,
        result: Result<(), BackendError>,
    ) -> MoveOutcome {
        self.pending.remove(&mv.id);
        let Some(obs) = self
            .observations
            .as_mut()
            .and_then(|list| list.iter_mut().find(|o| o.id == mv.id))
        else {
            return MoveOutcome::Discarded { id: mv.id };
        };

        match result {
            Ok(()) => {
                obs.lat = mv.to.lat;
                obs.lon = mv.to.lon;
                MoveOutcome::Committed {
                    id: mv.id,
                    position: mv.to,
                }
            }
            Err(error) => MoveOutcome::Reverted {
                id: mv.id,
                position: LatLon::new(obs.lat, obs.lon),
                error,
            },
        }
    }

    pub fn icon_for(&self, icon_key: Option<&str>) -> MarkerIcon {
        let key = icon_key.filter(|k| !k.is_empty()).unwrap_or(DEFAULT_ICON_KEY);
        MarkerIcon {
            url: format!("{}/{key}.png", self.icon_base.trim_end_matches('/')),
            size: ICON_SIZE,
            anchor: ICON_ANCHOR,
        }
    }

    pub fn markers(&self) -> Vec<MarkerView> {
        self.observations()
            .iter()
            .map(|o| {
                let pending = self.pending.get(&o.id);
                MarkerView {
                    id: o.id,
                    position: pending.map_or(LatLon::new(o.lat, o.lon), |p| p.to),
                    icon: self.icon_for(o.icon_key.as_deref()),
                    title: o.label.clone().unwrap_or_default(),
                    draggable: self.edit_mode,
                    pending: pending.is_some(),
                }
            })
            .collect()
    }
}
