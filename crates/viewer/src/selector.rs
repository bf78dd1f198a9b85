//! Version selector state machine.
//!
//! Each selection issues a new request id. Only the response carrying the
//! latest id may be applied; earlier responses are stale no matter when they
//! complete. A failed latest response keeps the previously applied version.

use runtime::{RequestId, RequestSequence};
use streaming::{MapVersion, TileSetMetadata};
use tracing::debug;

use crate::error::{BackendError, ViewerError};
use crate::versions::VersionMarks;

/// Handle for one in-flight metadata fetch.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MetadataTicket {
    pub id: RequestId,
    pub version: MapVersion,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Latest response succeeded; the caller must swap layer and viewport.
    Apply {
        version: MapVersion,
        metadata: TileSetMetadata,
    },
    /// A newer selection exists; the response was discarded.
    Stale { ticket: MetadataTicket },
    /// Latest response failed; the previously applied version stays.
    Failed {
        ticket: MetadataTicket,
        error: BackendError,
    },
}

#[derive(Debug)]
pub struct VersionSelector {
    marks: VersionMarks,
    selected: MapVersion,
    applied: Option<MapVersion>,
    seq: RequestSequence,
    in_flight: Option<MetadataTicket>,
}

impl VersionSelector {
    /// Starts on the newest configured version, not yet applied.
    pub fn new(marks: VersionMarks) -> Self {
        let selected = marks.max();
        Self {
            marks,
            selected,
            applied: None,
            seq: RequestSequence::new(),
            in_flight: None,
        }
    }

    pub fn marks(&self) -> &VersionMarks {
        &self.marks
    }

    /// Value the control shows.
    pub fn selected(&self) -> MapVersion {
        self.selected
    }

    /// Version whose metadata is on screen.
    pub fn applied(&self) -> Option<MapVersion> {
        self.applied
    }

    pub fn in_flight(&self) -> Option<MetadataTicket> {
        self.in_flight
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn select(&mut self, version: MapVersion) -> Result<MetadataTicket, ViewerError> {
        if !self.marks.contains(version) {
            return Err(ViewerError::UnknownVersion(version));
        }
        let ticket = MetadataTicket {
            id: self.seq.issue(),
            version,
        };
        if let Some(prev) = self.in_flight.replace(ticket) {
            debug!(
                superseded = prev.id.0,
                by = ticket.id.0,
                "metadata request superseded"
            );
        }
        self.selected = version;
        Ok(ticket)
    }

    pub fn resolve(
        &mut self,
        ticket: MetadataTicket,
        result: Result<TileSetMetadata, BackendError>,
    ) -> Resolution {
        if !self.seq.is_latest(ticket.id) {
            return Resolution::Stale { ticket };
        }
        self.in_flight = None;
        match result {
            Ok(metadata) => {
                self.applied = Some(ticket.version);
                Resolution::Apply {
                    version: ticket.version,
                    metadata,
                }
            }
            Err(error) => {
                // The control snaps back to what is actually displayed.
                if let Some(applied) = self.applied {
                    self.selected = applied;
                }
                Resolution::Failed { ticket, error }
            }
        }
    }

    /// Demote a response that `resolve` applied but the caller could not use.
    pub fn reject_applied(&mut self, previous: Option<MapVersion>) {
        self.applied = previous;
        if let Some(v) = previous {
            self.selected = v;
        }
    }
}
