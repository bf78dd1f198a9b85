use streaming::{MapVersion, MetadataError, ObservationId};

/// Failures talking to the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendError {
    /// The request never produced a response (DNS, connect, reset, timeout).
    Transport(String),
    /// Non-2xx response.
    Status { url: String, status: u16 },
    /// Body was not the JSON we expected.
    Decode(String),
    /// Metadata arrived without a required field. Unrecoverable for that fetch.
    MissingField(&'static str),
    /// Metadata parsed but violates an invariant (zoom range, bounds, template).
    InvalidMetadata(String),
}

impl BackendError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, BackendError::MissingField(_))
    }
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::Transport(msg) => write!(f, "request failed: {msg}"),
            BackendError::Status { url, status } => write!(f, "{url} returned HTTP {status}"),
            BackendError::Decode(msg) => write!(f, "malformed response body: {msg}"),
            BackendError::MissingField(name) => write!(f, "missing required field `{name}`"),
            BackendError::InvalidMetadata(msg) => write!(f, "invalid tile-set metadata: {msg}"),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<MetadataError> for BackendError {
    fn from(e: MetadataError) -> Self {
        match e {
            MetadataError::MissingField(name) => BackendError::MissingField(name),
            MetadataError::Json(msg) => BackendError::Decode(msg),
            other => BackendError::InvalidMetadata(other.to_string()),
        }
    }
}

/// Rejected local operations. None of these touch the network.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerError {
    UnknownVersion(MapVersion),
    UnknownObservation(ObservationId),
    EditModeOff,
    MovePending(ObservationId),
    InvalidLocation { lat: f64, lon: f64 },
}

impl std::fmt::Display for ViewerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewerError::UnknownVersion(v) => write!(f, "version {v} is not configured"),
            ViewerError::UnknownObservation(id) => write!(f, "no observation with id {id}"),
            ViewerError::EditModeOff => write!(f, "markers can only be moved in edit mode"),
            ViewerError::MovePending(id) => {
                write!(f, "observation {id} already has a location update in flight")
            }
            ViewerError::InvalidLocation { lat, lon } => {
                write!(f, "location out of range: lat={lat} lon={lon}")
            }
        }
    }
}

impl std::error::Error for ViewerError {}
