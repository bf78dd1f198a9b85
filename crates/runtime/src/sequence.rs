/// Identifies an issued request. Ids are strictly increasing per sequence.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub u64);

/// Monotonic request id source with "latest wins" bookkeeping.
///
/// A response is only worth applying when its id is the most recent one
/// issued; anything older has been superseded, whatever order it completes in.
#[derive(Debug, Default)]
pub struct RequestSequence {
    latest: Option<RequestId>,
}

impl RequestSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self) -> RequestId {
        let next = self.latest.map_or(1, |RequestId(n)| n + 1);
        let id = RequestId(next);
        self.latest = Some(id);
        id
    }

    pub fn latest(&self) -> Option<RequestId> {
        self.latest
    }

    pub fn is_latest(&self, id: RequestId) -> bool {
        self.latest == Some(id)
    }
}
