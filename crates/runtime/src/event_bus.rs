/// Severity of a recorded event.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventLevel {
    Info,
    Warn,
    Error,
}

/// Structured record of something the viewer did or failed to do.
///
/// Hosts drain these to surface failures; the viewer itself only appends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// 0-based emission order within the bus.
    pub seq: u64,
    pub level: EventLevel,
    pub kind: &'static str,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct EventBus {
    next_seq: u64,
    events: Vec<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, level: EventLevel, kind: &'static str, message: impl Into<String>) {
        self.events.push(Event {
            seq: self.next_seq,
            level,
            kind,
            message: message.into(),
        });
        self.next_seq += 1;
    }

    pub fn info(&mut self, kind: &'static str, message: impl Into<String>) {
        self.emit(EventLevel::Info, kind, message);
    }

    pub fn warn(&mut self, kind: &'static str, message: impl Into<String>) {
        self.emit(EventLevel::Warn, kind, message);
    }

    pub fn error(&mut self, kind: &'static str, message: impl Into<String>) {
        self.emit(EventLevel::Error, kind, message);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Events of `kind`, in emission order.
    pub fn of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Event> + 'a {
        self.events.iter().filter(move |e| e.kind == kind)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Event> {
        self.events.iter().filter(|e| e.level == EventLevel::Error)
    }

    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}
