pub mod event_bus;
pub mod sequence;

pub use event_bus::*;
pub use sequence::*;
