//! Viewer core for versioned raster tile sets with draggable observations.
//!
//! The crate owns state and policy only; a rendering host feeds it user
//! events and draws what it reports.

pub mod backend;
pub mod config;
pub mod error;
pub mod observations;
pub mod selector;
pub mod session;
pub mod tiles;
pub mod versions;
pub mod viewport;

pub use backend::*;
pub use config::*;
pub use error::*;
pub use observations::*;
pub use selector::*;
pub use session::*;
pub use tiles::*;
pub use versions::*;
pub use viewport::*;
