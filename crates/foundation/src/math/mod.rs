pub mod geodesy;
pub mod mercator;
pub mod projection;

pub use geodesy::*;
pub use mercator::*;
pub use projection::*;
