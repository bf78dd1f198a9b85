pub mod protocol;
pub mod template;
pub mod zoom;

pub use protocol::*;
pub use template::*;
pub use zoom::*;
