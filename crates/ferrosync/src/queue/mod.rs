mod bounded;
mod buffer;
mod interface;
mod status;
mod unbounded;

pub use bounded::*;
pub use interface::*;
pub use status::*;
pub use unbounded::*;
