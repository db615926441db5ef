mod counting;
mod permit;

pub use counting::*;
pub use permit::*;
