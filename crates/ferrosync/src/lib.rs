mod counter;
mod error;
mod flag;
mod pool;
mod queue;
mod semaphore;
mod sync;

pub use crate::counter::*;
pub use crate::error::*;
pub use crate::flag::*;
pub use crate::pool::*;
pub use crate::queue::*;
pub use crate::semaphore::*;
