mod config;
mod manager;
mod panic;
#[cfg(test)]
mod tests;
mod wait_group;
mod worker;

pub use config::*;
pub use manager::*;
pub use panic::*;
pub use wait_group::*;
