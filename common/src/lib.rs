// Common library shared between the scheduler binary and its tests

pub mod bootstrap;
pub mod config;
pub mod errors;
pub mod scheduler;
pub mod trigger;
