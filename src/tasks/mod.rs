//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Expiry sweep: purges expired cache entries at a fixed interval

mod sweeper;

pub use sweeper::spawn_sweep_task;
