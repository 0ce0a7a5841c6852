//! RESP Module
//!
//! Redis-compatible line protocol adapter over the cache engine.
//!
//! # Commands
//! - `PING`, `GET key`, `SET key value [PX ms]`, `DEL key`, `EXISTS key`
//! - `TTL key` / `PTTL key`, `INFO`, `QUIT`

pub mod codec;
pub mod commands;
mod server;

pub use codec::{parse_frame, Frame, Reply};
pub use commands::Command;
pub use server::{handle_connection, serve, MAX_BUFFER_BYTES};
