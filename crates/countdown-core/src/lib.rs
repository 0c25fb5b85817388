//! `countdown-core`: configuration and process-level errors shared by the
//! timer crates and the gateway binary.

pub mod config;
pub mod error;

pub use config::CountdownConfig;
pub use error::{CountdownError, Result};
