//! Hostswitch - switchable hosts profiles composed into the system hosts file.

pub mod backend;
pub mod bundle;
pub mod cli;
pub mod compose;
pub mod config;
pub mod doctor;
pub mod error;
pub mod hosts;
pub mod platform;
pub mod policy;
pub mod profile;
pub mod session;
pub mod store;
pub mod sync;
pub mod telemetry;

pub use error::{Error, Result};
