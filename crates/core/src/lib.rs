pub mod broker;
pub mod config;
pub mod error;
pub mod format;
pub mod ids;
pub mod model;

pub use error::{RelayError, Result};
