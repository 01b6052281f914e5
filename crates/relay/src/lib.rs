pub mod drain;
pub mod http;
pub mod kafka;
pub mod logger;
pub mod schedule;
pub mod writer;
