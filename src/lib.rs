//! Audit Forwarder - incremental export of identity-platform audit logs to a
//! log-analytics workspace.
//!
//! Each run resumes from a durable checkpoint, pages through every new log
//! event, normalizes it and delivers it to the sink one record at a time.
//! Delivery is at least once.

pub mod checkpoint;
pub mod config;
pub mod credentials;
pub mod run;
pub mod server;
pub mod sink;
pub mod source;
pub mod transform;
pub mod types;

#[cfg(test)]
pub(crate) mod test_utils;
