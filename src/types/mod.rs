//! Core domain types shared by the fetcher, transformer, exporter and orchestrator.

pub mod catalog;
pub mod ids;
pub mod record;

pub use catalog::{EVENT_TYPES, EventType, Severity};
pub use ids::{Cursor, display_cursor};
pub use record::{NormalizedLogRecord, RawLogRecord};
