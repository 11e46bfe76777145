//! Crosscheck Runtime
//!
//! The orchestration layer:
//! - Memory bank: TTL result cache + single-flight deduplication
//! - Metrics: request counters, per-backend accounting, durations
//! - Coordinator: the end-to-end request lifecycle

pub mod coordinator;
pub mod memory;
pub mod metrics;

pub use coordinator::*;
pub use memory::*;
pub use metrics::*;
