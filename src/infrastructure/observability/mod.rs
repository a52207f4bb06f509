//! Push-based observability for unitwatch
//!
//! The exporter never serves HTTP. Its own counters are logged on shutdown
//! and can be appended to every gateway push.

pub mod metrics;

pub use metrics::Metrics;
