//! # HTTP Middleware
//!
//! - `metrics`: request and error counters, Prometheus rendering.
//! - `tracing_layer`: one span per request, tagged with a request id.

pub mod metrics;
pub mod tracing_layer;
