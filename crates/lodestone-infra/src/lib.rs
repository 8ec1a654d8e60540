//! Lodestone Infrastructure Library
//!
//! Cross-cutting concerns with no domain logic: telemetry initialization and
//! Prometheus exposition helpers. Domain code lives in `lodestone-core`,
//! `lodestone-executor`, and `lodestone-sdk`.

pub mod metrics;
pub mod telemetry;

pub use metrics::encode_metrics;
pub use telemetry::{init_telemetry, shutdown_telemetry};
