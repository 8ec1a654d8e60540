//! Prometheus exposition helpers.

use anyhow::Result;
use prometheus::{Encoder, Registry, TextEncoder};

/// Render every collector registered on `registry` in the Prometheus text
/// exposition format. Hosts mount this behind their scrape endpoint.
pub fn encode_metrics(registry: &Registry) -> Result<String> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
