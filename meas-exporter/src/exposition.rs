//! Exposition registry rendering the text format served on `/metrics`.

use std::sync::Arc;

use prometheus_client::encoding::text::encode;
use prometheus_client::registry::Registry;

use crate::collector::MeasCollector;

/// Content type of the rendered exposition.
pub const CONTENT_TYPE: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

/// Registry holding the meas collector.
#[derive(Debug)]
pub struct Exposition {
    registry: Registry,
    converter_count: usize,
}

impl Exposition {
    pub fn new(collector: MeasCollector) -> Self {
        let converter_count = collector.converter_count();
        let mut registry = Registry::default();
        registry.register_collector(Box::new(collector));

        Self {
            registry,
            converter_count,
        }
    }

    /// Run one full collection and render it.
    pub fn render(&self) -> Result<String, std::fmt::Error> {
        let mut buffer = String::new();
        encode(&mut buffer, &self.registry)?;
        Ok(buffer)
    }

    pub fn converter_count(&self) -> usize {
        self.converter_count
    }
}

/// Shareable exposition handle.
pub type SharedExposition = Arc<Exposition>;
