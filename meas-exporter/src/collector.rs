//! Scrape-time collector rebuilding every metric from its converters.

use std::sync::Arc;

use prometheus_client::collector::Collector;
use prometheus_client::encoding::{DescriptorEncoder, EncodeMetric};
use prometheus_client::metrics::counter::ConstCounter;
use prometheus_client::metrics::gauge::ConstGauge;
use tracing::{debug, warn};

use crate::converter::MeasConverter;
use crate::descriptor::MetricDescriptor;
use crate::mapping::{MeasMetric, MetricKind};

/// Collects samples from all converters on every scrape.
///
/// Holds no state between scrapes: each call fetches and converts every
/// table again.
#[derive(Debug, Default)]
pub struct MeasCollector {
    converters: Vec<Box<dyn MeasConverter>>,
}

/// Samples sharing one descriptor, in emission order.
#[derive(Debug)]
pub struct MetricFamily<'a> {
    pub descriptor: &'a Arc<MetricDescriptor>,
    pub kind: MetricKind,
    pub samples: Vec<&'a MeasMetric>,
}

impl MeasCollector {
    pub fn new(converters: Vec<Box<dyn MeasConverter>>) -> Self {
        Self { converters }
    }

    pub fn converter_count(&self) -> usize {
        self.converters.len()
    }

    /// Build the current samples of every converter, in converter order.
    ///
    /// A converter whose fetch fails contributes nothing to this scrape.
    pub fn collect(&self) -> Vec<MeasMetric> {
        let mut metrics = Vec::new();

        for converter in &self.converters {
            match converter.build_metrics() {
                Ok(mut built) => metrics.append(&mut built),
                Err(e) => {
                    warn!(
                        table = converter.fetcher().table(),
                        error = %e,
                        "Failed to fetch meas table, skipping for this scrape"
                    );
                }
            }
        }

        debug!(
            converters = self.converters.len(),
            samples = metrics.len(),
            "Collected meas metrics"
        );

        metrics
    }

    /// Descriptors the collector currently emits, in first-emission order.
    ///
    /// Runs a full collection and discards the values.
    pub fn describe(&self) -> Vec<Arc<MetricDescriptor>> {
        let metrics = self.collect();
        group_by_descriptor(&metrics)
            .into_iter()
            .map(|family| family.descriptor.clone())
            .collect()
    }
}

/// Group samples by metric name, keeping first-appearance order.
///
/// A family takes the kind of its first sample; later samples of another
/// kind cannot share its TYPE line and are dropped. A series appears at most
/// once per scrape: a repeated label value keeps the first sample.
pub fn group_by_descriptor(metrics: &[MeasMetric]) -> Vec<MetricFamily<'_>> {
    let mut families: Vec<MetricFamily<'_>> = Vec::new();

    for metric in metrics {
        match families
            .iter_mut()
            .find(|f| f.descriptor.name() == metric.descriptor.name())
        {
            Some(family)
                if family
                    .samples
                    .iter()
                    .any(|s| s.label_value == metric.label_value) =>
            {
                warn!(
                    metric = metric.descriptor.name(),
                    label = %metric.label_value,
                    value = metric.value,
                    "Duplicate series, dropping sample"
                );
            }
            Some(family) if family.kind == metric.kind => family.samples.push(metric),
            Some(family) => {
                warn!(
                    metric = metric.descriptor.name(),
                    expected = %family.kind,
                    got = %metric.kind,
                    label = %metric.label_value,
                    "Metric kind mismatch, dropping sample"
                );
            }
            None => families.push(MetricFamily {
                descriptor: &metric.descriptor,
                kind: metric.kind,
                samples: vec![metric],
            }),
        }
    }

    families
}

impl Collector for MeasCollector {
    fn encode(&self, mut encoder: DescriptorEncoder) -> Result<(), std::fmt::Error> {
        let metrics = self.collect();

        for family in group_by_descriptor(&metrics) {
            let mut metric_encoder = encoder.encode_descriptor(
                family
                    .descriptor
                    .family_name(family.kind == MetricKind::Counter),
                family.descriptor.help(),
                None,
                family.kind.metric_type(),
            )?;

            for sample in family.samples {
                let labels = sample.labels();
                let sample_encoder = metric_encoder.encode_family(&labels)?;
                match family.kind {
                    MetricKind::Counter => ConstCounter::new(sample.value).encode(sample_encoder)?,
                    MetricKind::Gauge => ConstGauge::new(sample.value).encode(sample_encoder)?,
                }
            }
        }

        Ok(())
    }
}
