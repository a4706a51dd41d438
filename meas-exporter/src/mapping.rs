//! Mapping from meas table entries to typed metric samples.
//!
//! Each table type declares a static list of [`RuleSpec`]s. At startup the
//! list is resolved against the [`DescriptorRegistry`] into a [`RuleTable`],
//! which is then the only thing consulted when converting entries.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use prometheus_client::metrics::MetricType;
use thiserror::Error;

use crate::descriptor::{DescriptorRegistry, MetricDescriptor};
use crate::entry::MeasEntry;

/// Rule table construction errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleError {
    #[error("Rule for entry {entry} references unknown metric {metric}")]
    UnknownMetric { entry: String, metric: String },
    #[error("Metric {metric} declares {expected} label(s), rules supply exactly one")]
    LabelCount { metric: String, expected: usize },
    #[error("Duplicate rule for entry {0}")]
    DuplicateEntry(String),
    #[error("Counter rule for entry {entry} targets {metric}, counter names must end in _total")]
    CounterName { entry: String, metric: String },
}

/// Exposition type of a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Counter,
    Gauge,
}

impl MetricKind {
    /// Get the TYPE string for the exposition format.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
        }
    }

    pub fn metric_type(&self) -> MetricType {
        match self {
            MetricKind::Counter => MetricType::Counter,
            MetricKind::Gauge => MetricType::Gauge,
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A metric sample produced from one meas entry.
#[derive(Debug, Clone)]
pub struct MeasMetric {
    pub descriptor: Arc<MetricDescriptor>,
    pub kind: MetricKind,
    pub label_value: String,
    pub value: f64,
}

impl MeasMetric {
    /// Label pairs in descriptor schema order.
    pub fn labels(&self) -> Vec<(&str, &str)> {
        self.descriptor
            .label_names()
            .iter()
            .map(|name| (name.as_str(), self.label_value.as_str()))
            .collect()
    }
}

impl PartialEq for MeasMetric {
    /// Value equality: descriptors compare by content, not by pointer.
    fn eq(&self, other: &Self) -> bool {
        self.descriptor == other.descriptor
            && self.kind == other.kind
            && self.label_value == other.label_value
            && self.value.to_bits() == other.value.to_bits()
    }
}

/// Declarative conversion rule, as written in a table definition.
#[derive(Debug, Clone, Copy)]
pub struct RuleSpec {
    /// Entry name in the meas table.
    pub entry: &'static str,
    /// Target metric name, registered beforehand.
    pub metric: &'static str,
    /// Value of the single label dimension.
    pub label: &'static str,
    pub kind: MetricKind,
}

/// A resolved rule: where an entry goes.
#[derive(Debug, Clone)]
pub struct ConversionRule {
    pub descriptor: Arc<MetricDescriptor>,
    pub label_value: String,
    pub kind: MetricKind,
}

/// Immutable entry name to rule lookup.
#[derive(Debug, Default)]
pub struct RuleTable {
    rules: HashMap<String, ConversionRule>,
}

impl RuleTable {
    /// Resolve rule specs against the registered descriptors.
    pub fn build(specs: &[RuleSpec], registry: &DescriptorRegistry) -> Result<Self, RuleError> {
        let mut rules = HashMap::with_capacity(specs.len());

        for spec in specs {
            let descriptor = registry
                .get(spec.metric)
                .ok_or_else(|| RuleError::UnknownMetric {
                    entry: spec.entry.to_string(),
                    metric: spec.metric.to_string(),
                })?;

            if descriptor.label_names().len() != 1 {
                return Err(RuleError::LabelCount {
                    metric: spec.metric.to_string(),
                    expected: descriptor.label_names().len(),
                });
            }

            // Counter samples are exposed as `<family>_total`
            if spec.kind == MetricKind::Counter && !descriptor.name().ends_with("_total") {
                return Err(RuleError::CounterName {
                    entry: spec.entry.to_string(),
                    metric: spec.metric.to_string(),
                });
            }

            let rule = ConversionRule {
                descriptor: descriptor.clone(),
                label_value: spec.label.to_string(),
                kind: spec.kind,
            };

            if rules.insert(spec.entry.to_string(), rule).is_some() {
                return Err(RuleError::DuplicateEntry(spec.entry.to_string()));
            }
        }

        Ok(Self { rules })
    }

    /// Convert an entry, or `None` when no rule matches its name.
    pub fn map(&self, entry: &MeasEntry) -> Option<MeasMetric> {
        self.rules.get(&entry.name).map(|rule| MeasMetric {
            descriptor: rule.descriptor.clone(),
            kind: rule.kind,
            label_value: rule.label_value.clone(),
            value: entry.value,
        })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
