//! Metric descriptors and the startup-time descriptor registry.
//!
//! Descriptors are the static identity of a metric: name, help text and
//! label schema. They are registered once while the exporter starts up and
//! shared as `Arc<MetricDescriptor>` by every sample that uses them.

use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;

/// Descriptor registration errors. Any of these is fatal at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("Duplicate metric name: {0}")]
    Duplicate(String),
    #[error("Invalid metric name: {0:?}")]
    InvalidName(String),
    #[error("Invalid label name {label:?} for metric {metric}")]
    InvalidLabel { metric: String, label: String },
}

/// Static identity of an exposed metric.
#[derive(Debug, PartialEq, Eq)]
pub struct MetricDescriptor {
    metric_name: String,
    help: String,
    label_names: Vec<String>,
}

impl MetricDescriptor {
    /// Full metric name as it appears on the sample lines.
    pub fn name(&self) -> &str {
        &self.metric_name
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    /// Ordered label schema.
    pub fn label_names(&self) -> &[String] {
        &self.label_names
    }

    /// Name handed to the exposition encoder.
    ///
    /// The encoder appends `_total` to counter samples itself, so counter
    /// names lose that suffix here.
    pub fn family_name(&self, counter: bool) -> &str {
        if counter {
            self.metric_name
                .strip_suffix("_total")
                .unwrap_or(&self.metric_name)
        } else {
            &self.metric_name
        }
    }
}

/// Set of all descriptors known to the process.
///
/// Built once before any collector exists, then only read.
#[derive(Debug, Default)]
pub struct DescriptorRegistry {
    names: HashSet<String>,
    descriptors: Vec<Arc<MetricDescriptor>>,
}

impl DescriptorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor, rejecting invalid or already used names.
    pub fn register(
        &mut self,
        name: &str,
        help: &str,
        label_names: &[&str],
    ) -> Result<Arc<MetricDescriptor>, DescriptorError> {
        if !is_valid_metric_name(name) {
            return Err(DescriptorError::InvalidName(name.to_string()));
        }

        if let Some(label) = label_names.iter().find(|l| !is_valid_label_name(l)) {
            return Err(DescriptorError::InvalidLabel {
                metric: name.to_string(),
                label: label.to_string(),
            });
        }

        if !self.names.insert(name.to_string()) {
            return Err(DescriptorError::Duplicate(name.to_string()));
        }

        let descriptor = Arc::new(MetricDescriptor {
            metric_name: name.to_string(),
            help: help.to_string(),
            label_names: label_names.iter().map(|l| l.to_string()).collect(),
        });
        self.descriptors.push(descriptor.clone());

        Ok(descriptor)
    }

    /// Look up a registered descriptor by metric name.
    pub fn get(&self, name: &str) -> Option<&Arc<MetricDescriptor>> {
        self.descriptors.iter().find(|d| d.metric_name == name)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// Check a metric name against `[a-zA-Z_:][a-zA-Z0-9_:]*`.
pub fn is_valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

/// Check a label name against `[a-zA-Z_][a-zA-Z0-9_]*`.
///
/// Names starting with `__` are reserved by Prometheus.
pub fn is_valid_label_name(name: &str) -> bool {
    if name.starts_with("__") {
        return false;
    }
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_get() {
        let mut registry = DescriptorRegistry::new();
        let desc = registry
            .register("diamsch_sent_messages_total", "Sent messages.", &["type"])
            .unwrap();

        assert_eq!(desc.name(), "diamsch_sent_messages_total");
        assert_eq!(desc.help(), "Sent messages.");
        assert_eq!(desc.label_names(), ["type".to_string()]);
        assert!(Arc::ptr_eq(
            registry.get("diamsch_sent_messages_total").unwrap(),
            &desc
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_duplicate() {
        let mut registry = DescriptorRegistry::new();
        registry.register("requests_total", "a", &["type"]).unwrap();

        let err = registry.register("requests_total", "b", &[]).unwrap_err();
        assert_eq!(err, DescriptorError::Duplicate("requests_total".to_string()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_invalid_names() {
        let mut registry = DescriptorRegistry::new();

        assert!(matches!(
            registry.register("1bad", "", &[]),
            Err(DescriptorError::InvalidName(_))
        ));
        assert!(matches!(
            registry.register("ok_name", "", &["bad-label"]),
            Err(DescriptorError::InvalidLabel { .. })
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_family_name() {
        let mut registry = DescriptorRegistry::new();
        let counter = registry.register("sent_total", "", &[]).unwrap();
        let gauge = registry.register("latency_milliseconds", "", &[]).unwrap();

        assert_eq!(counter.family_name(true), "sent");
        assert_eq!(counter.family_name(false), "sent_total");
        assert_eq!(gauge.family_name(true), "latency_milliseconds");
    }

    #[test]
    fn test_metric_name_validation() {
        assert!(is_valid_metric_name("cpu_usage"));
        assert!(is_valid_metric_name("foo:bar:baz"));
        assert!(is_valid_metric_name("_hidden"));
        assert!(!is_valid_metric_name(""));
        assert!(!is_valid_metric_name("1cpu"));
        assert!(!is_valid_metric_name("cpu.usage"));
    }

    #[test]
    fn test_label_name_validation() {
        assert!(is_valid_label_name("type"));
        assert!(is_valid_label_name("_x1"));
        assert!(!is_valid_label_name("__meta"));
        assert!(!is_valid_label_name("device-id"));
        assert!(!is_valid_label_name(""));
        assert!(!is_valid_label_name("a:b"));
    }
}
