//! Converters turn a table's entries into metric samples.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::entry::MeasEntry;
use crate::fetcher::{FetchError, MeasFetcher};
use crate::mapping::{MeasMetric, RuleTable};

/// Converts the rows of one meas table into samples.
pub trait MeasConverter: std::fmt::Debug + Send + Sync {
    /// The fetcher this converter reads from.
    fn fetcher(&self) -> &dyn MeasFetcher;

    /// Convert a single entry. Unknown entries yield `None`.
    fn map_entry(&self, entry: &MeasEntry) -> Option<MeasMetric>;

    /// Fetch the table once and convert every recognized entry, in order.
    fn build_metrics(&self) -> Result<Vec<MeasMetric>, FetchError> {
        let entries = self.fetcher().entries()?;
        let total = entries.len();

        let metrics: Vec<MeasMetric> = entries
            .iter()
            .filter_map(|entry| {
                let metric = self.map_entry(entry);
                if metric.is_none() {
                    trace!(table = self.fetcher().table(), %entry, "No rule for entry");
                }
                metric
            })
            .collect();

        debug!(
            table = self.fetcher().table(),
            entries = total,
            metrics = metrics.len(),
            "Converted meas table"
        );

        Ok(metrics)
    }
}

/// Rule-table driven converter owning its fetcher.
#[derive(Debug)]
pub struct TableConverter {
    rules: Arc<RuleTable>,
    fetcher: Box<dyn MeasFetcher>,
}

impl TableConverter {
    pub fn new(rules: Arc<RuleTable>, fetcher: Box<dyn MeasFetcher>) -> Self {
        Self { rules, fetcher }
    }
}

impl MeasConverter for TableConverter {
    fn fetcher(&self) -> &dyn MeasFetcher {
        self.fetcher.as_ref()
    }

    fn map_entry(&self, entry: &MeasEntry) -> Option<MeasMetric> {
        self.rules.map(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::DescriptorRegistry;
    use crate::fetcher::EntrySource;
    use crate::mapping::{MetricKind, RuleSpec};

    #[derive(Debug)]
    struct FixedFetcher(EntrySource);

    impl MeasFetcher for FixedFetcher {
        fn table(&self) -> &str {
            "fixed"
        }

        fn entries(&self) -> Result<Vec<MeasEntry>, FetchError> {
            self.0.read("fixed")
        }
    }

    fn converter(entries: Vec<MeasEntry>) -> TableConverter {
        let mut registry = DescriptorRegistry::new();
        registry.register("hits_total", "Hits.", &["type"]).unwrap();
        let specs = [
            RuleSpec {
                entry: "hits_a",
                metric: "hits_total",
                label: "A",
                kind: MetricKind::Counter,
            },
            RuleSpec {
                entry: "hits_b",
                metric: "hits_total",
                label: "B",
                kind: MetricKind::Counter,
            },
        ];
        let rules = Arc::new(RuleTable::build(&specs, &registry).unwrap());

        TableConverter::new(rules, Box::new(FixedFetcher(EntrySource::Sample(entries))))
    }

    #[test]
    fn test_build_metrics_filters_unknown() {
        let conv = converter(vec![
            MeasEntry::new("hits_b", 2.0),
            MeasEntry::new("unknown", 9.0),
            MeasEntry::new("hits_a", 1.0),
        ]);

        let metrics = conv.build_metrics().unwrap();
        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics[0].label_value, "B");
        assert_eq!(metrics[0].value, 2.0);
        assert_eq!(metrics[1].label_value, "A");
    }

    #[test]
    fn test_build_metrics_empty() {
        let conv = converter(Vec::new());
        assert!(conv.build_metrics().unwrap().is_empty());
    }

    #[test]
    fn test_build_metrics_repeatable() {
        let conv = converter(vec![MeasEntry::new("hits_a", 5.0)]);
        assert_eq!(conv.build_metrics().unwrap(), conv.build_metrics().unwrap());
    }

    #[test]
    fn test_build_metrics_fetch_error() {
        let conv = converter(vec![MeasEntry::new("", 1.0)]);
        assert!(conv.build_metrics().is_err());
    }
}
