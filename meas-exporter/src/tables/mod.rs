//! Known meas table types and collector assembly.
//!
//! Adding a table type means adding a module with its descriptors, rules and
//! fetcher, plus a [`TableKind`] variant. The collector is not touched.

pub mod diameter;

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::collector::MeasCollector;
use crate::config::{SourceConfig, TableConfig};
use crate::converter::{MeasConverter, TableConverter};
use crate::descriptor::{DescriptorError, DescriptorRegistry};
use crate::fetcher::{EntrySource, MeasFetcher};
use crate::mapping::{RuleError, RuleSpec, RuleTable};

pub use diameter::DiameterMeasFetcher;

/// Startup errors while assembling converters.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
    #[error(transparent)]
    Rule(#[from] RuleError),
}

/// Identity of a meas table type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TableKind {
    #[serde(rename = "diamsch_meas")]
    Diameter,
}

impl TableKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableKind::Diameter => diameter::TABLE,
        }
    }

    pub fn register_descriptors(
        &self,
        registry: &mut DescriptorRegistry,
    ) -> Result<(), DescriptorError> {
        match self {
            TableKind::Diameter => diameter::register_descriptors(registry),
        }
    }

    pub fn rules(&self) -> &'static [RuleSpec] {
        match self {
            TableKind::Diameter => diameter::RULES,
        }
    }

    /// Built-in sample rows for this table.
    pub fn sample_source(&self) -> EntrySource {
        match self {
            TableKind::Diameter => EntrySource::Sample(diameter::sample_entries()),
        }
    }

    pub fn fetcher(&self, source: EntrySource) -> Box<dyn MeasFetcher> {
        match self {
            TableKind::Diameter => Box::new(DiameterMeasFetcher::new(source)),
        }
    }
}

/// Build the collector for the configured tables.
///
/// Each table registers its descriptors into one registry, so configuring
/// two tables that expose the same metric name fails here rather than at
/// scrape time.
pub fn build_collector(tables: &[TableConfig]) -> Result<MeasCollector, SetupError> {
    let mut registry = DescriptorRegistry::new();
    let mut registered = HashSet::new();
    let mut converters: Vec<Box<dyn MeasConverter>> = Vec::with_capacity(tables.len());

    for table in tables {
        if !registered.insert(table.table) {
            // Same table twice would emit the same series twice
            return Err(DescriptorError::Duplicate(table.table.as_str().to_string()).into());
        }
        table.table.register_descriptors(&mut registry)?;
    }

    for table in tables {
        let rules = Arc::new(RuleTable::build(table.table.rules(), &registry)?);
        let source = match &table.source {
            SourceConfig::Sample => table.table.sample_source(),
            SourceConfig::File { path } => EntrySource::File(path.clone()),
        };

        info!(
            table = table.table.as_str(),
            rules = rules.len(),
            source = ?table.source,
            "Configured meas table"
        );

        converters.push(Box::new(TableConverter::new(
            rules,
            table.table.fetcher(source),
        )));
    }

    info!(
        converters = converters.len(),
        descriptors = registry.len(),
        "Descriptor registry built"
    );

    Ok(MeasCollector::new(converters))
}
