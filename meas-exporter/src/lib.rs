//! Prometheus exporter for measurement tables.
//!
//! On every scrape the exporter reads the configured meas tables, converts
//! each row to a typed, labeled sample through a static rule table, and
//! serves the result on an HTTP `/metrics` endpoint. Nothing is kept between
//! scrapes.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │   MeasFetcher   │────>│  MeasConverter  │────>│  MeasCollector  │──> /metrics
//! │  (table rows)   │     │  (rule table)   │     │  (per scrape)   │
//! └─────────────────┘     └─────────────────┘     └─────────────────┘
//! ```
//!
//! # Usage
//!
//! ```bash
//! meas-exporter --config config.json5
//! ```
//!
//! See [`config::ExporterConfig`] for configuration options.

pub mod collector;
pub mod config;
pub mod converter;
pub mod descriptor;
pub mod entry;
pub mod exposition;
pub mod fetcher;
pub mod http;
pub mod mapping;
pub mod tables;

pub use collector::MeasCollector;
pub use config::ExporterConfig;
pub use converter::{MeasConverter, TableConverter};
pub use descriptor::{DescriptorRegistry, MetricDescriptor};
pub use entry::MeasEntry;
pub use exposition::{Exposition, SharedExposition};
pub use fetcher::{EntrySource, FetchError, MeasFetcher};
pub use http::HttpServer;
pub use mapping::{MeasMetric, MetricKind};
pub use tables::{DiameterMeasFetcher, TableKind, build_collector};
