//! The `diamsch_meas` table: Diameter peer message and latency counters.

use crate::descriptor::{DescriptorError, DescriptorRegistry};
use crate::entry::MeasEntry;
use crate::fetcher::{EntrySource, FetchError, MeasFetcher};
use crate::mapping::{MetricKind, RuleSpec};

/// Table identity.
pub const TABLE: &str = "diamsch_meas";

pub const AVG_RESPONSE: &str = "diamsch_avg_response_milliseconds";
pub const MIN_RESPONSE: &str = "diamsch_min_response_milliseconds";
pub const MAX_RESPONSE: &str = "diamsch_max_response_milliseconds";
pub const SENT_MESSAGES: &str = "diamsch_sent_messages_total";
pub const RECEIVED_MESSAGES: &str = "diamsch_received_messages_total";

const LABELS: &[&str] = &["type"];

/// Register the Diameter descriptors.
pub fn register_descriptors(registry: &mut DescriptorRegistry) -> Result<(), DescriptorError> {
    registry.register(
        AVG_RESPONSE,
        "Average time interval between the request messages sent and response messages received operations.",
        LABELS,
    )?;
    registry.register(
        MIN_RESPONSE,
        "Minimum time interval between the request messages sent and response messages received operations.",
        LABELS,
    )?;
    registry.register(
        MAX_RESPONSE,
        "Maximum time interval between the request messages sent and response messages received operations.",
        LABELS,
    )?;
    registry.register(
        SENT_MESSAGES,
        "Number diameter messages sent to the remote host.",
        LABELS,
    )?;
    registry.register(
        RECEIVED_MESSAGES,
        "Number diameter messages received from the remote host.",
        LABELS,
    )?;
    Ok(())
}

const fn counter(entry: &'static str, metric: &'static str, label: &'static str) -> RuleSpec {
    RuleSpec {
        entry,
        metric,
        label,
        kind: MetricKind::Counter,
    }
}

const fn gauge(entry: &'static str, metric: &'static str, label: &'static str) -> RuleSpec {
    RuleSpec {
        entry,
        metric,
        label,
        kind: MetricKind::Gauge,
    }
}

/// Entry name to metric rules for `diamsch_meas`.
pub const RULES: &[RuleSpec] = &[
    // Request/answer message counts
    counter("num_ccr_sent", SENT_MESSAGES, "CCR"),
    counter("num_udr_sent", SENT_MESSAGES, "UDR"),
    counter("num_cca_rcvd", RECEIVED_MESSAGES, "CCA"),
    counter("num_uda_rcvd", RECEIVED_MESSAGES, "UDA"),
    // Response times
    gauge("avg_tm_ccr_rsp", AVG_RESPONSE, "CCR"),
    gauge("avg_tm_udr_rsp", AVG_RESPONSE, "UDR"),
    gauge("min_tm_ccr_rsp", MIN_RESPONSE, "CCR"),
    gauge("min_tm_udr_rsp", MIN_RESPONSE, "UDR"),
    gauge("max_tm_ccr_rsp", MAX_RESPONSE, "CCR"),
    gauge("max_tm_udr_rsp", MAX_RESPONSE, "UDR"),
    // Result code classes
    counter("num_info_1xxx_rcvd", RECEIVED_MESSAGES, "1xxx"),
    counter("num_succ_2xxx_rcvd", RECEIVED_MESSAGES, "2xxx"),
    counter("num_err_3xxx_rcvd", RECEIVED_MESSAGES, "3xxx"),
    counter("num_tran_4xxx_rcvd", RECEIVED_MESSAGES, "4xxx"),
    counter("num_perm_5xxx_rcvd", RECEIVED_MESSAGES, "5xxx"),
    counter("num_info_1xxx_sent", SENT_MESSAGES, "1xxx"),
    counter("num_succ_2xxx_sent", SENT_MESSAGES, "2xxx"),
    counter("num_err_3xxx_sent", SENT_MESSAGES, "3xxx"),
    counter("num_tran_4xxx_sent", SENT_MESSAGES, "4xxx"),
    counter("num_perm_5xxx_sent", SENT_MESSAGES, "5xxx"),
];

/// Built-in sample rows, used until the table is backed by a real source.
pub fn sample_entries() -> Vec<MeasEntry> {
    vec![
        MeasEntry::new("avg_tm_ccr_rsp", 3000.0),
        MeasEntry::new("min_tm_ccr_rsp", 2000.0),
        MeasEntry::new("max_tm_ccr_rsp", 4000.0),
        MeasEntry::new("num_ccr_sent", 100.0),
        MeasEntry::new("num_udr_sent", 30.0),
        MeasEntry::new("num_cca_rcvd", 100.0),
        MeasEntry::new("num_uda_rcvd", 30.0),
        MeasEntry::new("so_para_ver_se_chora", 10.0),
    ]
}

/// Fetcher for `diamsch_meas`.
#[derive(Debug, Clone)]
pub struct DiameterMeasFetcher {
    source: EntrySource,
}

impl DiameterMeasFetcher {
    pub fn new(source: EntrySource) -> Self {
        Self { source }
    }

    /// Fetcher over the built-in sample rows.
    pub fn sample() -> Self {
        Self::new(EntrySource::Sample(sample_entries()))
    }
}

impl MeasFetcher for DiameterMeasFetcher {
    fn table(&self) -> &str {
        TABLE
    }

    fn entries(&self) -> Result<Vec<MeasEntry>, FetchError> {
        self.source.read(TABLE)
    }
}
