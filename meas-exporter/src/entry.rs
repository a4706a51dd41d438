//! Rows read from measurement tables.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single named reading from a meas table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasEntry {
    /// Column identifier as defined by the source table.
    pub name: String,
    /// The reading.
    pub value: f64,
}

impl MeasEntry {
    /// Create a new entry.
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

impl fmt::Display for MeasEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_entries_json5() {
        let entries: Vec<MeasEntry> =
            json5::from_str(r#"[{ name: "num_ccr_sent", value: 100 }, { name: "x", value: 1.5 }]"#)
                .unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], MeasEntry::new("num_ccr_sent", 100.0));
        assert_eq!(entries[1].value, 1.5);
    }

    #[test]
    fn test_display() {
        assert_eq!(MeasEntry::new("num_ccr_sent", 100.0).to_string(), "num_ccr_sent=100");
    }
}
