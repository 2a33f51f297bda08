//! InfluxDB line protocol output formatter.

use crate::mac_address::MacAddress;
use crate::output::OutputFormatter;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;

/// Field values for InfluxDB line protocol
#[derive(Debug, PartialEq)]
pub enum FieldValue {
    Boolean(bool),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FieldValue::Boolean(b) => write!(f, "{b}"),
        }
    }
}

/// Escape a tag key or value: commas, equals signs and spaces are significant.
fn escape_tag(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, ',' | '=' | ' ' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Data point in InfluxDB line protocol
#[derive(Debug)]
pub struct DataPoint {
    pub measurement: String,
    pub tag_set: BTreeMap<String, String>,
    pub field_set: BTreeMap<String, FieldValue>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl fmt::Display for DataPoint {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}", self.measurement.replace(',', "\\,").replace(' ', "\\ "))?;
        for (key, value) in &self.tag_set {
            write!(fmt, ",{}={}", escape_tag(key), escape_tag(value))?;
        }

        let fields: Vec<String> = self
            .field_set
            .iter()
            .map(|(key, value)| format!("{}={}", escape_tag(key), value))
            .collect();
        write!(fmt, " {}", fields.join(","))?;

        if let Some(nanos) = self.timestamp.and_then(|t| t.timestamp_nanos_opt()) {
            write!(fmt, " {}", nanos)?;
        }
        Ok(())
    }
}

/// InfluxDB line protocol formatter.
///
/// Every present device becomes a point tagged with its address and name and
/// a single `present=true` field.
pub struct InfluxDbFormatter {
    /// The measurement name in InfluxDB
    measurement_name: String,
}

impl InfluxDbFormatter {
    pub fn new(measurement_name: String) -> Self {
        Self { measurement_name }
    }

    fn to_data_point(&self, id: MacAddress, name: &str, timestamp: DateTime<Utc>) -> DataPoint {
        let mut tag_set = BTreeMap::new();
        tag_set.insert("mac".to_string(), id.to_string());
        tag_set.insert("name".to_string(), name.to_string());

        let mut field_set = BTreeMap::new();
        field_set.insert("present".to_string(), FieldValue::Boolean(true));

        DataPoint {
            measurement: self.measurement_name.clone(),
            tag_set,
            field_set,
            timestamp: Some(timestamp),
        }
    }
}

impl OutputFormatter for InfluxDbFormatter {
    fn format(&self, id: MacAddress, name: &str, timestamp: DateTime<Utc>) -> String {
        self.to_data_point(id, name, timestamp).to_string()
    }
}
