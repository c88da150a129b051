//! Data source requests, tables and worker messages.

use bevy::prelude::*;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{
    Arc, Mutex,
    mpsc::{Receiver, Sender},
};

use crate::readiness::{Generation, InputKind};

/// Which dataset a response table came from, resolved once from its top-level key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatasetKind {
    Spice,
    Ngims,
    Mag,
    Static,
    Swia,
    Mgitm,
    Other(String),
}

impl DatasetKind {
    pub fn from_key(key: &str) -> Self {
        match key {
            "in_situ_kp_spice" => DatasetKind::Spice,
            "in_situ_kp_ngims" => DatasetKind::Ngims,
            "in_situ_kp_mag" => DatasetKind::Mag,
            "in_situ_kp_static" => DatasetKind::Static,
            "in_situ_kp_swia" => DatasetKind::Swia,
            "mgitm" => DatasetKind::Mgitm,
            other => DatasetKind::Other(other.to_string()),
        }
    }

    /// Whisker vectors come from exactly these datasets.
    pub fn is_vector_source(&self) -> bool {
        matches!(self, DatasetKind::Mag | DatasetKind::Static | DatasetKind::Swia)
    }
}

/// One projection + selection against the data service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetRequest {
    pub dataset: String,
    /// Projected fields, in the column order the consumer expects.
    pub fields: Vec<String>,
    pub filters: Vec<String>,
}

impl DatasetRequest {
    pub fn new(dataset: impl Into<String>, fields: Vec<String>, filters: Vec<String>) -> Self {
        Self {
            dataset: dataset.into(),
            fields,
            filters,
        }
    }

    /// `{base}{dataset}.jsond?{fields}&{filters}`.
    pub fn url(&self, base: &str) -> String {
        format!(
            "{}{}.jsond?{}&{}",
            base,
            self.dataset,
            self.fields.join(","),
            self.filters.join("&")
        )
    }
}

/// Response rows as strings, one cell per requested field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataTable {
    pub kind: DatasetKind,
    pub rows: Vec<Vec<String>>,
}

/// `time>` / `time<` filters covering the UTC day starting at `day`.
pub fn day_filters(day: NaiveDate) -> Vec<String> {
    let next = day.succ_opt().unwrap_or(day);
    vec![
        format!("time>{}", day.format("%Y-%m-%d")),
        format!("time<{}", next.format("%Y-%m-%d")),
    ]
}

/// Parse the timestamp formats the data service emits.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let value = raw.trim();
    if value.is_empty() || value == "null" {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(Utc.from_utc_datetime(&dt));
        }
    }
    // epoch milliseconds
    let millis = value.parse::<f64>().ok()?;
    if !millis.is_finite() {
        return None;
    }
    let whole = millis.trunc() as i64;
    let nanos = ((millis - millis.trunc()) * 1e6).round() as u32;
    Utc.timestamp_millis_opt(whole)
        .single()
        .map(|dt| dt + chrono::Duration::nanoseconds(nanos as i64))
}

/// Request for the worker, tagged with the input and generation it serves.
#[derive(Debug, Clone)]
pub struct FetchCommand {
    pub input: InputKind,
    pub generation: Generation,
    pub request: DatasetRequest,
}

#[derive(Debug)]
pub struct FetchResult {
    pub input: InputKind,
    pub generation: Generation,
    pub outcome: Result<DataTable, String>,
}

#[derive(Resource)]
pub struct DataChannels {
    pub cmd_tx: Sender<FetchCommand>,
    pub res_rx: Arc<Mutex<Receiver<FetchResult>>>,
}
