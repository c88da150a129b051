//! Dataset fetcher worker.

use anyhow::{Context, Result};
use bevy::log::{debug, error, warn};
use serde_json::Value;
use std::sync::{
    Arc, Mutex,
    mpsc::{self},
};
use std::thread;

use crate::datasource::cache::DatasetCache;
use crate::datasource::types::{
    DataChannels, DataTable, DatasetKind, DatasetRequest, FetchCommand, FetchResult,
};

/// Anything that can answer a dataset request.
// only driven from the worker's own runtime, so no `Send` bound on the future
#[allow(async_fn_in_trait)]
pub trait DataSource {
    async fn fetch(&self, request: &DatasetRequest) -> Result<DataTable>;
}

/// LaTiS `jsond` endpoint with an optional disk cache in front of it.
pub struct LatisSource {
    client: reqwest::Client,
    base_url: String,
    cache: Option<DatasetCache>,
}

impl LatisSource {
    pub fn new(base_url: impl Into<String>, cache: Option<DatasetCache>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            cache,
        }
    }

    fn cached(&self, url: &str) -> Option<DataTable> {
        let cache = self.cache.as_ref()?;
        match cache.read(url) {
            Ok(Some(entry)) if cache.is_valid(&entry) => Some(entry.table),
            Ok(_) => None,
            Err(err) => {
                warn!("dataset cache read failed for {url}: {err}");
                None
            }
        }
    }
}

impl DataSource for LatisSource {
    async fn fetch(&self, request: &DatasetRequest) -> Result<DataTable> {
        let url = request.url(&self.base_url);
        if let Some(table) = self.cached(&url) {
            debug!("cache hit: {url}");
            return Ok(table);
        }

        let body = fetch_body(&self.client, &url).await?;
        let table = parse_jsond(&body).with_context(|| format!("parse {}", request.dataset))?;
        if let Some(cache) = &self.cache
            && let Err(err) = cache.write(&url, &table)
        {
            warn!("dataset cache write failed for {url}: {err}");
        }
        Ok(table)
    }
}

pub fn start_data_worker<S>(source: S) -> DataChannels
where
    S: DataSource + Send + 'static,
{
    let (cmd_tx, cmd_rx) = mpsc::channel::<FetchCommand>();
    let (res_tx, res_rx) = mpsc::channel::<FetchResult>();

    thread::spawn(move || {
        let rt = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(err) => {
                error!("dataset worker: failed to start tokio runtime: {err}");
                return;
            }
        };
        rt.block_on(async move {
            while let Ok(first) = cmd_rx.recv() {
                let mut batch = vec![first];
                while let Ok(more) = cmd_rx.try_recv() {
                    batch.push(more);
                }

                for cmd in coalesce(batch) {
                    let outcome = source
                        .fetch(&cmd.request)
                        .await
                        .map_err(|err| format!("{err:#}"));
                    let msg = FetchResult {
                        input: cmd.input,
                        generation: cmd.generation,
                        outcome,
                    };
                    if res_tx.send(msg).is_err() {
                        return;
                    }
                }
            }
        });
    });

    DataChannels {
        cmd_tx,
        res_rx: Arc::new(Mutex::new(res_rx)),
    }
}

/// Drop queued commands that a later command for the same input supersedes.
pub fn coalesce(batch: Vec<FetchCommand>) -> Vec<FetchCommand> {
    let mut kept: Vec<FetchCommand> = Vec::with_capacity(batch.len());
    for cmd in batch.into_iter().rev() {
        if kept.iter().any(|later| later.input == cmd.input) {
            debug!(
                "dropping superseded {:?} fetch (generation {})",
                cmd.input, cmd.generation
            );
            continue;
        }
        kept.push(cmd);
    }
    kept.reverse();
    kept
}

async fn fetch_body(client: &reqwest::Client, url: &str) -> Result<String> {
    let resp = client
        .get(url)
        .header("accept", "application/json")
        .send()
        .await
        .context("request failed")?;
    let status = resp.status();
    let body = resp.text().await.context("read response")?;
    if !status.is_success() {
        anyhow::bail!("http {} for {}", status, url);
    }
    Ok(body)
}

/// Parse `{"<dataset>": {"data": [[...], ...]}}`.
pub fn parse_jsond(body: &str) -> Result<DataTable> {
    let value: Value = serde_json::from_str(body).context("invalid json")?;
    let Value::Object(obj) = value else {
        anyhow::bail!("expected json object");
    };
    if let Some(message) = extract_error_message(&obj) {
        anyhow::bail!("{}", message);
    }

    let (key, dataset) = obj.iter().next().context("empty response object")?;
    let data = dataset
        .get("data")
        .and_then(Value::as_array)
        .with_context(|| format!("{key}: missing data array"))?;

    let rows = data
        .iter()
        .filter_map(Value::as_array)
        .map(|cells| {
            cells
                .iter()
                .map(|v| value_to_string(v).unwrap_or_default())
                .collect()
        })
        .collect();

    Ok(DataTable {
        kind: DatasetKind::from_key(key),
        rows,
    })
}

fn extract_error_message(obj: &serde_json::Map<String, Value>) -> Option<String> {
    for key in ["error", "message", "detail"] {
        if let Some(Value::String(val)) = obj.get(key) {
            let trimmed = val.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }
    None
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(val) => Some(val.clone()),
        Value::Number(num) => Some(num.to_string()),
        Value::Bool(val) => Some(val.to_string()),
        _ => None,
    }
}
