//! HTTP client for the record-store REST API

use std::time::Duration;

use async_trait::async_trait;
use habit_core::{EntityKind, RawRecord};
use reqwest::{header, Client, StatusCode};
use serde_json::{json, Map, Value};
use tracing::{debug, instrument};

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};

/// Generic CRUD over the three record collections.
///
/// The service does no filtering or sorting; `list` returns the whole
/// collection in service order.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn list(&self, kind: EntityKind) -> Result<Vec<RawRecord>>;

    async fn create(&self, kind: EntityKind, fields: Map<String, Value>) -> Result<RawRecord>;

    /// `fields` is partial: keys that are absent stay unchanged.
    async fn update(
        &self,
        kind: EntityKind,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<RawRecord>;

    async fn delete(&self, kind: EntityKind, id: &str) -> Result<()>;
}

pub struct HttpRecordStore {
    config: StoreConfig,
    client: Client,
}

impl HttpRecordStore {
    pub fn new(config: StoreConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref api_key) = config.api_key {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|_| StoreError::InvalidConfig("API key is not a valid header".into()))?;
            headers.insert(header::AUTHORIZATION, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn collection(&self, kind: EntityKind) -> &str {
        self.config.collections.id_for(kind)
    }

    async fn handle_response(&self, response: reqwest::Response) -> Result<Value> {
        if response.status() == StatusCode::NOT_FOUND {
            let url = response.url().to_string();
            return Err(StoreError::NotFound(url));
        }

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Server {
                status,
                message: body,
            });
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    #[instrument(skip(self))]
    async fn list(&self, kind: EntityKind) -> Result<Vec<RawRecord>> {
        let url = self.config.records_url(self.collection(kind));
        let response = self.client.get(&url).send().await?;
        let body = self.handle_response(response).await?;
        let records = parse_list(body)?;
        debug!(%kind, count = records.len(), "records listed");
        Ok(records)
    }

    #[instrument(skip(self, fields))]
    async fn create(&self, kind: EntityKind, fields: Map<String, Value>) -> Result<RawRecord> {
        let url = self.config.records_url(self.collection(kind));
        let response = self
            .client
            .post(&url)
            .json(&json!({ "fields": fields }))
            .send()
            .await?;
        let body = self.handle_response(response).await?;
        parse_record(body, None, fields)
    }

    #[instrument(skip(self, fields))]
    async fn update(
        &self,
        kind: EntityKind,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<RawRecord> {
        let url = self.config.record_url(self.collection(kind), id);
        let response = self
            .client
            .patch(&url)
            .json(&json!({ "fields": fields }))
            .send()
            .await?;
        let body = self.handle_response(response).await?;
        parse_record(body, Some(id), fields)
    }

    #[instrument(skip(self))]
    async fn delete(&self, kind: EntityKind, id: &str) -> Result<()> {
        let url = self.config.record_url(self.collection(kind), id);
        let response = self.client.delete(&url).send().await?;
        self.handle_response(response).await?;
        Ok(())
    }
}

/// Collections come back either as an object keyed by record id or as an
/// array of envelopes. Key order is kept.
pub(crate) fn parse_list(body: Value) -> Result<Vec<RawRecord>> {
    match body {
        Value::Null => Ok(Vec::new()),
        Value::Object(map) => map
            .into_iter()
            .map(|(id, value)| -> Result<RawRecord> {
                let mut record: RawRecord = serde_json::from_value(value)?;
                if record.id.is_empty() {
                    record.id = id;
                }
                Ok(record)
            })
            .collect(),
        Value::Array(items) => items
            .into_iter()
            .map(|value| -> Result<RawRecord> { Ok(serde_json::from_value(value)?) })
            .collect(),
        other => Err(StoreError::InvalidResponse(format!(
            "expected object or array of records, got {}",
            other
        ))),
    }
}

/// Mutation responses may be a full envelope or just the record id.
pub(crate) fn parse_record(
    body: Value,
    id_hint: Option<&str>,
    sent: Map<String, Value>,
) -> Result<RawRecord> {
    if body.get("fields").is_some() {
        let mut record: RawRecord = serde_json::from_value(body)?;
        if record.id.is_empty() {
            record.id = id_hint.unwrap_or_default().to_string();
        }
        return Ok(record);
    }

    let id = body
        .get("record_id")
        .or_else(|| body.get("id"))
        .and_then(Value::as_str)
        .or_else(|| body.as_str())
        .or(id_hint)
        .ok_or_else(|| StoreError::InvalidResponse("response carries no record id".into()))?;

    Ok(RawRecord::new(id, sent))
}
