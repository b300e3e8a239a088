use crate::models::ReportRecord;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("Other: {0}")]
    Other(String),
}

/// Persists report records and looks them up by id. Archives that can host a
/// shareable copy of the report body also publish one and return its URL.
#[async_trait]
pub trait Archive: Send + Sync {
    fn name(&self) -> &'static str;

    async fn save(&self, record: &ReportRecord) -> Result<(), ArchiveError>;

    async fn get(&self, report_id: &str) -> Result<Option<ReportRecord>, ArchiveError>;

    async fn publish_document(
        &self,
        _report_id: &str,
        _body: &str,
    ) -> Result<Option<String>, ArchiveError> {
        Ok(None)
    }
}

/// Process-local record store. Always on: it backs `GET /get_report` even
/// when every external archive is disabled.
#[derive(Default)]
pub struct MemoryArchive {
    records: Arc<RwLock<HashMap<String, ReportRecord>>>,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Archive for MemoryArchive {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn save(&self, record: &ReportRecord) -> Result<(), ArchiveError> {
        self.records
            .write()
            .insert(record.report_id.clone(), record.clone());
        debug!("Report {} stored in memory", record.report_id);
        Ok(())
    }

    async fn get(&self, report_id: &str) -> Result<Option<ReportRecord>, ArchiveError> {
        Ok(self.records.read().get(report_id).cloned())
    }
}

/// Spreadsheet-style archive behind an HTTP API: appends one row per report
/// and can publish the report body as a shared document. Credentials are an
/// opaque API key; the row layout mirrors the report record fields.
pub struct SheetApiArchive {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    sheet_name: String,
}

impl SheetApiArchive {
    pub fn new(base_url: String, api_key: String, sheet_name: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
            sheet_name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PublishResponse {
    url: String,
}

#[async_trait]
impl Archive for SheetApiArchive {
    fn name(&self) -> &'static str {
        "sheet"
    }

    async fn save(&self, record: &ReportRecord) -> Result<(), ArchiveError> {
        let url = format!("{}/sheets/{}/rows", self.base_url, self.sheet_name);
        let payload = json!({
            "row": [
                record.report_id,
                record.client_name,
                record.client_email,
                record.industry,
                record.pdf_url,
                record.doc_url,
                record.created_at.to_rfc3339(),
            ]
        });
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ArchiveError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ArchiveError::Http(format!("status={status} body={body}")));
        }
        info!("✅ Report {} appended to sheet '{}'", record.report_id, self.sheet_name);
        Ok(())
    }

    async fn get(&self, report_id: &str) -> Result<Option<ReportRecord>, ArchiveError> {
        let url = format!(
            "{}/sheets/{}/rows/{report_id}",
            self.base_url, self.sheet_name
        );
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| ArchiveError::Http(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ArchiveError::Http(format!("status={status} body={body}")));
        }
        let record = response
            .json::<ReportRecord>()
            .await
            .map_err(|e| ArchiveError::Other(format!("parse error: {e}")))?;
        Ok(Some(record))
    }

    async fn publish_document(
        &self,
        report_id: &str,
        body: &str,
    ) -> Result<Option<String>, ArchiveError> {
        let url = format!("{}/documents", self.base_url);
        let payload = json!({
            "title": format!("AI Insights Report - {report_id}"),
            "content": body,
        });
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ArchiveError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ArchiveError::Http(format!("status={status} body={body}")));
        }
        let parsed: PublishResponse = response
            .json()
            .await
            .map_err(|e| ArchiveError::Other(format!("parse error: {e}")))?;
        info!("✅ Document published: {}", parsed.url);
        Ok(Some(parsed.url))
    }
}
