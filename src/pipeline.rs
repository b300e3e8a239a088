//! The report assembly pipeline: validate, generate, render, archive,
//! notify. Validation is the only stage that can fail the request; content
//! generation and rendering degrade to placeholders, and every archive or
//! notifier call is isolated so one collaborator outage never takes down a
//! sibling or the response.

use crate::archive::Archive;
use crate::llm::{mock_report_content, ContentGenerator};
use crate::models::{ReportParams, ReportRecord, ReportRequest, ValidationErrors};
use crate::notify::Notifier;
use crate::render::DocumentRenderer;
use crate::sections::{render_report_html, render_report_text, split_sections};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info};

/// What one pipeline run hands back to the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineResult {
    pub report_id: String,
    pub pdf_url: Option<String>,
    pub doc_url: Option<String>,
}

pub struct ReportPipeline {
    question_count: usize,
    generator: Option<Arc<dyn ContentGenerator>>,
    renderer: Option<Arc<dyn DocumentRenderer>>,
    archives: Vec<Arc<dyn Archive>>,
    notifiers: Vec<Arc<dyn Notifier>>,
}

impl ReportPipeline {
    pub fn new(question_count: usize) -> Self {
        Self {
            question_count,
            generator: None,
            renderer: None,
            archives: Vec::new(),
            notifiers: Vec::new(),
        }
    }

    pub fn with_generator(mut self, generator: Arc<dyn ContentGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn DocumentRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn with_archive(mut self, archive: Arc<dyn Archive>) -> Self {
        self.archives.push(archive);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifiers.push(notifier);
        self
    }

    /// Runs one request end to end. Returns `Err` only for validation
    /// failures, before any collaborator is called.
    pub async fn assemble(&self, params: &ReportParams) -> Result<PipelineResult, ValidationErrors> {
        let request = ReportRequest::validate(params, self.question_count)?;
        info!(
            "🚀 Generating report for {} ({})",
            request.client_name, request.industry
        );

        let text = match &self.generator {
            Some(generator) => match generator.generate(&request).await {
                Ok(text) => text,
                Err(e) => {
                    error!("❌ Content generation failed, substituting mock content: {e}");
                    mock_report_content(&request)
                }
            },
            None => {
                info!("Content generator disabled, substituting mock content");
                mock_report_content(&request)
            }
        };

        let content = split_sections(&text, &request.toggles);
        let html = render_report_html(&request.client_name, &request.industry, &content);

        let pdf_url = match &self.renderer {
            Some(renderer) => match renderer.render(&html).await {
                Ok(url) => Some(url),
                Err(e) => {
                    error!("❌ PDF rendering failed: {e}");
                    None
                }
            },
            None => None,
        };

        // Stamped after rendering: the id names a completed attempt, not an
        // arrival. Same-second collisions are accepted.
        let report_id = Utc::now().timestamp().to_string();

        // Document archives get the plain-text rendition, not the HTML shell.
        let text_body = render_report_text(&content);
        let mut doc_url = None;
        for archive in &self.archives {
            match archive.publish_document(&report_id, &text_body).await {
                Ok(Some(url)) => {
                    doc_url = Some(url);
                    break;
                }
                Ok(None) => {}
                Err(e) => {
                    error!("❌ Archive '{}' could not publish a document: {e}", archive.name());
                }
            }
        }

        let record = ReportRecord {
            report_id,
            client_name: request.client_name.clone(),
            client_email: request.client_email.clone(),
            industry: request.industry.clone(),
            pdf_url,
            doc_url,
            created_at: Utc::now(),
        };

        for archive in &self.archives {
            if let Err(e) = archive.save(&record).await {
                error!("❌ Archive '{}' failed to save report {}: {e}", archive.name(), record.report_id);
            }
        }

        for notifier in &self.notifiers {
            if let Err(e) = notifier.send(&record).await {
                error!("❌ Notifier '{}' failed for report {}: {e}", notifier.name(), record.report_id);
            }
        }

        info!("✅ Report generated with ID: {}", record.report_id);
        Ok(PipelineResult {
            report_id: record.report_id,
            pdf_url: record.pdf_url,
            doc_url: record.doc_url,
        })
    }

    /// Finds a previously archived record, first archive that has it wins.
    pub async fn lookup(&self, report_id: &str) -> Option<ReportRecord> {
        for archive in &self.archives {
            match archive.get(report_id).await {
                Ok(Some(record)) => return Some(record),
                Ok(None) => {}
                Err(e) => {
                    error!("❌ Archive '{}' lookup failed: {e}", archive.name());
                }
            }
        }
        None
    }
}
