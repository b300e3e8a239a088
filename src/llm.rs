use crate::models::{ReportRequest, SectionKey};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("Other: {0}")]
    Other(String),
}

/// Drafts the report text from the validated questionnaire.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(&self, request: &ReportRequest) -> Result<String, LlmError>;
}

pub struct OpenAiGenerator {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiGenerator {
    pub fn new(api_key: String, model: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            base_url,
        }
    }

    fn build_prompt(request: &ReportRequest) -> String {
        let enabled: Vec<&str> = SectionKey::ORDER
            .iter()
            .filter(|&&key| request.toggles.enabled(key))
            .map(|&key| key.title())
            .collect();
        let answers = request
            .answers
            .iter()
            .enumerate()
            .map(|(i, a)| format!("{}. {a}", i + 1))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            "You are an AI consultant preparing a detailed report for a business owner in the \
             {industry} industry. Write the following sections, each introduced by its title in \
             double asterisks (for example **Introduction**): {sections}.\n\n\
             Base the report on the owner's questionnaire answers:\n{answers}\n\n\
             Keep the tone professional and the content specific to the {industry} industry.",
            industry = request.industry,
            sections = enabled.join(", "),
        )
    }
}

#[async_trait]
impl ContentGenerator for OpenAiGenerator {
    async fn generate(&self, request: &ReportRequest) -> Result<String, LlmError> {
        let prompt = Self::build_prompt(request);
        debug!("Generating report content with the LLM API");

        let payload = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": "You are a helpful assistant."},
                {"role": "user", "content": prompt}
            ],
            "max_tokens": 1500
        });

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| LlmError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Http(format!("status={status} body={body}")));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Other(format!("parse error: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| LlmError::Other("no content in response".into()))?;

        info!("✅ Report content generated ({} chars)", content.len());
        Ok(content.trim().to_string())
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: String,
}

/// Stand-in report used when the generator is disabled or failing. Built only
/// from the request, so repeated runs produce the same text.
pub fn mock_report_content(request: &ReportRequest) -> String {
    format!(
        "**Introduction**\nThis is a mock introduction for the {industry} industry.\n\n\
         **Industry Trends**\nMock trends for the {industry} industry.\n\n\
         **AI Solutions**\nMock solutions based on provided answers: {answers}.\n\n\
         **Analysis**\nMock analysis and recommendations.\n\n\
         **Conclusion**\nMock conclusion and next steps.",
        industry = request.industry,
        answers = request.answers.join("; "),
    )
}
