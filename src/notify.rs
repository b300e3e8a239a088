use crate::models::ReportRecord;
use async_trait::async_trait;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("Other: {0}")]
    Other(String),
}

/// Sends a delivery notice for a finished report. Always best-effort: the
/// pipeline logs failures and moves on.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &'static str;

    async fn send(&self, record: &ReportRecord) -> Result<(), NotifyError>;
}

/// Who a mail notifier writes to.
pub enum MailTarget {
    /// The client address on the report record.
    Client,
    /// A fixed administrator address.
    Admin(String),
}

/// Email over an HTTP mail-relay API.
pub struct MailNotifier {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    sender: String,
    target: MailTarget,
}

impl MailNotifier {
    pub fn new(base_url: String, api_key: String, sender: String, target: MailTarget) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
            sender,
            target,
        }
    }

    fn compose(&self, record: &ReportRecord) -> (String, String, String) {
        let pdf = record.pdf_url.as_deref().unwrap_or("not available");
        let doc = record.doc_url.as_deref().unwrap_or("not available");
        match &self.target {
            MailTarget::Client => (
                record.client_email.clone(),
                "Your AI Insights Report is Ready".to_string(),
                format!(
                    "Your report has been generated. You can download it from the following links:\n\n\
                     PDF: {pdf}\nDocument: {doc}"
                ),
            ),
            MailTarget::Admin(address) => (
                address.clone(),
                format!("Report {} generated", record.report_id),
                format!(
                    "A report was generated for {} <{}> in the {} industry.\n\n\
                     PDF: {pdf}\nDocument: {doc}",
                    record.client_name, record.client_email, record.industry
                ),
            ),
        }
    }
}

#[async_trait]
impl Notifier for MailNotifier {
    fn name(&self) -> &'static str {
        match self.target {
            MailTarget::Client => "mail:client",
            MailTarget::Admin(_) => "mail:admin",
        }
    }

    async fn send(&self, record: &ReportRecord) -> Result<(), NotifyError> {
        let (to, subject, body) = self.compose(record);
        debug!("Sending email to {to}");

        let url = format!("{}/send", self.base_url);
        let payload = json!({
            "from": self.sender,
            "to": to,
            "subject": subject,
            "text": body,
        });
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotifyError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(NotifyError::Http(format!("status={status} body={text}")));
        }
        info!("✅ Email sent to {to}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn notifier(target: MailTarget) -> MailNotifier {
        MailNotifier::new(
            "https://mail.example.com".into(),
            "key".into(),
            "reports@example.com".into(),
            target,
        )
    }

    fn record() -> ReportRecord {
        ReportRecord {
            report_id: "1700000000".into(),
            client_name: "John Doe".into(),
            client_email: "john@example.com".into(),
            industry: "Technology".into(),
            pdf_url: Some("https://files.example.com/report.pdf".into()),
            doc_url: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn client_mail_goes_to_the_record_address() {
        let (to, subject, body) = notifier(MailTarget::Client).compose(&record());
        assert_eq!(to, "john@example.com");
        assert_eq!(subject, "Your AI Insights Report is Ready");
        assert!(body.contains("https://files.example.com/report.pdf"));
        assert!(body.contains("Document: not available"));
    }

    #[test]
    fn admin_mail_goes_to_the_fixed_address() {
        let target = MailTarget::Admin("admin@example.com".into());
        let (to, subject, body) = notifier(target).compose(&record());
        assert_eq!(to, "admin@example.com");
        assert!(subject.contains("1700000000"));
        assert!(body.contains("John Doe"));
    }
}
