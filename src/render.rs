use async_trait::async_trait;
use chrono::Utc;
use printpdf::*;
use serde::Deserialize;
use serde_json::json;
use std::io::BufWriter;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("Other: {0}")]
    Other(String),
}

/// Converts the assembled report body into a PDF and returns its URL or path.
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    async fn render(&self, html: &str) -> Result<String, RenderError>;
}

/// HTML-to-PDF conversion through a hosted API. The service returns a URL
/// for the converted file; that URL is transient, not the archived copy.
pub struct PdfApiRenderer {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl PdfApiRenderer {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConvertResponse {
    url: Option<String>,
    #[serde(default)]
    error: bool,
    message: Option<String>,
}

#[async_trait]
impl DocumentRenderer for PdfApiRenderer {
    async fn render(&self, html: &str) -> Result<String, RenderError> {
        debug!("Generating PDF with the conversion API");
        let url = format!("{}/pdf/convert/from/html", self.base_url);
        let payload = json!({ "html": html, "name": "report.pdf" });

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| RenderError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RenderError::Http(format!("status={status} body={body}")));
        }

        let parsed: ConvertResponse = response
            .json()
            .await
            .map_err(|e| RenderError::Other(format!("parse error: {e}")))?;

        if parsed.error {
            return Err(RenderError::Other(
                parsed.message.unwrap_or_else(|| "conversion rejected".into()),
            ));
        }
        let pdf_url = parsed
            .url
            .ok_or_else(|| RenderError::Other("no url in response".into()))?;
        info!("✅ PDF generated: {pdf_url}");
        Ok(pdf_url)
    }
}

/// Text-only PDF written to disk, for running without any conversion API.
pub struct LocalPdfRenderer {
    out_dir: PathBuf,
}

impl LocalPdfRenderer {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }
}

#[async_trait]
impl DocumentRenderer for LocalPdfRenderer {
    async fn render(&self, html: &str) -> Result<String, RenderError> {
        let bytes = text_pdf(&html_to_lines(html)).map_err(|e| RenderError::Other(e.to_string()))?;
        std::fs::create_dir_all(&self.out_dir).map_err(|e| RenderError::Other(e.to_string()))?;
        let path = self
            .out_dir
            .join(format!("report_{}.pdf", Utc::now().timestamp_millis()));
        std::fs::write(&path, bytes).map_err(|e| RenderError::Other(e.to_string()))?;
        let path = path.to_string_lossy().into_owned();
        info!("✅ PDF written to {path}");
        Ok(path)
    }
}

fn text_pdf(lines: &[String]) -> Result<Vec<u8>, printpdf::Error> {
    let (doc, first_page, first_layer) =
        PdfDocument::new("AI Insights Report", Mm(210.0), Mm(297.0), "Layer 1");
    let font = doc.add_builtin_font(BuiltinFont::Helvetica)?;

    let mut layer = doc.get_page(first_page).get_layer(first_layer);
    let mut y = 280.0;
    for line in lines {
        if y < 15.0 {
            let (page, layer_idx) = doc.add_page(Mm(210.0), Mm(297.0), "Layer 1");
            layer = doc.get_page(page).get_layer(layer_idx);
            y = 280.0;
        }
        if !line.is_empty() {
            layer.use_text(line, 10.0, Mm(15.0), Mm(y), &font);
        }
        y -= 6.0;
    }

    let mut buf: Vec<u8> = Vec::new();
    {
        let mut writer = BufWriter::new(&mut buf);
        doc.save(&mut writer)?;
    }
    Ok(buf)
}

/// Strips markup down to wrapped text lines. Good enough for the text-only
/// layout; not a general HTML parser.
fn html_to_lines(html: &str) -> Vec<String> {
    let mut text = String::new();
    let mut tag_buf = String::new();
    let mut in_tag = false;
    for c in html.chars() {
        if in_tag {
            if c == '>' {
                let name = tag_buf.trim_start_matches('/');
                if matches!(name.split_whitespace().next().unwrap_or(""),
                    "p" | "h1" | "h2" | "h3" | "br" | "div" | "header" | "footer" | "li")
                {
                    text.push('\n');
                }
                tag_buf.clear();
                in_tag = false;
            } else {
                tag_buf.push(c);
            }
        } else if c == '<' {
            in_tag = true;
        } else {
            text.push(c);
        }
    }
    let text = text
        .replace("&amp;", "&")
        .replace("&mdash;", "-")
        .replace("&copy;", "(c)")
        .replace("&lt;", "<")
        .replace("&gt;", ">");

    let mut lines = Vec::new();
    for raw in text.lines() {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            if !lines.last().is_some_and(String::is_empty) {
                lines.push(String::new());
            }
            continue;
        }
        for chunk in wrap(trimmed, 100) {
            lines.push(chunk);
        }
    }
    while lines.last().is_some_and(String::is_empty) {
        lines.pop();
    }
    lines
}

fn wrap(line: &str, width: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    for word in line.split_whitespace() {
        if !current.is_empty() && current.chars().count() + word.chars().count() + 1 > width {
            out.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}
