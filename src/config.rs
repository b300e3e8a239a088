use std::env;

/// Which document renderer to construct when PDF output is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdfRendererKind {
    /// Hosted HTML-to-PDF conversion API.
    Api,
    /// Text-only PDFs written to a local directory.
    Local,
}

/// Process-wide settings, read once at startup and injected everywhere.
/// Business logic never touches the environment directly.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub question_count: usize,

    pub enable_openai: bool,
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_api_base: String,

    pub enable_pdf: bool,
    pub pdf_renderer: PdfRendererKind,
    pub pdfco_api_key: String,
    pub pdfco_api_base: String,
    pub pdf_output_dir: String,

    pub enable_sheets: bool,
    pub sheets_api_base: String,
    pub sheets_api_key: String,
    pub sheet_name: String,

    pub enable_email: bool,
    pub mail_api_base: String,
    pub mail_api_key: String,
    pub mail_sender: String,
    pub admin_email: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        // Question count is bounded: revisions shipped anywhere from 3 to 6.
        let question_count = env_var("QUESTION_COUNT", "3")
            .parse::<usize>()
            .unwrap_or(3)
            .clamp(3, 6);

        let pdf_renderer = match env_var("PDF_RENDERER", "api").to_ascii_lowercase().as_str() {
            "local" => PdfRendererKind::Local,
            _ => PdfRendererKind::Api,
        };

        Self {
            port: env_var("PORT", "8080").parse().unwrap_or(8080),
            question_count,

            enable_openai: env_flag("ENABLE_OPENAI_SERVICE"),
            openai_api_key: env_var("OPENAI_API_KEY", ""),
            openai_model: env_var("OPENAI_MODEL", "gpt-4o-mini"),
            openai_api_base: env_var("OPENAI_API_BASE", "https://api.openai.com/v1"),

            enable_pdf: env_flag("ENABLE_PDF_SERVICE"),
            pdf_renderer,
            pdfco_api_key: env_var("PDFCO_API_KEY", ""),
            pdfco_api_base: env_var("PDFCO_API_BASE", "https://api.pdf.co/v1"),
            pdf_output_dir: env_var("PDF_OUTPUT_DIR", "generated_reports"),

            enable_sheets: env_flag("ENABLE_SHEETS_SERVICE"),
            sheets_api_base: env_var("SHEETS_API_BASE", ""),
            sheets_api_key: env_var("SHEETS_API_KEY", ""),
            sheet_name: env_var("SHEET_NAME", "ReportData"),

            enable_email: env_flag("ENABLE_EMAIL_SERVICE"),
            mail_api_base: env_var("MAIL_API_BASE", ""),
            mail_api_key: env_var("MAIL_API_KEY", ""),
            mail_sender: env_var("MAIL_SENDER", "reports@localhost"),
            admin_email: env::var("ADMIN_EMAIL").ok().filter(|v| !v.is_empty()),
        }
    }
}

fn env_var(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

// Flags default on; set e.g. ENABLE_EMAIL_SERVICE=False to switch a
// collaborator off.
fn env_flag(key: &str) -> bool {
    match env::var(key) {
        Ok(value) => matches!(value.to_ascii_lowercase().as_str(), "true" | "1" | "yes"),
        Err(_) => true,
    }
}
