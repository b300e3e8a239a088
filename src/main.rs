use insight_report::archive::{Archive, MemoryArchive, SheetApiArchive};
use insight_report::config::{Config, PdfRendererKind};
use insight_report::llm::{ContentGenerator, OpenAiGenerator};
use insight_report::notify::{MailNotifier, MailTarget, Notifier};
use insight_report::pipeline::ReportPipeline;
use insight_report::render::{DocumentRenderer, LocalPdfRenderer, PdfApiRenderer};
use insight_report::routes::{self, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Init tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let config = Config::from_env();
    let state = AppState {
        pipeline: Arc::new(build_pipeline(&config)),
    };
    let app = routes::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(%addr, "Starting server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Wires the collaborators the configuration enables. A service that is
/// toggled off, or missing its credentials, is simply not constructed; the
/// pipeline degrades around the gap.
fn build_pipeline(config: &Config) -> ReportPipeline {
    let mut pipeline = ReportPipeline::new(config.question_count)
        .with_archive(Arc::new(MemoryArchive::new()) as Arc<dyn Archive>);

    if config.enable_openai && !config.openai_api_key.is_empty() {
        pipeline = pipeline.with_generator(Arc::new(OpenAiGenerator::new(
            config.openai_api_key.clone(),
            config.openai_model.clone(),
            config.openai_api_base.clone(),
        )) as Arc<dyn ContentGenerator>);
    } else {
        tracing::info!("Content generation disabled, reports will use mock content");
    }

    if config.enable_pdf {
        let renderer: Option<Arc<dyn DocumentRenderer>> = match config.pdf_renderer {
            PdfRendererKind::Local => {
                Some(Arc::new(LocalPdfRenderer::new(config.pdf_output_dir.clone())))
            }
            PdfRendererKind::Api if !config.pdfco_api_key.is_empty() => {
                Some(Arc::new(PdfApiRenderer::new(
                    config.pdfco_api_key.clone(),
                    config.pdfco_api_base.clone(),
                )))
            }
            PdfRendererKind::Api => {
                tracing::info!("PDF conversion key missing, reports will have no PDF");
                None
            }
        };
        if let Some(renderer) = renderer {
            pipeline = pipeline.with_renderer(renderer);
        }
    }

    if config.enable_sheets && !config.sheets_api_base.is_empty() {
        pipeline = pipeline.with_archive(Arc::new(SheetApiArchive::new(
            config.sheets_api_base.clone(),
            config.sheets_api_key.clone(),
            config.sheet_name.clone(),
        )) as Arc<dyn Archive>);
    }

    if config.enable_email && !config.mail_api_base.is_empty() {
        pipeline = pipeline.with_notifier(Arc::new(MailNotifier::new(
            config.mail_api_base.clone(),
            config.mail_api_key.clone(),
            config.mail_sender.clone(),
            MailTarget::Client,
        )) as Arc<dyn Notifier>);
        if let Some(admin) = &config.admin_email {
            pipeline = pipeline.with_notifier(Arc::new(MailNotifier::new(
                config.mail_api_base.clone(),
                config.mail_api_key.clone(),
                config.mail_sender.clone(),
                MailTarget::Admin(admin.clone()),
            )) as Arc<dyn Notifier>);
        }
    }

    pipeline
}
