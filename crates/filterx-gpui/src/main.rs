use anyhow::Context as _;
use gpui::*;
use gpui_component::*;
use std::sync::Arc;
use tracing::{error, info};

mod views;
mod window_options;

use filterx_core::ChatSettings;
use filterx_core::services::PdfiumTextExtractor;
use views::ChatView;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting FilterX");

    let settings = ChatSettings::from_env();
    if settings.api_key.is_none() {
        error!("GEMINI_API_KEY is not set; requests will fail until it is configured");
    }

    // rig's HTTP clients need a Tokio runtime entered on the UI thread
    let tokio_runtime = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;
    let _guard = tokio_runtime.enter();

    let app = Application::new().with_assets(gpui_component_assets::Assets);

    app.run(move |cx| {
        cx.activate(true);
        init(cx);

        let options = window_options::main_window_options(cx);
        let extractor = Arc::new(PdfiumTextExtractor);

        if let Err(e) = cx.open_window(options, |window, cx| {
            let view = cx.new(|cx| ChatView::new(settings, extractor, window, cx));
            cx.new(|cx| Root::new(view, window, cx))
        }) {
            error!(error = ?e, "Failed to open main window");
            cx.quit();
        }
    });

    Ok(())
}
