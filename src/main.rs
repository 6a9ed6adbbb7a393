mod config;
mod error;
mod pdf;
mod records;
mod routes;
mod service;
mod state;

use std::path::PathBuf;
use std::sync::Arc;

use crate::pdf::{CertificateLayout, CertificateRenderer};
use crate::records::RecordStore;
use crate::service::CertificateService;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "certdist=info,tower_http=info".into()),
        )
        .init();

    let config = config::Config::from_env()?;

    let mut args = std::env::args().skip(1);
    if let Some(command) = args.next() {
        return match command.as_str() {
            "setup-template" => {
                let output = args.next().map(PathBuf::from).unwrap_or_else(|| config.template_path.clone());
                pdf::create_template(&output, &config.font_sources())?;
                Ok(())
            }
            other => Err(format!("unknown command '{}' (expected setup-template)", other).into()),
        };
    }

    let config = Arc::new(config);

    let store = RecordStore::new(&config.data_csv, config.certificate_id_prefix.clone());
    if !store.validate_structure() {
        tracing::warn!(
            "Student source {} is missing, empty, or lacks name/ID columns",
            store.source_path().display()
        );
    }

    let layout = CertificateLayout::new(
        &config.template_path,
        config.template_fallback,
        &config.font_sources(),
        config.name_font_size,
    );
    let renderer = match &config.output_dir {
        Some(dir) => CertificateRenderer::cached(layout, dir)?,
        None => CertificateRenderer::in_memory(layout),
    };
    tracing::info!(
        "Rendering {:?} with template {}",
        renderer.mode(),
        renderer.layout().template_path().display()
    );

    let state = Arc::new(state::AppState {
        service: Arc::new(CertificateService::new(store, renderer, config.admin_key.clone())),
        config: config.clone(),
    });

    let app = routes::router(state);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("certdist listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
