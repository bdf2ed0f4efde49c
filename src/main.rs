use std::sync::Arc;

use sightcheck::api::app_router;
use sightcheck::config::Config;
use sightcheck::service::AssessmentService;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    sightcheck::init_tracing();

    let config = Config::from_env();
    tracing::info!(
        vlm = %config.vlm_base_url,
        primary = %config.primary_model,
        fallback = %config.fallback_model,
        "starting sightcheck v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Reference datasets are validated here; a malformed bundle refuses
    // to start rather than degrade every request.
    let service = Arc::new(AssessmentService::new(&config)?);
    let router = app_router(service, config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, router).await?;

    Ok(())
}
