use glosa_import::{api, create_pool, AppConfig, AppState, ImportService, SemaphoreService};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // local-time log format
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    let config = AppConfig::load()?;
    info!("Starting server with config: {:?}", config.server);

    let pool = create_pool(&config.database).await?;
    info!("Database pool created");

    let state = AppState {
        import: Arc::new(ImportService::new(pool.clone(), &config)),
        semaphore: Arc::new(SemaphoreService::new(pool, &config)),
    };
    let app = api::router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  POST  /api/insurers/:insurer_id/glosas/import/preview      - resolve JSON rows");
    info!("  POST  /api/insurers/:insurer_id/glosas/import/preview/csv  - resolve a CSV sheet");
    info!("  POST  /api/insurers/:insurer_id/glosas/import/preview/xlsx - resolve an Excel workbook");
    info!("  POST  /api/insurers/:insurer_id/glosas/import/commit       - persist reviewed rows");
    info!("  PUT   /api/insurers/:insurer_id/column-mapping             - per-insurer column labels");
    info!("  POST  /api/glosas/semaphores/recompute                     - refresh active semaphores");
    info!("  PATCH /api/glosas/:dispute_id/state                        - change glosa state");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
