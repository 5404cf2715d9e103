use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::domain::error::Result;
use crate::infrastructure::config::ConfigService;
use crate::infrastructure::csv::read_csv_file;
use crate::infrastructure::llm_clients::{GeminiClient, LLMClient};
use crate::interfaces::http::{add_log, start_server, HttpState};

/// Load settings, optionally preload a CSV given as the first argument, and
/// serve the HTTP API until shutdown.
pub fn run() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let settings = ConfigService::new().load()?;
    let server_config = settings.server.clone();

    let logs = Arc::new(Mutex::new(Vec::new()));
    let llm_client: Arc<dyn LLMClient + Send + Sync> = Arc::new(GeminiClient::new());
    let state = HttpState::new(settings, llm_client, logs.clone());

    actix_web::rt::System::new().block_on(async move {
        if let Some(path) = std::env::args().nth(1) {
            if let Err(err) = preload(&state, Path::new(&path)).await {
                error!(error = %err, path = %path, "Failed to preload dataset");
            }
        }

        let server = start_server(state, &server_config)?;

        add_log(
            &logs,
            "INFO",
            "System",
            &format!(
                "HTTP server started on {}:{}",
                server_config.host, server_config.port
            ),
        );

        server.await
    })?;

    Ok(())
}

async fn preload(state: &HttpState, path: &Path) -> Result<()> {
    let content = read_csv_file(path)?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("data.csv");
    let settings = state.settings();

    let mut session = state.session.lock().await;
    session
        .load(&state.analysis_use_case, &settings, file_name, &content)
        .await?;

    info!(file = file_name, rows = session.table().row_count(), "Dataset preloaded");
    Ok(())
}
