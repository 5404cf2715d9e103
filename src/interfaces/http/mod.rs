use crate::application::{ChatUseCase, DashboardSession, DatasetAnalysisUseCase};
use crate::domain::chat::ChatMessage;
use crate::domain::demo::{DEMO_CSV, DEMO_FILE_NAME};
use crate::domain::error::AppError;
use crate::domain::settings::{AppSettings, ServerConfig};
use crate::domain::time_window::TimeWindow;
use crate::infrastructure::config::ConfigService;
use crate::infrastructure::csv::{decode_csv_bytes, validate_upload};
use crate::infrastructure::llm_clients::LLMClient;
use actix_cors::Cors;
use actix_web::http::header;
use actix_web::{
    delete, dev::Server, get, post, put, web, App, HttpRequest, HttpResponse, HttpServer,
    Responder,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, RwLock};

pub const MAX_LOG_ENTRIES: usize = 100;
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub source: String,
    pub message: String,
}

pub struct HttpState {
    pub settings: RwLock<AppSettings>,
    pub config_service: ConfigService,
    pub llm_client: Arc<dyn LLMClient + Send + Sync>,
    pub analysis_use_case: DatasetAnalysisUseCase,
    pub chat_use_case: ChatUseCase,
    pub session: tokio::sync::Mutex<DashboardSession>,
    pub logs: Arc<Mutex<Vec<LogEntry>>>,
}

impl HttpState {
    pub fn new(
        settings: AppSettings,
        llm_client: Arc<dyn LLMClient + Send + Sync>,
        logs: Arc<Mutex<Vec<LogEntry>>>,
    ) -> Self {
        Self {
            settings: RwLock::new(settings),
            config_service: ConfigService::new(),
            analysis_use_case: DatasetAnalysisUseCase::new(llm_client.clone()),
            chat_use_case: ChatUseCase::new(llm_client.clone()),
            llm_client,
            session: tokio::sync::Mutex::new(DashboardSession::new()),
            logs,
        }
    }

    /// Snapshot of the current settings; never held across an await
    pub fn settings(&self) -> AppSettings {
        self.settings.read().unwrap().clone()
    }
}

#[derive(Deserialize)]
pub struct WindowQuery {
    #[serde(default)]
    pub window: Option<String>,
}

impl WindowQuery {
    fn resolve(&self, settings: &AppSettings) -> TimeWindow {
        self.window
            .as_deref()
            .map(TimeWindow::from_label)
            .unwrap_or(settings.default_window)
    }
}

#[derive(Deserialize)]
pub struct UploadQuery {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Deserialize)]
pub struct ChatRequest {
    pub question: String,
}

#[derive(Serialize)]
pub struct ChatResponse<'a> {
    pub reply: ChatMessage,
    pub messages: &'a [ChatMessage],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsResponse<'a> {
    pub date_column: Option<&'a str>,
    pub default_window: TimeWindow,
    pub model: &'a str,
    pub has_api_key: bool,
    pub columns: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub date_column: Option<String>,
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn error_response(err: &AppError) -> HttpResponse {
    let mut response = match err {
        AppError::ValidationError(_) | AppError::ParseError(_) => HttpResponse::BadRequest(),
        AppError::NotFound(_) => HttpResponse::NotFound(),
        AppError::LLMError(_) => HttpResponse::BadGateway(),
        _ => HttpResponse::InternalServerError(),
    };
    response.body(err.to_string())
}

async fn load_dataset(data: &HttpState, file_name: &str, content: &str) -> HttpResponse {
    let settings = data.settings();
    let mut session = data.session.lock().await;

    match session
        .load(&data.analysis_use_case, &settings, file_name, content)
        .await
    {
        Ok(_) => {
            add_log(
                &data.logs,
                "INFO",
                "HttpApi",
                &format!(
                    "Loaded {} ({} rows)",
                    file_name,
                    session.table().row_count()
                ),
            );
            HttpResponse::Ok().json(session.view(&settings, settings.default_window, today()))
        }
        Err(e) => {
            add_log(
                &data.logs,
                "ERROR",
                "HttpApi",
                &format!("Failed to analyze {}: {}", file_name, e),
            );
            error_response(&e)
        }
    }
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().body("ok")
}

#[post("/upload")]
async fn upload(
    data: web::Data<HttpState>,
    query: web::Query<UploadQuery>,
    req: HttpRequest,
    body: web::Bytes,
) -> impl Responder {
    let file_name = query.name.as_deref().unwrap_or_default().trim();
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());

    if let Err(e) = validate_upload(file_name, content_type) {
        add_log(
            &data.logs,
            "WARN",
            "HttpApi",
            &format!("Rejected upload {:?} ({:?}): {}", file_name, content_type, e),
        );
        return error_response(&e);
    }

    add_log(
        &data.logs,
        "INFO",
        "HttpApi",
        &format!("Uploading {} ({} bytes)", file_name, body.len()),
    );

    let content = decode_csv_bytes(&body);
    let file_name = if file_name.is_empty() {
        "upload.csv"
    } else {
        file_name
    };
    load_dataset(&data, file_name, &content).await
}

#[post("/demo")]
async fn demo(data: web::Data<HttpState>) -> impl Responder {
    add_log(&data.logs, "INFO", "HttpApi", "Loading demo dataset");
    load_dataset(&data, DEMO_FILE_NAME, DEMO_CSV).await
}

#[get("/dashboard")]
async fn dashboard(data: web::Data<HttpState>, query: web::Query<WindowQuery>) -> impl Responder {
    let settings = data.settings();
    let window = query.resolve(&settings);
    let session = data.session.lock().await;

    HttpResponse::Ok().json(session.view(&settings, window, today()))
}

#[get("/sample")]
async fn sample(data: web::Data<HttpState>) -> impl Responder {
    let session = data.session.lock().await;
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(session.sample().to_string())
}

#[post("/chat")]
async fn chat(data: web::Data<HttpState>, req: web::Json<ChatRequest>) -> impl Responder {
    let settings = data.settings();
    let mut session = data.session.lock().await;

    match session
        .ask(&data.chat_use_case, &settings, &req.question)
        .await
    {
        Ok(reply) => HttpResponse::Ok().json(ChatResponse {
            reply,
            messages: session.messages(),
        }),
        Err(e) => {
            add_log(
                &data.logs,
                "ERROR",
                "HttpApi",
                &format!("Chat failed: {}", e),
            );
            error_response(&e)
        }
    }
}

#[post("/reset")]
async fn reset(data: web::Data<HttpState>) -> impl Responder {
    let settings = data.settings();
    let mut session = data.session.lock().await;
    session.reset();

    add_log(&data.logs, "INFO", "HttpApi", "Session reset");
    HttpResponse::Ok().json(session.view(&settings, settings.default_window, today()))
}

#[get("/export")]
async fn export(data: web::Data<HttpState>, query: web::Query<WindowQuery>) -> impl Responder {
    let settings = data.settings();
    let window = query.resolve(&settings);
    let session = data.session.lock().await;

    match session.export(&settings, window, today()) {
        Ok((file_name, content)) => HttpResponse::Ok()
            .content_type("text/csv; charset=utf-8")
            .insert_header((
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ))
            .body(content),
        Err(e) => error_response(&e),
    }
}

#[get("/models")]
async fn list_models(data: web::Data<HttpState>) -> impl Responder {
    let settings = data.settings();
    add_log(
        &data.logs,
        "INFO",
        "HttpApi",
        &format!(
            "Fetching models (provider={:?} base_url={})",
            settings.llm.provider, settings.llm.base_url
        ),
    );

    match data.llm_client.list_models(&settings.llm).await {
        Ok(models) => HttpResponse::Ok().json(models),
        Err(e) => {
            add_log(
                &data.logs,
                "ERROR",
                "HttpApi",
                &format!("Failed to list models: {}", e),
            );
            error_response(&e)
        }
    }
}

#[get("/settings")]
async fn get_settings(data: web::Data<HttpState>) -> impl Responder {
    let settings = data.settings();
    let session = data.session.lock().await;

    HttpResponse::Ok().json(SettingsResponse {
        date_column: settings.date_column(),
        default_window: settings.default_window,
        model: &settings.llm.model,
        has_api_key: settings.llm.api_key.is_some(),
        columns: session.table().headers.clone(),
    })
}

#[put("/settings")]
async fn update_settings(
    data: web::Data<HttpState>,
    req: web::Json<SettingsUpdate>,
) -> impl Responder {
    let update = req.into_inner();

    if let Some(api_key) = update.api_key.as_deref().map(str::trim) {
        let stored = if api_key.is_empty() {
            data.config_service.delete_api_key()
        } else {
            data.config_service.save_api_key(api_key)
        };
        if let Err(e) = stored {
            add_log(
                &data.logs,
                "ERROR",
                "Settings",
                &format!("Failed to store API key: {}", e),
            );
            return error_response(&e);
        }
    }

    let mut settings = data.settings.write().unwrap();
    if let Some(api_key) = update.api_key.as_deref().map(str::trim) {
        settings.llm.api_key = Some(api_key.to_string()).filter(|key| !key.is_empty());
    }
    if let Some(date_column) = update.date_column {
        settings.date_column = Some(date_column.trim().to_string()).filter(|c| !c.is_empty());
    }

    add_log(
        &data.logs,
        "INFO",
        "Settings",
        &format!(
            "Settings updated (date_column={})",
            settings.date_column().unwrap_or("<unset>")
        ),
    );
    HttpResponse::NoContent().finish()
}

#[delete("/settings/api-key")]
async fn delete_api_key(data: web::Data<HttpState>) -> impl Responder {
    if let Err(e) = data.config_service.delete_api_key() {
        return error_response(&e);
    }
    data.settings.write().unwrap().llm.api_key = None;

    add_log(&data.logs, "INFO", "Settings", "API key removed");
    HttpResponse::NoContent().finish()
}

#[get("/logs")]
async fn get_logs(data: web::Data<HttpState>) -> impl Responder {
    let logs = data.logs.lock().unwrap();
    HttpResponse::Ok().json(&*logs)
}

pub fn add_log_entry(
    logs: &Mutex<Vec<LogEntry>>,
    level: &str,
    source: &str,
    message: &str,
) -> LogEntry {
    match level {
        "ERROR" => tracing::error!(source, "{}", message),
        "WARN" => tracing::warn!(source, "{}", message),
        _ => tracing::info!(source, "{}", message),
    }

    let entry = LogEntry {
        time: Local::now().format("%H:%M:%S").to_string(),
        level: level.to_string(),
        source: source.to_string(),
        message: message.to_string(),
    };
    let mut logs = logs.lock().unwrap();
    logs.push(entry.clone());
    if logs.len() > MAX_LOG_ENTRIES {
        logs.remove(0);
    }
    entry
}

pub fn add_log(logs: &Mutex<Vec<LogEntry>>, level: &str, source: &str, message: &str) {
    add_log_entry(logs, level, source, message);
}

/// Routes under `/api`
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::PayloadConfig::new(MAX_UPLOAD_BYTES))
        .service(
            web::scope("/api")
                .service(health)
                .service(upload)
                .service(demo)
                .service(dashboard)
                .service(sample)
                .service(chat)
                .service(reset)
                .service(export)
                .service(list_models)
                .service(get_settings)
                .service(update_settings)
                .service(delete_api_key)
                .service(get_logs),
        );
}

pub fn start_server(state: HttpState, config: &ServerConfig) -> std::io::Result<Server> {
    let state = web::Data::new(state);

    let server = HttpServer::new(move || {
        let cors = Cors::permissive(); // Allow all origins for local tool

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run();

    Ok(server)
}
