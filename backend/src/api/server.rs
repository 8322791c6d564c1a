//! HTTP server for the replay upload page.
//!
//! # Endpoints
//!
//! | Method | Path       | Description                               |
//! |--------|------------|-------------------------------------------|
//! | GET    | `/`        | Upload page                               |
//! | POST   | `/upload`  | Upload replays, answers an HTML fragment  |
//! |        |            | or a plain-text reason on rejection       |
//! | GET    | `/upload`  | Redirects to `/`                          |
//! | GET    | `/health`  | Health check                              |
//! | GET    | `/pkg/*`   | Compiled frontend bundle                  |

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart},
    http::{header, Method, StatusCode},
    response::{Html, IntoResponse, Json, Redirect, Response},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, services::ServeDir};

use super::logs::{log_error, log_info, log_success};
use crate::config::ServerConfig;
use crate::error::{ServerResult, UploadError, UploadResult};
use crate::render::{page::HOME_PAGE, render_stats_fragment};
use crate::upload::{
    process_upload, UploadForm, UploadFormBuilder, DATES_FIELD, PLAYER_NAME_FIELD, REPLAYS_FIELD,
};

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        let status = match &self {
            UploadError::TooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        };
        // The page shows this text as is.
        (status, self.to_string()).into_response()
    }
}

/// Build the application router.
pub fn router(config: &ServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/upload", get(upload_redirect).post(upload_replays))
        .nest_service("/pkg", ServeDir::new(&config.static_dir))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(cors)
}

/// Start the HTTP server
pub async fn start_server(config: ServerConfig) -> ServerResult<()> {
    let app = router(&config);
    let listener = tokio::net::TcpListener::bind(config.addr()).await?;

    println!("🚀 wc3stats server running on http://localhost:{}", config.port);
    println!("   GET  /         - Upload page");
    println!("   POST /upload   - Upload replays");
    println!("   GET  /health   - Health check");
    println!("   GET  /pkg/*    - Frontend bundle from {}", config.static_dir.display());
    println!();

    axum::serve(listener, app).await?;

    Ok(())
}

async fn home() -> Html<&'static str> {
    Html(HOME_PAGE)
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "wc3stats",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn upload_redirect() -> Redirect {
    Redirect::to("/")
}

async fn upload_replays(multipart: Multipart) -> Result<Html<String>, UploadError> {
    let form = match read_upload_form(multipart).await {
        Ok(form) => form,
        Err(e) => {
            log_error(format!("Upload rejected: {}", e));
            return Err(e);
        }
    };

    log_info(format!(
        "📄 Upload from {}: {} file(s)",
        form.player_name,
        form.replays.len()
    ));

    let report = process_upload(&form);
    log_success(format!("{} replay(s) rendered", report.replays.len()));
    Ok(Html(render_stats_fragment(&report)))
}

fn multipart_error(err: MultipartError) -> UploadError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadError::TooLarge
    } else {
        UploadError::Multipart(err.body_text())
    }
}

/// Drain the multipart body into a validated form.
///
/// File parts are only taken from the replays input; other unknown parts are
/// skipped without being read as text.
async fn read_upload_form(mut multipart: Multipart) -> UploadResult<UploadForm> {
    let mut builder = UploadFormBuilder::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            REPLAYS_FIELD => {
                let filename = field.file_name().unwrap_or("").to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                builder.file(filename, bytes.to_vec());
            }
            PLAYER_NAME_FIELD | DATES_FIELD => {
                let value = field.text().await.map_err(multipart_error)?;
                builder.text(&name, value);
            }
            _ => {}
        }
    }

    builder.build()
}
