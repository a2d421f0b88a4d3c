use axum::{
    Router,
    extract::{Form, Path, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use axum_extra::TypedHeader;
use axum_extra::headers::{Authorization, authorization::Basic};
use chrono::Utc;
use log::{error, info, warn};
use serde_json::Value;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

use crate::config::Config;
use crate::export;
use crate::mirror::{GithubMirror, Publisher};
use crate::sanitize;
use crate::schema::{FieldSchema, SurveyVariant};
use crate::store::{self, RecordStore, StoreError, Submission};
use crate::validate;

/// Message for internal failures; details stay in the log.
const INTERNAL_ERROR: &str = "Something went wrong";

pub struct AppState {
    pub config: Config,
    pub schema: FieldSchema,
    pub store: RecordStore,
    pub mirror: Option<Arc<dyn Publisher>>,
}

/// Build the application router
pub fn build_router(state: Arc<AppState>) -> Router {
    let static_dir = state.config.static_dir.clone();
    Router::new()
        .route("/", get(serve_root))
        .route("/info-sheet", get(serve_info_sheet))
        .route("/survey", get(serve_survey).post(handle_survey))
        .route("/thank-you", get(serve_thank_you))
        .route("/goodbye", get(serve_goodbye))
        .route("/downloads", get(downloads_page))
        .route("/download/:date", get(download_csv))
        .nest_service("/static", ServeDir::new(static_dir))
        .with_state(state)
}

/// Start the web server
///
/// Opens the record store, builds the mirror client when configured, and
/// serves until the process is stopped.
pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let store = RecordStore::new(&config.data_dir)?;

    let mirror: Option<Arc<dyn Publisher>> = match &config.mirror {
        Some(m) => Some(Arc::new(GithubMirror::new(&m.token, &m.repo, &m.branch)?)),
        None => None,
    };
    if mirror.is_none() {
        info!("Remote mirroring is disabled");
    }

    let schema = FieldSchema::for_variant(config.variant);
    let port = config.port;
    let state = Arc::new(AppState {
        config,
        schema,
        store,
        mirror,
    });

    let app = build_router(state);
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    info!("Listening on http://0.0.0.0:{}", port);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn serve_root() -> Redirect {
    Redirect::to("/info-sheet")
}

async fn serve_info_sheet() -> Html<&'static str> {
    Html(include_str!("./static/info_sheet.html"))
}

async fn serve_survey(State(state): State<Arc<AppState>>) -> Html<&'static str> {
    Html(match state.schema.variant() {
        SurveyVariant::Combined => include_str!("./static/survey_combined.html"),
        SurveyVariant::Hpv => include_str!("./static/survey_hpv.html"),
    })
}

async fn serve_thank_you() -> Html<&'static str> {
    Html(include_str!("./static/thank_you.html"))
}

async fn serve_goodbye() -> Html<&'static str> {
    Html(include_str!("./static/goodbye.html"))
}

/// Handle a survey submission
///
/// Validates against the active schema, sanitizes string values, stamps the
/// record and appends it to the day's file. Mirroring runs as a detached
/// task after the append succeeds; the response never waits on it.
#[axum::debug_handler]
async fn handle_survey(
    State(state): State<Arc<AppState>>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Response {
    let submission = collect_fields(fields);

    let missing = validate::missing_fields(&state.schema, &submission);
    if !missing.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            format!("Missing required fields: {}", missing.join(", ")),
        )
            .into_response();
    }

    let sanitized = sanitize::sanitize(submission);

    let now = Utc::now().with_timezone(&state.config.tz_offset);
    let date_key = now.format("%Y-%m-%d").to_string();

    // Timestamp is always the first key; a client-supplied one is dropped.
    let mut record = Submission::new();
    record.insert("timestamp".into(), Value::String(now.to_rfc3339()));
    for (key, value) in sanitized {
        if key != "timestamp" {
            record.insert(key, value);
        }
    }

    if let Err(e) = state.store.append(&date_key, &record) {
        error!("Failed to store submission for {}: {}", date_key, e);
        return (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR).into_response();
    }
    info!("Stored submission for {}", date_key);

    if let Some(mirror) = &state.mirror {
        spawn_mirror_push(Arc::clone(mirror), &state.store, &date_key);
    }

    Redirect::to("/thank-you").into_response()
}

/// Push the day's record file to the remote mirror on a detached task
///
/// Best effort: any failure is logged and swallowed, and the submission
/// response is never gated on it.
fn spawn_mirror_push(mirror: Arc<dyn Publisher>, store: &RecordStore, date_key: &str) {
    let path = store.file_path(date_key);
    let file_name = match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => name.to_string(),
        None => return,
    };

    tokio::spawn(async move {
        match tokio::fs::read(&path).await {
            Ok(content) => {
                if let Err(e) = mirror.publish(&file_name, content).await {
                    warn!("Mirror push of {} failed: {}", file_name, e);
                }
            }
            Err(e) => warn!("Could not read {} for mirroring: {}", path.display(), e),
        }
    });
}

/// Fold ordered form pairs into a submission map
///
/// Repeated keys (checkbox groups) collect into an array, preserving entry
/// order; first-seen key order becomes the record's key order.
fn collect_fields(fields: Vec<(String, String)>) -> Submission {
    let mut submission = Submission::new();
    for (key, value) in fields {
        match submission.get_mut(&key) {
            None => {
                submission.insert(key, Value::String(value));
            }
            Some(Value::Array(entries)) => entries.push(Value::String(value)),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, Value::String(value)]);
            }
        }
    }
    submission
}

async fn downloads_page(State(state): State<Arc<AppState>>) -> Response {
    match state.store.list_date_keys() {
        Ok(keys) => Html(render_downloads(&keys)).into_response(),
        Err(e) => {
            error!("Failed to list record files: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR).into_response()
        }
    }
}

fn render_downloads(keys: &[String]) -> String {
    let items: String = if keys.is_empty() {
        "<li>No responses recorded yet.</li>".to_string()
    } else {
        keys.iter()
            .map(|key| format!("<li><a href=\"/download/{0}\">{0}</a></li>", key))
            .collect()
    };
    format!(
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"UTF-8\">\
         <title>Downloads</title><link rel=\"stylesheet\" href=\"/static/styles.css\"></head>\
         <body><main class=\"card\"><h1>Available response files</h1>\
         <ul class=\"dates\">{}</ul></main></body></html>",
        items
    )
}

/// Serve a day's responses as a CSV attachment
///
/// Requires HTTP basic credentials matching the configured pair. A missing
/// record file and a file with zero records both surface as 404; corrupt
/// stored data is a generic 500 with details kept in the log.
async fn download_csv(
    State(state): State<Arc<AppState>>,
    Path(date): Path<String>,
    auth: Option<TypedHeader<Authorization<Basic>>>,
) -> Response {
    let authorized = match &auth {
        Some(TypedHeader(Authorization(basic))) => {
            basic.username() == state.config.download_user
                && basic.password() == state.config.download_password
        }
        None => false,
    };
    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, "Basic realm=\"survey downloads\"")],
            "Credentials required",
        )
            .into_response();
    }

    if !store::is_valid_date_key(&date) {
        return (StatusCode::NOT_FOUND, "No responses for that date").into_response();
    }

    match state.store.read_all(&date) {
        Ok(records) => {
            let csv = export::to_csv(&records);
            (
                [
                    (header::CONTENT_TYPE, "text/csv".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=responses-{}.csv", date),
                    ),
                ],
                csv,
            )
                .into_response()
        }
        Err(StoreError::NotFound(_)) | Err(StoreError::Empty(_)) => {
            (StatusCode::NOT_FOUND, "No responses for that date").into_response()
        }
        Err(e) => {
            error!("Failed to export {}: {}", date, e);
            (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR).into_response()
        }
    }
}
