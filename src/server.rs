//! HTTP surface — run trigger, ad-hoc send, health.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::deliver::Deliverer;
use crate::drafter::Draft;
use crate::pipeline::Pipeline;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub deliverer: Arc<dyn Deliverer>,
}

/// Build the router.
pub fn routes(pipeline: Arc<Pipeline>, deliverer: Arc<dyn Deliverer>) -> Router {
    let state = AppState {
        pipeline,
        deliverer,
    };

    // The ad-hoc send endpoint is called cross-origin by the operator UI.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/run", get(run_handler))
        .route("/send-email", post(send_email_handler))
        .route("/health", get(health))
        .layer(cors)
        .with_state(state)
}

// ── Health ──────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "followup-agent"
    }))
}

// ── Run trigger ─────────────────────────────────────────────────────

async fn run_handler(State(state): State<AppState>) -> impl IntoResponse {
    info!("Run triggered over HTTP");
    match state.pipeline.run().await {
        Ok(report) => {
            info!(drafted = report.drafts.len(), "HTTP-triggered run finished");
            Html(render_drafts(&report.drafts)).into_response()
        }
        Err(e) => {
            error!(error = %e, "HTTP-triggered run failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("An error occurred: {e}"),
            )
                .into_response()
        }
    }
}

/// Render the generated drafts as a simple HTML page.
fn render_drafts(drafts: &[Draft]) -> String {
    let mut html = String::from("<h1>Generated Draft Emails</h1>");
    if drafts.is_empty() {
        html.push_str("<p>No contacts were due for follow-up.</p>");
    }
    for draft in drafts {
        let name = escape(draft.prospect.display_name());
        html.push_str(&format!(
            "<h2>Email for {name}</h2>\
             <p><strong>To:</strong> {email}</p>\
             <pre>{body}</pre><hr>",
            email = escape(draft.prospect.email.as_deref().unwrap_or("no email on record")),
            body = escape(&draft.body),
        ));
    }
    html
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

// ── Ad-hoc send ─────────────────────────────────────────────────────

/// Ad-hoc send request body. Fields are optional so a missing field maps to
/// a 400 with a structured message rather than a deserialization rejection.
#[derive(Debug, Deserialize)]
struct SendEmailRequest {
    #[serde(rename = "recipientEmail")]
    recipient_email: Option<String>,
    #[serde(rename = "emailDraft")]
    email_draft: Option<String>,
}

async fn send_email_handler(
    State(state): State<AppState>,
    Json(body): Json<SendEmailRequest>,
) -> impl IntoResponse {
    let (Some(recipient), Some(draft)) = (
        body.recipient_email.filter(|s| !s.trim().is_empty()),
        body.email_draft.filter(|s| !s.trim().is_empty()),
    ) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "success": false,
                "message": "Recipient email and draft are required"
            })),
        );
    };

    info!(to = %recipient, "Ad-hoc send requested");
    let outcome = state.deliverer.send_adhoc(&recipient, &draft).await;
    (StatusCode::OK, Json(serde_json::json!(outcome)))
}
