// ============================================================
// Layer 1 - Messaging Webhook
// ============================================================
// HTTP front-end for a Twilio-style messaging gateway.
//
//   POST /webhook   form fields Body, ProfileName
//                   → <?xml ...?><Response><Message>answer</Message></Response>
//   GET  /health    → OK
//
// A sender whose profile name contains "Hindi" gets the Hindi
// round trip; everyone else is answered in English. Scoring is
// blocking work, so each request hands it to the blocking pool.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;
use tokio::net::TcpListener;

use crate::domain::{
    language::Language,
    session::{ConversationMode, FALLBACK_APOLOGY},
    traits::QuestionAnswerer,
};

type SharedAnswerer = Arc<dyn QuestionAnswerer>;

/// Form body posted by the messaging gateway. Missing fields are empty.
#[derive(Debug, Default, Deserialize)]
pub struct WebhookMessage {
    #[serde(rename = "Body", default)]
    pub body: String,

    #[serde(rename = "ProfileName", default)]
    pub profile_name: String,
}

pub fn router(answerer: SharedAnswerer) -> Router {
    Router::new()
        .route("/webhook", post(webhook_handler))
        .route("/health", get(health_handler))
        .with_state(answerer)
}

/// Bind `addr` and serve until Ctrl-C.
///
/// Owns its runtime so callers stay synchronous. `answerer` may hold
/// blocking HTTP clients, so the last reference is released here,
/// after the runtime has stopped.
pub fn serve(answerer: SharedAnswerer, addr: &str) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Cannot start the async runtime")?;

    let app = router(Arc::clone(&answerer));
    runtime.block_on(async move {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind to address {addr}"))?;
        tracing::info!("Webhook listening on {}", listener.local_addr()?);

        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("Shutting down webhook");
            })
            .await
            .context("HTTP server error")
    })?;

    drop(runtime);
    drop(answerer);
    Ok(())
}

async fn webhook_handler(
    State(answerer): State<SharedAnswerer>,
    Form(message):   Form<WebhookMessage>,
) -> impl IntoResponse {
    let language = Language::from_profile_name(&message.profile_name);
    let question = message.body.trim().to_string();
    tracing::debug!("Webhook message ({}): '{}'", language, question);

    let reply = tokio::task::spawn_blocking(move || {
        answerer.answer(&question, language, ConversationMode::Standard)
    })
    .await
    .unwrap_or_else(|e| {
        tracing::error!("Answer task failed: {e}");
        FALLBACK_APOLOGY.to_string()
    });

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/xml")],
        twiml_message(&reply),
    )
}

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Wrap `text` in a TwiML messaging response.
pub fn twiml_message(text: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response><Message>{}</Message></Response>",
        escape_xml(text)
    )
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&'  => out.push_str("&amp;"),
            '<'  => out.push_str("&lt;"),
            '>'  => out.push_str("&gt;"),
            '"'  => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c    => out.push(c),
        }
    }
    out
}
