//! HTTP front: search, detail and barcode endpoints.
//!
//! Request bodies may be JSON objects or urlencoded forms; the
//! `Content-Type` header decides which. Search responses are streamed as
//! `application/json-stream`, one JSON object per line.

use std::collections::HashMap;
use std::convert::Infallible;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use futures::StreamExt;
use log::{info, warn};
use serde_json::{json, Value};

use crate::barcode::search_term_for;
use crate::builder::NutritionScraper;
use crate::config::ScraperConfig;
use crate::error::NutritionError;
use crate::model::ContentType;

pub const JSON_STREAM: &str = "application/json-stream";

/// Build the axum router for all endpoints.
pub fn router(scraper: NutritionScraper) -> Router {
    Router::new()
        .route("/search", post(handle_search))
        .route("/get_details", post(handle_get_details))
        .route("/search_by_barcode", post(handle_search_by_barcode))
        .with_state(scraper)
}

/// Binds `config.bind_address` and serves until the process is stopped.
pub async fn serve(config: ScraperConfig) -> Result<(), NutritionError> {
    let bind_address = config.bind_address.clone();
    let scraper = NutritionScraper::from_config(config)?;

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Listening on {}", bind_address);
    axum::serve(listener, router(scraper)).await?;
    Ok(())
}

/// Flat view of a request body, whichever encoding it came in.
#[derive(Debug, Default)]
struct RequestFields(HashMap<String, String>);

impl RequestFields {
    fn parse(headers: &HeaderMap, body: &[u8]) -> Self {
        let is_form = headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            return Self(url::form_urlencoded::parse(body).into_owned().collect());
        }

        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(object)) => Self(
                object
                    .into_iter()
                    .filter_map(|(key, value)| match value {
                        Value::String(text) => Some((key, text)),
                        Value::Number(number) => Some((key, number.to_string())),
                        _ => None,
                    })
                    .collect(),
            ),
            _ => Self::default(),
        }
    }

    /// Trimmed, non-empty value of a field.
    fn get(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

fn stream_search(scraper: &NutritionScraper, query: &str) -> Response {
    let lines = scraper
        .search(query)
        .map(|event| Ok::<_, Infallible>(event.to_line()));

    (
        [(header::CONTENT_TYPE, JSON_STREAM)],
        Body::from_stream(lines),
    )
        .into_response()
}

async fn handle_search(
    State(scraper): State<NutritionScraper>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let fields = RequestFields::parse(&headers, &body);
    match fields.get("query") {
        Some(query) => {
            info!("Search for '{}'", query);
            stream_search(&scraper, query)
        }
        None => error_response(StatusCode::BAD_REQUEST, "Please enter a search term."),
    }
}

async fn handle_get_details(
    State(scraper): State<NutritionScraper>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let fields = RequestFields::parse(&headers, &body);
    let Some(slug) = fields.get("slug") else {
        return error_response(StatusCode::BAD_REQUEST, "Missing slug for the detail lookup.");
    };
    let food_type = fields.get("food_type").and_then(ContentType::from_wire);

    match scraper.details(slug, food_type).await {
        Ok(details) => Json(details).into_response(),
        Err(err) if err.is_client_error() => {
            error_response(StatusCode::BAD_REQUEST, err.to_string())
        }
        Err(err) => {
            warn!("Detail lookup for '{}' failed: {}", slug, err);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

async fn handle_search_by_barcode(
    State(scraper): State<NutritionScraper>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let fields = RequestFields::parse(&headers, &body);
    match fields.get("barcode") {
        Some(barcode) => {
            let query = search_term_for(barcode);
            info!("Barcode {} searched as '{}'", barcode, query);
            stream_search(&scraper, &query)
        }
        None => error_response(StatusCode::BAD_REQUEST, "Missing barcode for the search."),
    }
}
