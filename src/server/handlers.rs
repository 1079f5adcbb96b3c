//! HTTP route handlers
//!
//! Reply bodies use capitalized field names:
//! `{"Uid":..}`, `{"Status":..}`, `{"Error":..}`.

use axum::{
    body::Bytes,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::error::Error;
use crate::server::AppState;
use crate::storage::{NewUser, Uid, UpdateRequest};

/// HTTP status for a store error
pub fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::Validation(_) | Error::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        Error::Conflict(_) => StatusCode::CONFLICT,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
    }
}

/// Negative numbers are well-formed but can never name a user
fn parse_uid(raw: &str) -> Result<Uid, Error> {
    if let Ok(uid) = raw.parse::<Uid>() {
        return Ok(uid);
    }
    match raw.parse::<i64>() {
        Ok(_) => Err(Error::NotFound("UID not found".to_string())),
        Err(_) => Err(Error::InvalidArgument("Non-numerical UID".to_string())),
    }
}

fn parse_body<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, Error> {
    serde_json::from_slice(body)
        .map_err(|e| Error::InvalidArgument(format!("Malformed request: {}", e)))
}

fn error_reply(err: &Error) -> Response {
    (status_for(err), Json(json!({ "Error": err.to_string() }))).into_response()
}

/// Create a user
#[instrument(skip(state, body))]
pub async fn create_user(Extension(state): Extension<Arc<AppState>>, body: Bytes) -> Response {
    let result = parse_body::<NewUser>(&body).and_then(|user| state.store.create(user));

    match result {
        Ok(uid) => {
            info!(uid, "User created");
            Json(json!({ "Uid": uid })).into_response()
        }
        Err(e) => {
            warn!(error = %e, "Create rejected");
            (
                status_for(&e),
                Json(json!({ "Uid": -1, "Error": e.to_string() })),
            )
                .into_response()
        }
    }
}

/// Update a user's email and/or address
#[instrument(skip(state, body))]
pub async fn update_user(
    Extension(state): Extension<Arc<AppState>>,
    Path(raw_uid): Path<String>,
    body: Bytes,
) -> Response {
    let result = parse_uid(&raw_uid).and_then(|uid| {
        let update: UpdateRequest = parse_body(&body)?;
        state.store.update(uid, &update)
    });

    match result {
        Ok(()) => Json(json!({ "Status": "OK" })).into_response(),
        Err(e) => (
            status_for(&e),
            Json(json!({ "Status": format!("ERROR: {}", e) })),
        )
            .into_response(),
    }
}

/// Fetch a user
#[instrument(skip(state))]
pub async fn get_user(
    Extension(state): Extension<Arc<AppState>>,
    Path(raw_uid): Path<String>,
) -> Response {
    match parse_uid(&raw_uid).and_then(|uid| state.store.get(uid)) {
        Ok(view) => Json(view).into_response(),
        Err(e) => error_reply(&e),
    }
}

/// Resolve a name to its UID
#[instrument(skip(state))]
pub async fn lookup_user(
    Extension(state): Extension<Arc<AppState>>,
    Path(name): Path<String>,
) -> Response {
    match state.store.lookup(&name) {
        Ok(uid) => Json(json!({ "Uid": uid })).into_response(),
        Err(e) => error_reply(&e),
    }
}

/// Drop every user
#[instrument(skip(state))]
pub async fn reset_store(Extension(state): Extension<Arc<AppState>>) -> Response {
    state.store.reset();
    info!("Store reset via admin endpoint");
    Json(json!({ "Status": "OK" })).into_response()
}

/// Store statistics
pub async fn store_stats(Extension(state): Extension<Arc<AppState>>) -> Response {
    Json(state.store.stats()).into_response()
}

/// Health check
pub async fn health_check() -> Response {
    Json(json!({
        "status": "healthy",
        "version": crate::VERSION,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&Error::Validation("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&Error::Conflict("x".into())), StatusCode::CONFLICT);
        assert_eq!(status_for(&Error::NotFound("x".into())), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_parse_uid() {
        assert_eq!(parse_uid("1000"), Ok(1000));
        assert_eq!(
            parse_uid("ilya"),
            Err(Error::InvalidArgument("Non-numerical UID".to_string()))
        );
        assert_eq!(
            parse_uid("-5"),
            Err(Error::NotFound("UID not found".to_string()))
        );
        assert_eq!(parse_uid(&Uid::MAX.to_string()), Ok(Uid::MAX));
        assert!(matches!(parse_uid("12abc"), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_parse_body_reports_unknown_field() {
        let err = parse_body::<UpdateRequest>(br#"{"address":"123 Broadway"}"#).unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("Malformed request: "));
        assert!(msg.contains("unknown field `address`"));
    }

    #[test]
    fn test_create_body_defaults_missing_fields() {
        let user: NewUser = parse_body(br#"{"passwd":"asdfgh","email":"Bububu@hhh"}"#).unwrap();
        assert!(user.name.is_empty());
        assert_eq!(user.email, "Bububu@hhh");
        assert!(user.addr.is_empty());
    }
}
