use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use docent_core::ServiceError;
use docent_core::error::ErrorKind;
use docent_core::service::{
    AddDocumentRequest, AddDocumentResponse, AskRequest, AskResponse, FailureResponse,
    SearchRequest, SearchResponse,
};
use docent_llm::LlmProvider;
use serde::Serialize;

use super::server::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
    uptime_secs: u64,
}

fn status_for(kind: Option<ErrorKind>) -> StatusCode {
    match kind {
        None => StatusCode::OK,
        Some(ErrorKind::Validation) => StatusCode::BAD_REQUEST,
        Some(ErrorKind::Provider) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn respond<T: Serialize>(kind: Option<ErrorKind>, body: T) -> Response {
    (status_for(kind), Json(body)).into_response()
}

/// Malformed or non-JSON bodies get the same failure shape as a failed
/// validation. Oversized bodies keep their 413.
fn rejected<T: FailureResponse + Serialize>(rejection: &JsonRejection) -> Response {
    tracing::debug!("rejected request body: {rejection}");
    let status = match rejection.status() {
        StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
        _ => StatusCode::BAD_REQUEST,
    };
    let body = T::failure(&ServiceError::Validation(rejection.body_text()));
    (status, Json(body)).into_response()
}

pub(crate) async fn add_document_handler<P: LlmProvider + 'static>(
    State(state): State<AppState<P>>,
    payload: Result<Json<AddDocumentRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejected::<AddDocumentResponse>(&rejection),
    };
    let resp = state.service.add_document(request).await;
    respond(resp.error_kind, resp)
}

pub(crate) async fn ask_handler<P: LlmProvider + 'static>(
    State(state): State<AppState<P>>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejected::<AskResponse>(&rejection),
    };
    let resp = state.service.ask_question(request).await;
    respond(resp.error_kind, resp)
}

pub(crate) async fn search_handler<P: LlmProvider + 'static>(
    State(state): State<AppState<P>>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejected::<SearchResponse>(&rejection),
    };
    let resp = state.service.search_documents(request).await;
    respond(resp.error_kind, resp)
}

pub(crate) async fn health_handler<P: LlmProvider + 'static>(
    State(state): State<AppState<P>>,
) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        timestamp: chrono::Utc::now().to_rfc3339(),
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_response_serializes_camel_case() {
        let resp = HealthResponse {
            status: "healthy",
            timestamp: "2024-01-01T00:00:00+00:00".into(),
            uptime_secs: 42,
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["uptimeSecs"], 42);
        assert!(json.get("uptime_secs").is_none());
    }

    #[test]
    fn error_kinds_map_to_status_codes() {
        assert_eq!(status_for(None), StatusCode::OK);
        assert_eq!(
            status_for(Some(ErrorKind::Validation)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(Some(ErrorKind::Provider)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
