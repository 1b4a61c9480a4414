use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

#[derive(Debug)]
pub enum APIError {
    BadRequest(String),
    UnAuthorized,
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    Gone(String),
    InternalServerError(String),
}

impl IntoResponse for APIError {
    fn into_response(self) -> Response {
        match self {
            Self::BadRequest(msg) => error_body(StatusCode::BAD_REQUEST, msg),
            Self::UnAuthorized => (StatusCode::UNAUTHORIZED).into_response(),
            Self::Forbidden(msg) => error_body(StatusCode::FORBIDDEN, msg),
            Self::NotFound(msg) => error_body(StatusCode::NOT_FOUND, msg),
            Self::Conflict(msg) => error_body(StatusCode::CONFLICT, msg),
            Self::Gone(msg) => error_body(StatusCode::GONE, msg),
            Self::InternalServerError(msg) => error_body(StatusCode::INTERNAL_SERVER_ERROR, msg),
        }
    }
}

fn error_body(status: StatusCode, msg: String) -> Response {
    (
        status,
        Json(serde_json::json!({"status": "error", "details": msg})),
    )
        .into_response()
}
