use crate::errors::ServerError;
use astra::{Body, Response, ResponseBuilder};
use serde_json::json;

pub type ResultResp = Result<Response, ServerError>;

fn status_for(err: &ServerError) -> u16 {
    match err {
        ServerError::NotFound => 404,
        ServerError::BadRequest(_) => 400,
        ServerError::Unauthorized(_) => 401,
        ServerError::Forbidden => 403,
        ServerError::TaskNotAllowedForRole { .. } => 403,
        ServerError::InvalidTransition { .. } => 409,
        ServerError::StaleState => 409,
        ServerError::PartialFanout(_) => 502,
        ServerError::DbError(_) => 500,
        ServerError::XlsxError(_) => 500,
        ServerError::InternalError => 500,
    }
}

/// Convert a ServerError into an HTML error page (page routes).
pub fn error_to_response(err: ServerError) -> Response {
    html_error_response(status_for(&err), &err.to_string())
}

/// Convert a ServerError into a JSON body (/api routes). PartialFanout
/// carries the failed recipient ids so the caller can retry just those.
pub fn json_error_response(err: ServerError) -> Response {
    let status = status_for(&err);
    let body = match &err {
        ServerError::PartialFanout(ids) => json!({
            "success": false,
            "error": err.to_string(),
            "failedUserIds": ids,
        }),
        _ => json!({
            "success": false,
            "error": err.to_string(),
        }),
    };

    ResponseBuilder::new()
        .status(status)
        .header("Content-Type", mime::APPLICATION_JSON.as_ref())
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Build an HTML error page
pub fn html_error_response(status: u16, message: &str) -> Response {
    let html = format!(
        "<!DOCTYPE html>
        <html lang=\"en\">
        <head><meta charset=\"utf-8\"><title>Error {status}</title></head>
        <body>
            <h1>Error {status}</h1>
            <p>{message}</p>
        </body>
        </html>"
    );

    ResponseBuilder::new()
        .status(status)
        .header("Content-Type", "text/html; charset=utf-8")
        .body(Body::from(html))
        .unwrap()
}
