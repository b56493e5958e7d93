use std::sync::Arc;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS};
use hyper::{Request, Response, StatusCode};

use crate::constants::{MSG_FAILED_HMAC, MSG_MISSING_SIGNATURE};

/// Responds to a request the gate refused to forward.
///
/// The request still carries its buffered body.
pub type RejectionHandler =
    Arc<dyn Fn(Request<Full<Bytes>>) -> Response<Full<Bytes>> + Send + Sync>;

/// Wraps a closure into a [`RejectionHandler`].
pub fn rejection_handler<F>(handler: F) -> RejectionHandler
where
    F: Fn(Request<Full<Bytes>>) -> Response<Full<Bytes>> + Send + Sync + 'static,
{
    Arc::new(handler)
}

/// Plain text response, written the same way for every status the gate produces.
pub fn text_response(status: StatusCode, msg: impl Into<Bytes>) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(msg.into()));
    *response.status_mut() = status;

    let headers = response.headers_mut();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));

    response
}

/// `403` with [`MSG_MISSING_SIGNATURE`].
pub fn default_missing_signature_handler(_request: Request<Full<Bytes>>) -> Response<Full<Bytes>> {
    text_response(StatusCode::FORBIDDEN, MSG_MISSING_SIGNATURE)
}

/// `403` with [`MSG_FAILED_HMAC`].
pub fn default_verify_failed_handler(_request: Request<Full<Bytes>>) -> Response<Full<Bytes>> {
    text_response(StatusCode::FORBIDDEN, MSG_FAILED_HMAC)
}
