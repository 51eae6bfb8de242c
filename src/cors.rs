//! CORS middleware: stamps the configured origin on every response, answers OPTIONS directly.

use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

pub const ALLOW_HEADERS: &str = "X-Requested-With, X-AUTHENTICATION, X-IP, Content-Type, Authorization";
pub const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";

/// Invalid header bytes in `origin` fall back to an empty value.
pub fn origin_header(origin: &str) -> HeaderValue {
    HeaderValue::from_str(origin).unwrap_or_else(|_| {
        tracing::warn!(origin = %origin, "allow_origin is not a valid header value; sending empty origin");
        HeaderValue::from_static("")
    })
}

pub async fn cors(origin: HeaderValue, req: Request, next: Next) -> Response {
    let mut response = if req.method() == Method::OPTIONS {
        let mut preflight = (StatusCode::OK, Body::empty()).into_response();
        let headers = preflight.headers_mut();
        headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOW_HEADERS));
        headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOW_METHODS));
        preflight
    } else {
        next.run(req).await
    };
    response
        .headers_mut()
        .insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    response
}
