//! Optional bearer token from `Authorization: Bearer ...` or `X-Authentication`. Never validated.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};

pub const AUTHENTICATION_HEADER: &str = "X-Authentication";

#[derive(Clone, Debug)]
pub struct AuthToken(pub Option<String>);

impl AuthToken {
    pub fn is_present(&self) -> bool {
        self.0.is_some()
    }
}

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthToken
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let bearer = header(parts, axum::http::header::AUTHORIZATION.as_str())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(|s| s.trim().to_string());
        let token = bearer.or_else(|| header(parts, AUTHENTICATION_HEADER).map(str::to_string));
        Ok(AuthToken(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(req: Request<()>) -> AuthToken {
        let (mut parts, _) = req.into_parts();
        AuthToken::from_request_parts(&mut parts, &()).await.unwrap()
    }

    #[tokio::test]
    async fn prefers_bearer_then_custom_header() {
        let t = extract(
            Request::builder()
                .header("Authorization", "Bearer abc")
                .header(AUTHENTICATION_HEADER, "xyz")
                .body(())
                .unwrap(),
        )
        .await;
        assert_eq!(t.0.as_deref(), Some("abc"));

        let t = extract(Request::builder().header("x-authentication", "xyz").body(()).unwrap()).await;
        assert_eq!(t.0.as_deref(), Some("xyz"));

        let t = extract(Request::builder().body(()).unwrap()).await;
        assert!(!t.is_present());
    }
}
