use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use base64::prelude::*;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestId, RequestId};
use tracing::Span;
use uuid::Uuid;

/// Request ID generator using UUID v7 (time-ordered)
#[derive(Clone, Copy)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string();
        Some(RequestId::new(HeaderValue::from_str(&id).unwrap()))
    }
}

/// Custom MakeSpan that includes request_id in the tracing span
#[derive(Clone, Debug)]
pub struct MakeSpanWithRequestId;

impl<B> tower_http::trace::MakeSpan<B> for MakeSpanWithRequestId {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> Span {
        let request_id = request
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");

        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    }
}

pub fn cors_layer(allowed_origins: Vec<String>) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    // If origins list contains "*", allow any origin
    if allowed_origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        // Parse origins into HeaderValue
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(AllowOrigin::list(origins))
    }
}

/// HTTP basic auth gate for the Swagger UI routes.
pub fn basic_auth_middleware(
    valid_credentials: Arc<String>,
) -> impl Fn(
    Request,
    Next,
)
    -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, Response>> + Send>>
       + Clone {
    move |req: Request, next: Next| {
        let credentials = valid_credentials.clone();
        Box::pin(async move {
            let auth_header = req
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|header| header.to_str().ok());

            if let Some(auth_header) = auth_header {
                if let Some(encoded) = auth_header.strip_prefix("Basic ") {
                    if let Ok(decoded) = BASE64_STANDARD.decode(encoded) {
                        if let Ok(creds) = String::from_utf8(decoded) {
                            if creds == *credentials {
                                return Ok(next.run(req).await);
                            }
                        }
                    }
                }
            }

            let response = Response::builder()
                .status(StatusCode::UNAUTHORIZED)
                .header(header::WWW_AUTHENTICATE, "Basic realm=\"Swagger UI\"")
                .body(Body::from("Unauthorized"))
                .unwrap();

            Err(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{middleware::from_fn, routing::get, Router};
    use axum_test::TestServer;

    fn guarded_app() -> Router {
        Router::new()
            .route("/docs", get(|| async { "ok" }))
            .layer(from_fn(basic_auth_middleware(Arc::new(
                "admin:secret".to_string(),
            ))))
    }

    #[tokio::test]
    async fn correct_credentials_pass_through() {
        let server = TestServer::new(guarded_app()).unwrap();
        let encoded = BASE64_STANDARD.encode("admin:secret");

        let response = server
            .get("/docs")
            .add_header(header::AUTHORIZATION, format!("Basic {encoded}"))
            .await;

        response.assert_status_ok();
        response.assert_text("ok");
    }

    #[tokio::test]
    async fn wrong_credentials_get_a_challenge() {
        let server = TestServer::new(guarded_app()).unwrap();
        let encoded = BASE64_STANDARD.encode("admin:nope");

        let response = server
            .get("/docs")
            .add_header(header::AUTHORIZATION, format!("Basic {encoded}"))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.header(header::WWW_AUTHENTICATE),
            "Basic realm=\"Swagger UI\""
        );
    }

    #[tokio::test]
    async fn missing_authorization_header_is_rejected() {
        let server = TestServer::new(guarded_app()).unwrap();

        let response = server.get("/docs").await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn wildcard_config_allows_any_origin() {
        let app = Router::new()
            .route("/ping", get(|| async { "pong" }))
            .layer(cors_layer(vec!["*".to_string()]));
        let server = TestServer::new(app).unwrap();

        let response = server
            .get("/ping")
            .add_header(header::ORIGIN, "https://anywhere.example")
            .await;

        assert_eq!(response.header(header::ACCESS_CONTROL_ALLOW_ORIGIN), "*");
    }

    #[tokio::test]
    async fn listed_origin_is_echoed_back() {
        let app = Router::new()
            .route("/ping", get(|| async { "pong" }))
            .layer(cors_layer(vec!["https://app.example.com".to_string()]));
        let server = TestServer::new(app).unwrap();

        let response = server
            .get("/ping")
            .add_header(header::ORIGIN, "https://app.example.com")
            .await;

        assert_eq!(
            response.header(header::ACCESS_CONTROL_ALLOW_ORIGIN),
            "https://app.example.com"
        );
    }
}
