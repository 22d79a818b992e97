// CORS configuration
// Origins come from ALLOWED_ORIGINS; "*" or an empty list allows any origin

use axum::http::{HeaderValue, Method};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::warn;

pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    if allowed_origins.is_empty() || allowed_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request};
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    async fn allow_origin_for(allowed: &[&str], origin: &str) -> Option<String> {
        let allowed: Vec<String> = allowed.iter().map(|s| s.to_string()).collect();
        let app = Router::new()
            .route("/api/health", get(|| async { "ok" }))
            .layer(cors_layer(&allowed));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .header(header::ORIGIN, origin)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .map(|v| v.to_str().unwrap().to_string())
    }

    #[tokio::test]
    async fn test_listed_origin_is_allowed() {
        let allowed = ["http://localhost:5173", "http://localhost:3000"];
        assert_eq!(
            allow_origin_for(&allowed, "http://localhost:5173").await.as_deref(),
            Some("http://localhost:5173")
        );
        assert!(allow_origin_for(&allowed, "http://evil.example").await.is_none());
    }

    #[tokio::test]
    async fn test_wildcard_and_empty_allow_any() {
        assert_eq!(
            allow_origin_for(&["*"], "http://anywhere.example").await.as_deref(),
            Some("*")
        );
        assert_eq!(
            allow_origin_for(&[], "http://anywhere.example").await.as_deref(),
            Some("*")
        );
    }

    #[tokio::test]
    async fn test_invalid_origin_entries_are_dropped() {
        let allowed = ["http://bad\norigin", "http://localhost:5173"];
        assert_eq!(
            allow_origin_for(&allowed, "http://localhost:5173").await.as_deref(),
            Some("http://localhost:5173")
        );
    }
}
