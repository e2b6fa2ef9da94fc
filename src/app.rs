use anyhow::Context;
use axum::{
    body::Body,
    http::{header, HeaderValue, Method, Request},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::auth;
use crate::handlers;
use crate::AppState;

/// Request span without the query string; `/ws` carries the access token there.
fn request_span(req: &Request<Body>) -> tracing::Span {
    tracing::debug_span!(
        "request",
        method = %req.method(),
        path = %req.uri().path(),
        version = ?req.version(),
    )
}

fn cors_layer(state: &AppState) -> anyhow::Result<CorsLayer> {
    let origins = state
        .config
        .allowed_origins()
        .into_iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("Invalid CORS origin {:?}", origin))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true))
}

pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let auth_routes = Router::new()
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/refresh", post(handlers::auth::refresh))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::rate_limit::limit_auth_attempts,
        ));

    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz))
        .route("/ws", get(handlers::ws::ws_handler))
        .merge(auth_routes);

    let protected_routes = Router::new()
        .route("/api/me", get(handlers::auth::me))
        .route("/api/auth/logout", post(handlers::auth::logout))
        // Habits
        .route(
            "/api/habits",
            get(handlers::habits::list_habits).post(handlers::habits::create_habit),
        )
        .route(
            "/api/habits/:id",
            get(handlers::habits::get_habit)
                .put(handlers::habits::update_habit)
                .delete(handlers::habits::delete_habit),
        )
        .route("/api/habits/:id/stats", get(handlers::stats::get_habit_stats))
        // Logs
        .route(
            "/api/logs",
            get(handlers::logs::list_logs).post(handlers::logs::upsert_log),
        )
        .route("/api/logs/calendar", get(handlers::logs::get_calendar))
        .route("/api/logs/activity", get(handlers::logs::get_activity))
        // Stats
        .route("/api/stats", get(handlers::stats::get_stats))
        .route("/api/achievements", get(handlers::stats::get_achievements))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_auth,
        ));

    let cors = cors_layer(&state)?;

    Ok(Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .with_state(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{create_token_pair, tests::test_config};
    use axum::http::StatusCode;
    use http_body_util::BodyExt;
    use sqlx::postgres::PgPoolOptions;
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;
    use uuid::Uuid;

    // The pool never connects; these routes are rejected or answered before any query runs.
    fn test_state() -> AppState {
        let config = test_config();
        let db = PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .unwrap();
        AppState::new(db, Arc::new(config))
    }

    async fn send(request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let app = build_router(test_state()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn test_health_check() {
        let (status, body) = send(Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "habitlog-api");
    }

    #[tokio::test]
    async fn test_stats_requires_bearer_token() {
        let (status, body) = send(Request::get("/api/stats").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], 401);
    }

    #[tokio::test]
    async fn test_garbage_token_rejected() {
        let request = Request::get("/api/habits")
            .header("Authorization", "Bearer not-a-jwt")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_refresh_token_cannot_authorize_requests() {
        let pair = create_token_pair(Uuid::new_v4(), "ada@example.com", &test_config()).unwrap();
        let request = Request::get("/api/achievements")
            .header("Authorization", format!("Bearer {}", pair.refresh_token))
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_cors_preflight_allows_frontend() {
        let config = test_config();
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/habits")
            .header(header::ORIGIN, config.frontend_url.as_str())
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();

        let app = build_router(test_state()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .and_then(|v| v.to_str().ok()),
            Some(config.frontend_url.as_str())
        );
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_request_logs_omit_query_string() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let request = Request::get("/ws?token=secret-access-token")
            .body(Body::empty())
            .unwrap();
        let _ = send(request).await;

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("path=/ws"), "request span missing: {}", output);
        assert!(!output.contains("secret-access-token"));
    }
}
