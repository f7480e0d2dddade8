use crate::guard;
use anyhow::{Context, Result};
use axum::{
    Router,
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    middleware,
    routing::get,
};
use std::path::{Path, PathBuf};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer,
    services::{ServeDir, ServeFile},
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{Span, info, info_span};
use ulid::Ulid;

pub mod handlers;

/// Build the edge router: `/health` is open, every other path goes through the
/// route guard and then to the dashboard bundle with an SPA fallback.
#[must_use]
pub fn router(static_dir: &Path) -> Router {
    let pages = ServeDir::new(static_dir).fallback(ServeFile::new(static_dir.join("index.html")));

    let guarded = Router::new()
        .fallback_service(pages)
        .layer(middleware::from_fn(guard::route_guard));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(guarded)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span)),
        )
}

/// Start the server
/// # Errors
/// Return error if the static directory is missing or the listener fails
pub async fn new(port: u16, static_dir: PathBuf) -> Result<()> {
    if !static_dir.is_dir() {
        anyhow::bail!(
            "Static directory does not exist: {}",
            static_dir.display()
        );
    }

    let app = router(&static_dir);

    let listener = TcpListener::bind(format!("::0:{port}"))
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Gracefully shutdown");
            }
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
