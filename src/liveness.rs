//! Liveness endpoint for external uptime monitors.

use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;

/// Body returned by `GET /`.
pub const LIVENESS_BODY: &str = "Paper build notifier is running.";

/// Router answering `GET /` with [`LIVENESS_BODY`].
pub fn router() -> Router {
    Router::new().route("/", get(|| async { LIVENESS_BODY }))
}

/// Bind `0.0.0.0:{port}`.
pub async fn bind(port: u16) -> std::io::Result<TcpListener> {
    TcpListener::bind(("0.0.0.0", port)).await
}

/// Serve the liveness router until the process exits.
pub async fn serve(listener: TcpListener) -> std::io::Result<()> {
    let local_addr = listener.local_addr()?;
    tracing::info!("liveness endpoint listening on http://{local_addr}");
    axum::serve(listener, router()).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[tokio::test]
    async fn root_returns_static_body() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(serve(listener));

        let response = reqwest::get(format!("http://{addr}/")).await.unwrap();
        assert!(response.status().is_success());
        assert_eq!(response.text().await.unwrap(), LIVENESS_BODY);

        let missing = reqwest::get(format!("http://{addr}/other")).await.unwrap();
        assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);

        handle.abort();
    }
}
