//! # Prometheus Metrics
//!
//! Request counters via the `metrics` facade, exported in Prometheus text
//! format at `/metrics`.
//!
//! | Metric | Labels |
//! |--------|--------|
//! | `rxtrace_http_requests_total` | `method`, `status` |
//! | `rxtrace_http_errors_total` | `method`, `status` |
//! | `rxtrace_transitions_total` | `op`, `outcome` (recorded by the applier) |

use std::sync::OnceLock;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// The process-wide Prometheus handle, installing the recorder on first use.
///
/// If another recorder is already installed, a detached handle is returned
/// and `/metrics` renders only what this handle saw.
pub fn prometheus_handle() -> PrometheusHandle {
    HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!(error = %e, "metrics recorder already installed, /metrics detached");
                PrometheusBuilder::new().build_recorder().handle()
            }
        })
        .clone()
}

/// Middleware that counts requests and error responses.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let method = request.method().as_str().to_string();

    let response = next.run(request).await;

    let status = response.status();
    let labels = [
        ("method", method),
        ("status", status.as_u16().to_string()),
    ];
    metrics::counter!("rxtrace_http_requests_total", &labels).increment(1);
    if status.is_client_error() || status.is_server_error() {
        metrics::counter!("rxtrace_http_errors_total", &labels).increment(1);
    }

    response
}

/// GET /metrics — Prometheus text exposition.
pub async fn render() -> String {
    prometheus_handle().render()
}
