use actix_web::HttpResponse;

use crate::{adapters::http::errors::ApiError, infrastructure::metrics};

/// Prometheus text exposition
/// GET /metrics
pub async fn metrics_handler() -> Result<HttpResponse, ApiError> {
  let body = metrics::gather_metrics().map_err(|e| ApiError::Internal(e.to_string()))?;
  Ok(
    HttpResponse::Ok()
      .content_type("text/plain; version=0.0.4")
      .body(body),
  )
}
