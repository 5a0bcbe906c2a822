//! `GET /api/v1/scraper/{business_id}`: run a scrape and report the result.
//!
//! The request blocks until the run finishes. Failures return a generic
//! message; the detail goes to the log.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use bizscrape_scraper::ScrapeError;
use serde::Serialize;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct ScrapeRunResponse {
    pub status: &'static str,
    pub business_id: String,
    pub services: usize,
    pub faqs: usize,
    pub contact_found: bool,
}

pub(super) async fn run_scraper(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(business_id): Path<String>,
) -> Result<Json<ApiResponse<ScrapeRunResponse>>, ApiError> {
    tracing::info!(business_id = %business_id, request_id = %req_id.0, "scrape requested");

    let report = state
        .controller
        .run(&business_id)
        .await
        .map_err(|e| map_scrape_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: ScrapeRunResponse {
            status: "completed",
            business_id: report.business_id,
            services: report.services,
            faqs: report.faqs,
            contact_found: report.contact_found,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

fn map_scrape_error(request_id: String, error: &ScrapeError) -> ApiError {
    match error {
        ScrapeError::ConfigMissing { business_id, .. } => ApiError::new(
            request_id,
            "not_found",
            format!("no scraper configuration for business {business_id}"),
        ),
        ScrapeError::AlreadyRunning { .. } => ApiError::new(
            request_id,
            "conflict",
            "a scrape for this business is already running",
        ),
        ScrapeError::Store { .. } | ScrapeError::Failed { .. } | ScrapeError::Persistence(_) => {
            tracing::error!(
                business_id = error.business_id(),
                request_id = %request_id,
                error = %error,
                "scrape request failed"
            );
            ApiError::new(request_id, "scrape_failed", "scrape failed")
        }
    }
}
