use std::collections::BTreeMap;

use axum::{extract::State, response::Json};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use form_engine::stats::{self, DailyCount, DASHBOARD_WINDOW_DAYS};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{api_success, ApiResponse, ApiResult};
use crate::handlers::submissions::SubmissionSummary;
use crate::server::IntakeServer;

const RECENT_SUBMISSIONS: i64 = 5;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub total_submissions: i64,
    pub today_submissions: i64,
    pub last_submission_at: Option<DateTime<Utc>>,
    pub recent_submissions: Vec<SubmissionSummary>,
    /// Oldest first, days without submissions included as zero
    pub last_7_days: Vec<DailyCount>,
}

fn start_of(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

/// Submission counts for the admin landing page. Days are UTC.
#[utoipa::path(
    get,
    path = "/api/v1/intake/dashboard",
    responses(
        (status = 200, description = "Submission statistics", body = Dashboard)
    ),
    tag = "submissions"
)]
pub async fn dashboard(State(server): State<IntakeServer>) -> ApiResult<Json<ApiResponse<Dashboard>>> {
    let today = server.clock.now().date_naive();
    let today_start = start_of(today);

    let total_submissions = server.store.count_submissions().await?;
    let today_submissions = server
        .store
        .count_submissions_between(today_start, today_start + chrono::Duration::days(1))
        .await?;
    let recent = server.store.list_submissions(0, RECENT_SUBMISSIONS).await?;

    let since = start_of(stats::window_start(today, DASHBOARD_WINDOW_DAYS));
    let counts: BTreeMap<NaiveDate, i64> = server
        .store
        .daily_submission_counts(since)
        .await?
        .into_iter()
        .map(|c| (c.day, c.count))
        .collect();

    Ok(Json(api_success(Dashboard {
        total_submissions,
        today_submissions,
        last_submission_at: recent.first().map(|r| r.created_at),
        recent_submissions: recent.iter().map(SubmissionSummary::from).collect(),
        last_7_days: stats::fill_daily_counts(today, DASHBOARD_WINDOW_DAYS, &counts),
    })))
}
