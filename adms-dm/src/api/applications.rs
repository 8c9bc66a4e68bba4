//! Paginated application list endpoint
//!
//! Served read-through: a resident page is returned as-is; a miss is built
//! from the flat cache and stored under its query key, where the reconciler
//! keeps it current as change events arrive.

use axum::extract::{Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use adms_common::models::ApplicationSummary;

use super::ApiError;
use crate::cache::ListKey;
use crate::filter::ApplicationFilter;
use crate::pagination::{calculate_pagination, PAGE_SIZE};
use crate::AppState;

/// Query parameters for the application list
///
/// Dimension parameters accept the `all` sentinel (or an empty string) to
/// mean "no filter".
#[derive(Debug, Deserialize)]
pub struct ApplicationsQuery {
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    pub page: u64,
    pub status: Option<String>,
    pub program: Option<String>,
    pub institution: Option<String>,
    pub payment_status: Option<String>,
    #[serde(default)]
    pub mine: bool,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub search: Option<String>,
}

fn default_page() -> u64 {
    1
}

impl ApplicationsQuery {
    fn to_filter(&self) -> Result<ApplicationFilter, ApiError> {
        Ok(ApplicationFilter {
            status: parse_dimension(self.status.as_deref())?,
            program: text_dimension(self.program.clone()),
            institution: text_dimension(self.institution.clone()),
            payment_status: parse_dimension(self.payment_status.as_deref())?,
            mine: self.mine,
            date_from: self.date_from,
            date_to: self.date_to,
            search: self
                .search
                .clone()
                .filter(|term| !term.trim().is_empty()),
        })
    }
}

/// Parse an enum dimension, mapping the `all` sentinel to "no filter"
fn parse_dimension<T>(raw: Option<&str>) -> Result<Option<T>, ApiError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None | Some("all") | Some("") => Ok(None),
        Some(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|e| ApiError::BadRequest(e.to_string())),
    }
}

/// Text dimensions pass through unless absent or the `all` sentinel
fn text_dimension(raw: Option<String>) -> Option<String> {
    raw.filter(|value| !value.is_empty() && value != "all")
}

/// Application list response with pagination metadata
#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub applications: Vec<ApplicationSummary>,
    pub total_count: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
}

/// GET /api/applications
pub async fn list_applications(
    State(state): State<AppState>,
    Query(query): Query<ApplicationsQuery>,
) -> Result<Json<ListResponse>, ApiError> {
    let filter = query.to_filter()?;
    let key = ListKey::new(filter, query.page.max(1), PAGE_SIZE);

    let page = state.cache.fetch_or_build_page(&key).await;
    let p = calculate_pagination(page.total_count, key.page);

    Ok(Json(ListResponse {
        applications: page.applications,
        total_count: page.total_count,
        page: p.page,
        page_size: PAGE_SIZE,
        total_pages: p.total_pages,
    }))
}
