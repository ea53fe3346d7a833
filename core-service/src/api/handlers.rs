//! Route handlers

use axum::body::Body;
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bridge_traits::Station;
use provider_radio_browser::{Facet, SearchParams, StationQuery};
use serde::Deserialize;
use tracing::debug;

use super::response::{ApiError, ApiResponse, CheckResponse};
use super::server::AppState;

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Flat form of [`SearchParams`]; query strings cannot fill a flattened struct
/// with typed numbers.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub name: Option<String>,
    pub country: Option<String>,
    pub tag: Option<String>,
    pub language: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub order: Option<String>,
}

impl From<SearchQuery> for SearchParams {
    fn from(q: SearchQuery) -> Self {
        let defaults = StationQuery::default();
        SearchParams {
            name: q.name,
            country: q.country,
            tag: q.tag,
            language: q.language,
            query: StationQuery {
                limit: q.limit.unwrap_or(defaults.limit),
                offset: q.offset.unwrap_or(defaults.offset),
                order: q.order.unwrap_or(defaults.order),
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct StreamQuery {
    pub url: Option<String>,
}

impl StreamQuery {
    fn url(&self) -> Option<&str> {
        self.url.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }
}

/// `GET /api/stations/{country}`
pub async fn stations_by_country(
    State(state): State<AppState>,
    Path(country): Path<String>,
    query: Result<Query<StationQuery>, QueryRejection>,
) -> ApiResult<Vec<Station>> {
    let Query(query) = query?;
    let stations = state.directory.list_by_country(&country, &query).await?;
    debug!(country = %country, count = stations.len(), "Listed stations");
    Ok(Json(ApiResponse::success(stations)))
}

/// `GET /api/stations/search`
pub async fn search_stations(
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> ApiResult<Vec<Station>> {
    let Query(query) = query?;
    let params = SearchParams::from(query);
    let stations = state.directory.search(&params).await?;
    Ok(Json(ApiResponse::success(stations)))
}

/// `GET /api/stations/top/{count}`
pub async fn top_stations(
    State(state): State<AppState>,
    count: Result<Path<String>, PathRejection>,
) -> ApiResult<Vec<Station>> {
    let Path(count) = count?;
    let count: u32 = count
        .trim()
        .parse()
        .map_err(|_| ApiError::bad_request(format!("Invalid station count: {}", count)))?;
    let stations = state.directory.top_clicked(count).await?;
    Ok(Json(ApiResponse::success(stations)))
}

pub async fn languages(State(state): State<AppState>) -> ApiResult<Vec<Facet>> {
    Ok(Json(ApiResponse::success(state.directory.languages().await?)))
}

pub async fn tags(State(state): State<AppState>) -> ApiResult<Vec<Facet>> {
    Ok(Json(ApiResponse::success(state.directory.tags().await?)))
}

/// `GET /api/stream/check/{stationId}?url=`
///
/// Never fails: a missing URL or a dead origin is reported as
/// `healthy:false` inside a successful envelope.
pub async fn check_stream(
    State(state): State<AppState>,
    Path(station_id): Path<String>,
    query: Result<Query<StreamQuery>, QueryRejection>,
) -> Json<CheckResponse> {
    let query = query.map(|Query(q)| q).unwrap_or_default();
    let Some(url) = query.url() else {
        return Json(CheckResponse::missing_url());
    };

    let result = state.prober.check(&station_id, url).await;
    Json(CheckResponse::from(result))
}

/// `GET /api/stream/{stationId}?url=`
pub async fn relay_stream(
    State(state): State<AppState>,
    Path(station_id): Path<String>,
    query: Result<Query<StreamQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let url = query
        .url()
        .ok_or_else(|| ApiError::bad_request("Stream URL is required"))?;

    let relay = state.relay.open(&station_id, url).await?;

    let headers = [
        (CONTENT_TYPE, relay.content_type),
        (CACHE_CONTROL, "no-cache, no-store".to_string()),
        (ACCESS_CONTROL_ALLOW_ORIGIN, "*".to_string()),
    ];
    Ok((headers, Body::from_stream(relay.body)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_query_fills_defaults() {
        let params = SearchParams::from(SearchQuery {
            tag: Some("jazz".to_string()),
            limit: Some(10),
            ..SearchQuery::default()
        });

        assert_eq!(params.tag.as_deref(), Some("jazz"));
        assert_eq!(params.query.limit, 10);
        assert_eq!(params.query.offset, 0);
        assert_eq!(params.query.order, "clickcount");
    }

    #[test]
    fn test_blank_stream_url_is_missing() {
        let query = StreamQuery {
            url: Some("  ".to_string()),
        };
        assert!(query.url().is_none());
    }
}
