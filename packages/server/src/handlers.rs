//! HTTP handler functions for the London crime API.
//!
//! Every query runs on the blocking thread pool via [`web::block`]. Store
//! failures are logged and answered with a generic 500.

use std::sync::Arc;

use actix_web::{HttpResponse, web};
use london_crime_analytics::filter::RecordFilterBuilder;
use london_crime_analytics::{AnalyticsError, queries, ranking, trend};
use london_crime_analytics_models::RankingOutcome;
use london_crime_database::RecordStore;
use london_crime_database_models::RecordFilter;
use london_crime_server_models::{
    ApiError, ApiHealth, BoroughsQueryParams, CrimeQueryParams, RankingQueryParams,
    SubgroupsQueryParams,
};
use serde::Serialize;

use crate::AppState;

fn record_filter(params: &CrimeQueryParams) -> RecordFilter {
    RecordFilterBuilder::new()
        .start_period(params.start_date.as_deref())
        .end_period(params.end_date.as_deref())
        .borough(params.borough.as_deref())
        .offence_group(params.offence_group.as_deref())
        .offence_groups(params.offence_groups.as_deref())
        .offence_subgroup(params.offence_subgroup.as_deref())
        .area_type(params.area_type.as_deref())
        .build()
}

fn internal_error(what: &str) -> HttpResponse {
    HttpResponse::InternalServerError().json(ApiError::new(format!("Failed to {what}")))
}

/// Runs `query` against the store off the async workers and serializes
/// its result.
async fn run_query<T, F>(state: &web::Data<AppState>, what: &'static str, query: F) -> HttpResponse
where
    T: Serialize + Send + 'static,
    F: FnOnce(&dyn RecordStore) -> Result<T, AnalyticsError> + Send + 'static,
{
    let store = Arc::clone(&state.store);

    match web::block(move || query(store.as_ref())).await {
        Ok(Ok(value)) => HttpResponse::Ok().json(value),
        Ok(Err(e)) => {
            log::error!("Failed to {what}: {e}");
            internal_error(what)
        }
        Err(e) => {
            log::error!("Blocking task failed while trying to {what}: {e}");
            internal_error(what)
        }
    }
}

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/summary/`
///
/// Total offences and change percentages for the filtered slice.
pub async fn summary(
    state: web::Data<AppState>,
    params: web::Query<CrimeQueryParams>,
) -> HttpResponse {
    let filter = record_filter(&params);
    run_query(&state, "compute summary", move |store| {
        trend::summary(store, &filter)
    })
    .await
}

/// `GET /api/boroughs/`
pub async fn boroughs(
    state: web::Data<AppState>,
    params: web::Query<BoroughsQueryParams>,
) -> HttpResponse {
    let area_type = params.into_inner().area_type;
    run_query(&state, "list boroughs", move |store| {
        queries::boroughs(store, area_type.as_deref())
    })
    .await
}

/// `GET /api/area-types/`
pub async fn area_types(state: web::Data<AppState>) -> HttpResponse {
    run_query(&state, "list area types", queries::area_types).await
}

/// `GET /api/offence-groups/`
pub async fn offence_groups(state: web::Data<AppState>) -> HttpResponse {
    run_query(&state, "list offence groups", queries::offence_groups).await
}

/// `GET /api/offence-subgroups/`
pub async fn offence_subgroups(
    state: web::Data<AppState>,
    params: web::Query<SubgroupsQueryParams>,
) -> HttpResponse {
    let group = params.into_inner().offence_group;
    run_query(&state, "list offence subgroups", move |store| {
        queries::offence_subgroups(store, group.as_deref())
    })
    .await
}

/// `GET /api/date-range/`
pub async fn date_range(state: web::Data<AppState>) -> HttpResponse {
    run_query(&state, "read date range", queries::date_range).await
}

/// `GET /api/borough-totals/`
///
/// Offences per area for map shading.
pub async fn borough_totals(
    state: web::Data<AppState>,
    params: web::Query<CrimeQueryParams>,
) -> HttpResponse {
    let filter = record_filter(&params);
    run_query(&state, "compute borough totals", move |store| {
        queries::borough_totals(store, &filter)
    })
    .await
}

/// `GET /api/time-series/`
pub async fn time_series(
    state: web::Data<AppState>,
    params: web::Query<CrimeQueryParams>,
) -> HttpResponse {
    let filter = record_filter(&params);
    run_query(&state, "compute time series", move |store| {
        queries::time_series(store, &filter)
    })
    .await
}

/// `GET /api/offence-breakdown/`
///
/// Broken down by subgroup when a single `offence_group` is given, by
/// group otherwise.
pub async fn offence_breakdown(
    state: web::Data<AppState>,
    params: web::Query<CrimeQueryParams>,
) -> HttpResponse {
    let filter = record_filter(&params);
    let mode = queries::breakdown_mode(&filter);
    run_query(&state, "compute offence breakdown", move |store| {
        queries::offence_breakdown(store, &filter, mode)
    })
    .await
}

/// `GET /api/borough-ranking/`
///
/// Ranks the borough a postcode falls in. Missing or unrecognised
/// postcodes get a 400, boroughs with no data in the category a 404.
pub async fn borough_ranking(
    state: web::Data<AppState>,
    params: web::Query<RankingQueryParams>,
) -> HttpResponse {
    let RankingQueryParams {
        postcode,
        offence_group,
    } = params.into_inner();
    let store = Arc::clone(&state.store);
    let resolver = state.resolver;

    let outcome = web::block(move || {
        ranking::borough_ranking(
            store.as_ref(),
            resolver,
            postcode.as_deref(),
            offence_group.as_deref(),
        )
    })
    .await;

    match outcome {
        Ok(Ok(RankingOutcome::Ranked(result))) => HttpResponse::Ok().json(result),
        Ok(Ok(RankingOutcome::Miss(miss))) => {
            let body = ApiError::new(miss.message());
            if miss.is_bad_request() {
                HttpResponse::BadRequest().json(body)
            } else {
                HttpResponse::NotFound().json(body)
            }
        }
        Ok(Err(e)) => {
            log::error!("Failed to rank boroughs: {e}");
            internal_error("rank boroughs")
        }
        Err(e) => {
            log::error!("Blocking task failed while ranking boroughs: {e}");
            internal_error("rank boroughs")
        }
    }
}
