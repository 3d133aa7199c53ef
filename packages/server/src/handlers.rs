//! HTTP handler functions for the crowd-flow API.

use actix_web::{HttpResponse, web};
use crowd_flow_analytics::{
    DashboardView, DatasetSummary, available_dates, chart_data, current_focus, filter_by_date,
    hourly_snapshot, unique_locations,
};
use crowd_flow_observation_models::Observation;
use crowd_flow_playback::PlaybackError;
use crowd_flow_server_models::{
    ApiError, ApiHealth, ApiPlaybackStatus, SetHourRequest, ViewQueryParams,
};

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/summary`
pub async fn summary(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(DatasetSummary::of(&state.dataset()))
}

/// `GET /api/dates`
pub async fn dates(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(available_dates(&state.dataset()))
}

/// `GET /api/locations`
///
/// Locations observed on the selected date, in first-seen order.
pub async fn locations(
    state: web::Data<AppState>,
    params: web::Query<ViewQueryParams>,
) -> HttpResponse {
    let dataset = state.dataset();
    let selection = match state.selection(&dataset, &params) {
        Ok(selection) => selection,
        Err(e) => return bad_request(&e),
    };
    let rows = filter_by_date(&dataset, &selection.date);

    HttpResponse::Ok().json(unique_locations(&rows))
}

/// `GET /api/snapshot`
pub async fn snapshot(
    state: web::Data<AppState>,
    params: web::Query<ViewQueryParams>,
) -> HttpResponse {
    let dataset = state.dataset();
    let selection = match state.selection(&dataset, &params) {
        Ok(selection) => selection,
        Err(e) => return bad_request(&e),
    };
    let rows = hourly_snapshot(
        &dataset,
        &selection.date,
        selection.hour,
        selection.hour_policy,
    );

    HttpResponse::Ok().json(rows)
}

/// `GET /api/focus`
///
/// The snapshot row for the selected location, the first snapshot row if
/// that location is absent, or `{}` for an empty snapshot.
pub async fn focus(state: web::Data<AppState>, params: web::Query<ViewQueryParams>) -> HttpResponse {
    let dataset = state.dataset();
    let selection = match state.selection(&dataset, &params) {
        Ok(selection) => selection,
        Err(e) => return bad_request(&e),
    };
    let rows = hourly_snapshot(
        &dataset,
        &selection.date,
        selection.hour,
        selection.hour_policy,
    );

    match current_focus(&rows, &selection.location) {
        Some(obs) => HttpResponse::Ok().json(obs),
        None => HttpResponse::Ok().json(serde_json::json!({})),
    }
}

/// `GET /api/series`
pub async fn series(
    state: web::Data<AppState>,
    params: web::Query<ViewQueryParams>,
) -> HttpResponse {
    let dataset = state.dataset();
    let selection = match state.selection(&dataset, &params) {
        Ok(selection) => selection,
        Err(e) => return bad_request(&e),
    };
    let rows = filter_by_date(&dataset, &selection.date);

    HttpResponse::Ok().json(chart_data(
        &rows,
        &selection.location,
        selection.hour_policy,
    ))
}

/// `GET /api/flows`
///
/// Link-driven volumes with rendering hints, plus all-pairs volumes, for
/// the selected snapshot.
pub async fn flows(state: web::Data<AppState>, params: web::Query<ViewQueryParams>) -> HttpResponse {
    let dataset = state.dataset();
    let selection = match state.selection(&dataset, &params) {
        Ok(selection) => selection,
        Err(e) => return bad_request(&e),
    };

    HttpResponse::Ok().json(crate::flow_view(
        &dataset,
        &selection,
        &state.config.flow_settings(),
    ))
}

/// `GET /api/dashboard`
///
/// Every derived view for the selection in one response.
pub async fn dashboard(
    state: web::Data<AppState>,
    params: web::Query<ViewQueryParams>,
) -> HttpResponse {
    let dataset = state.dataset();
    let selection = match state.selection(&dataset, &params) {
        Ok(selection) => selection,
        Err(e) => return bad_request(&e),
    };

    HttpResponse::Ok().json(DashboardView::compute(
        &dataset,
        &selection,
        &state.config.flow_settings(),
    ))
}

/// `PUT /api/dataset`
///
/// Replaces the dataset with the CSV in the request body. A body that
/// yields no observations leaves the current dataset in place.
pub async fn upload_dataset(state: web::Data<AppState>, body: web::Bytes) -> HttpResponse {
    let text = match std::str::from_utf8(&body) {
        Ok(text) => text,
        Err(e) => {
            log::warn!("Rejected upload: {e}");
            return HttpResponse::BadRequest().json(ApiError::new(format!(
                "Upload is not valid UTF-8: {e}"
            )));
        }
    };

    let dataset: Vec<Observation> = crowd_flow_ingest::normalize_text(text);
    if dataset.is_empty() {
        log::warn!("Rejected upload of {} bytes: no valid rows", body.len());
        return HttpResponse::UnprocessableEntity()
            .json(ApiError::new("Upload contained no valid observations"));
    }

    let summary = DatasetSummary::of(&dataset);
    log::info!(
        "Loaded {} observations over {} days from upload",
        summary.observations,
        summary.days
    );
    state.replace_dataset(dataset);

    HttpResponse::Ok().json(summary)
}

/// `GET /api/playback`
pub async fn playback_status(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(status_of(&state))
}

/// `POST /api/playback/start`
pub async fn playback_start(state: web::Data<AppState>) -> HttpResponse {
    state.clock.start();
    HttpResponse::Ok().json(status_of(&state))
}

/// `POST /api/playback/stop`
pub async fn playback_stop(state: web::Data<AppState>) -> HttpResponse {
    state.clock.stop();
    HttpResponse::Ok().json(status_of(&state))
}

/// `PUT /api/playback/hour`
pub async fn playback_set_hour(
    state: web::Data<AppState>,
    body: web::Json<SetHourRequest>,
) -> HttpResponse {
    match state.clock.set_hour(body.hour) {
        Ok(()) => HttpResponse::Ok().json(status_of(&state)),
        Err(e) => bad_request(&e),
    }
}

fn bad_request(error: &PlaybackError) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiError::new(error.to_string()))
}

fn status_of(state: &AppState) -> ApiPlaybackStatus {
    ApiPlaybackStatus {
        hour: state.clock.hour(),
        playing: state.clock.is_playing(),
        period_ms: u64::try_from(state.clock.period().as_millis()).unwrap_or(u64::MAX),
    }
}
