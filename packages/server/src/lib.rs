#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the crowd-flow dashboard.
//!
//! Serves the dashboard views (dates, locations, hourly snapshot, series,
//! flow estimates) as JSON, accepts CSV uploads that replace the dataset
//! wholesale, and exposes the playback cursor. All views are recomputed
//! per request from the current dataset.

mod handlers;
pub mod interactive;

use std::sync::{Arc, PoisonError, RwLock};

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use chrono::Timelike as _;
use crowd_flow_analytics::{Selection, hourly_snapshot};
use crowd_flow_config::DashboardConfig;
use crowd_flow_gravity::style::style_links;
use crowd_flow_observation_models::{FlowSettings, Observation};
use crowd_flow_playback::{PlaybackClock, PlaybackError, check_hour};
use crowd_flow_server_models::{ApiFlows, ApiLinkVolume, ViewQueryParams};

/// Largest accepted CSV upload, in bytes.
pub const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Where the server listens.
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Address to bind.
    pub bind_addr: String,
    /// Port to bind.
    pub port: u16,
}

impl ServerOptions {
    /// Reads `BIND_ADDR` and `PORT`, defaulting to `127.0.0.1:8080`.
    #[must_use]
    pub fn from_env() -> Self {
        let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);
        Self { bind_addr, port }
    }
}

/// The local wall-clock hour, used as the initial playback position.
#[must_use]
pub fn current_hour() -> u32 {
    chrono::Local::now().hour()
}

/// Shared application state.
pub struct AppState {
    /// Current dataset. Replaced wholesale on upload.
    dataset: RwLock<Arc<Vec<Observation>>>,
    /// Dashboard configuration.
    pub config: DashboardConfig,
    /// Playback cursor.
    pub clock: PlaybackClock,
}

impl AppState {
    /// Creates the state with a paused playback cursor at `initial_hour`.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError`] if `initial_hour` is out of range or the
    /// configured period is zero.
    pub fn new(
        dataset: Vec<Observation>,
        config: DashboardConfig,
        initial_hour: u32,
    ) -> Result<Self, PlaybackError> {
        let clock = PlaybackClock::new(initial_hour, config.playback_period())?;
        Ok(Self {
            dataset: RwLock::new(Arc::new(dataset)),
            config,
            clock,
        })
    }

    /// The current dataset.
    #[must_use]
    pub fn dataset(&self) -> Arc<Vec<Observation>> {
        Arc::clone(&self.dataset.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Replaces the dataset.
    pub fn replace_dataset(&self, dataset: Vec<Observation>) {
        *self.dataset.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(dataset);
    }

    /// Resolves request parameters against the dataset's initial selection
    /// and the playback cursor.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::HourOutOfRange`] if the requested hour is
    /// not in `0..24`.
    pub fn selection(
        &self,
        dataset: &[Observation],
        params: &ViewQueryParams,
    ) -> Result<Selection, PlaybackError> {
        let mut selection = Selection::initial(
            dataset,
            self.clock.hour(),
            self.config.time.hour_policy,
        );
        if let Some(date) = &params.date {
            selection.date.clone_from(date);
        }
        if let Some(hour) = params.hour {
            check_hour(hour)?;
            selection.hour = hour;
        }
        if let Some(location) = &params.location {
            selection.location.clone_from(location);
        }
        Ok(selection)
    }
}

/// Link-driven volumes with rendering hints, plus all-pairs volumes, for
/// the snapshot a selection picks out.
#[must_use]
pub fn flow_view(dataset: &[Observation], selection: &Selection, flow: &FlowSettings) -> ApiFlows {
    let snapshot = hourly_snapshot(
        dataset,
        &selection.date,
        selection.hour,
        selection.hour_policy,
    );
    let points = crowd_flow_gravity::points_from_snapshot(&snapshot);

    let link_volumes = crowd_flow_gravity::link_volumes(&points, &flow.links, &flow.link_params);
    let styles = style_links(&link_volumes);
    let links = link_volumes
        .into_iter()
        .zip(styles)
        .map(|(link, style)| ApiLinkVolume::new(link, style))
        .collect();

    ApiFlows {
        date: selection.date.clone(),
        hour: selection.hour,
        links,
        pairs: crowd_flow_gravity::all_pair_volumes(&points, &flow.pair_params),
    }
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(web::PayloadConfig::new(MAX_UPLOAD_BYTES))
            .route("/health", web::get().to(handlers::health))
            .route("/summary", web::get().to(handlers::summary))
            .route("/dates", web::get().to(handlers::dates))
            .route("/locations", web::get().to(handlers::locations))
            .route("/snapshot", web::get().to(handlers::snapshot))
            .route("/focus", web::get().to(handlers::focus))
            .route("/series", web::get().to(handlers::series))
            .route("/flows", web::get().to(handlers::flows))
            .route("/dashboard", web::get().to(handlers::dashboard))
            .route("/dataset", web::put().to(handlers::upload_dataset))
            .route("/playback", web::get().to(handlers::playback_status))
            .route("/playback/start", web::post().to(handlers::playback_start))
            .route("/playback/stop", web::post().to(handlers::playback_stop))
            .route("/playback/hour", web::put().to(handlers::playback_set_hour)),
    );
}

/// Starts the crowd-flow API server.
///
/// This is a regular async function; the caller provides the async
/// runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server(state: AppState, options: ServerOptions) -> std::io::Result<()> {
    log::info!(
        "Serving {} observations ({} links configured)",
        state.dataset().len(),
        state.config.links.len()
    );

    let state = web::Data::new(state);

    log::info!("Starting server on {}:{}", options.bind_addr, options.port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((options.bind_addr, options.port))?
    .run()
    .await
}
