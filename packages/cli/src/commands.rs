//! Subcommand implementations.
//!
//! Each view renders either as a plain-text table or as pretty-printed
//! JSON carrying the same fields the HTTP API returns.

use std::error::Error;
use std::fs::File;
use std::io::Write as _;
use std::path::Path;

use crowd_flow_analytics::{
    Selection, available_dates, chart_data, current_focus, filter_by_date, hourly_snapshot,
    unique_locations,
};
use crowd_flow_cli_utils::MultiProgress;
use crowd_flow_config::DashboardConfig;
use crowd_flow_ingest::IngestError;
use crowd_flow_observation_models::Observation;
use crowd_flow_playback::PlaybackClock;
use crowd_flow_server::{AppState, ServerOptions, current_hour, flow_view};
use serde::Serialize;

/// A loaded dataset plus the configuration used to interpret it.
pub struct Context {
    /// Normalized observations.
    pub dataset: Vec<Observation>,
    /// Dashboard configuration.
    pub config: DashboardConfig,
}

impl Context {
    /// Loads the dataset and configuration, each from an explicit path,
    /// its environment variable, or the built-in default.
    ///
    /// # Errors
    ///
    /// Returns an error if a named file cannot be read or the configuration
    /// is invalid.
    pub fn load(file: Option<&Path>, config: Option<&Path>) -> Result<Self, Box<dyn Error>> {
        let config = DashboardConfig::load(config)?;
        let dataset = crowd_flow_ingest::load_dataset(file)?;

        if dataset.is_empty() {
            log::warn!("Dataset contains no valid observations");
        }

        Ok(Self { dataset, config })
    }

    /// Resolves optional arguments against the dataset's initial selection.
    /// The hour defaults to the current local hour.
    #[must_use]
    pub fn selection(
        &self,
        date: Option<String>,
        hour: Option<u32>,
        location: Option<String>,
    ) -> Selection {
        let mut selection = Selection::initial(
            &self.dataset,
            hour.unwrap_or_else(current_hour),
            self.config.time.hour_policy,
        );
        if let Some(date) = date {
            selection.date = date;
        }
        if let Some(location) = location {
            selection.location = location;
        }
        selection
    }
}

fn render<T: Serialize + ?Sized>(
    json: bool,
    value: &T,
    text: impl FnOnce(&T) -> String,
) -> Result<String, serde_json::Error> {
    if json {
        serde_json::to_string_pretty(value)
    } else {
        Ok(text(value))
    }
}

/// Distinct dates, ascending.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn dates(ctx: &Context, json: bool) -> Result<String, serde_json::Error> {
    render(json, &available_dates(&ctx.dataset), |dates| dates.join("\n"))
}

/// Locations observed on the selected date.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn locations(ctx: &Context, selection: &Selection, json: bool) -> Result<String, serde_json::Error> {
    let rows = filter_by_date(&ctx.dataset, &selection.date);
    render(json, &unique_locations(&rows), |locations| {
        let mut out = format!("{:<32} {:>11} {:>11}", "NAME", "LAT", "LNG");
        for loc in locations {
            out.push_str(&format!("\n{:<32} {:>11.6} {:>11.6}", loc.name, loc.lat, loc.lng));
        }
        out
    })
}

/// Rows for the selected date and hour, with the focused row marked.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn snapshot(ctx: &Context, selection: &Selection, json: bool) -> Result<String, serde_json::Error> {
    let rows = hourly_snapshot(
        &ctx.dataset,
        &selection.date,
        selection.hour,
        selection.hour_policy,
    );
    let focus = current_focus(&rows, &selection.location);

    render(json, &rows, |rows| {
        let mut out = format!(
            "{} {:02}:00\n  {:<32} {:>10} {:>10}",
            selection.date, selection.hour, "NAME", "COUNT", "OCCUPANCY"
        );
        for obs in rows {
            let marker = if focus.is_some_and(|f| std::ptr::eq(f, *obs)) {
                '*'
            } else {
                ' '
            };
            out.push_str(&format!(
                "\n{marker} {:<32} {:>10.2} {:>10.4}",
                obs.location_name, obs.people_count, obs.people_occupancy
            ));
        }
        out
    })
}

/// Hourly series of the selected location on the selected date.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn series(ctx: &Context, selection: &Selection, json: bool) -> Result<String, serde_json::Error> {
    let rows = filter_by_date(&ctx.dataset, &selection.date);
    let points = chart_data(&rows, &selection.location, selection.hour_policy);

    render(json, &points, |points| {
        let mut out = format!("{} on {}", selection.location, selection.date);
        for point in points {
            out.push_str(&format!("\n{:>6} {:>10.2}", point.time, point.count));
        }
        out
    })
}

/// Link-driven and all-pairs flow estimates for the selected snapshot.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn flows(ctx: &Context, selection: &Selection, json: bool) -> Result<String, serde_json::Error> {
    let view = flow_view(&ctx.dataset, selection, &ctx.config.flow_settings());

    render(json, &view, |view| {
        let mut out = format!("{} {:02}:00\nLinks ({}):", view.date, view.hour, view.links.len());
        for link in &view.links {
            out.push_str(&format!(
                "\n  ({:.5}, {:.5}) -> ({:.5}, {:.5}) {:>14.1} {}",
                link.link.from_lat,
                link.link.from_lng,
                link.link.to_lat,
                link.link.to_lng,
                link.link.volume,
                link.intensity
            ));
        }
        out.push_str(&format!("\nPairs ({}):", view.pairs.len()));
        for pair in &view.pairs {
            let value = pair
                .value
                .map_or_else(|| "undefined".to_string(), |v| format!("{v:.3}"));
            out.push_str(&format!("\n  {} <-> {} {value}", pair.source, pair.target));
        }
        out
    })
}

/// Writes the sample dataset as CSV to `output`, or to stdout.
///
/// # Errors
///
/// Returns [`IngestError`] if the output cannot be written.
pub fn generate(output: Option<&Path>) -> Result<(), IngestError> {
    let dataset = crowd_flow_ingest::synthetic::generate();

    match output {
        Some(path) => {
            crowd_flow_ingest::write_csv(File::create(path)?, &dataset)?;
            log::info!("Wrote {} observations to {}", dataset.len(), path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            crowd_flow_ingest::write_csv(&mut stdout, &dataset)?;
            stdout.flush()?;
        }
    }

    Ok(())
}

/// Runs the playback clock for `steps` advances, redrawing the hourly
/// snapshot summary after each one.
///
/// # Errors
///
/// Returns an error if the clock cannot be created.
pub async fn play(
    ctx: &Context,
    multi: &MultiProgress,
    selection: &Selection,
    steps: u32,
) -> Result<(), Box<dyn Error>> {
    let clock = PlaybackClock::new(selection.hour, ctx.config.playback_period())?;
    let mut cursor = clock.subscribe();

    let bar = crowd_flow_cli_utils::hour_bar(multi, selection.hour);
    bar.set_message(snapshot_summary(ctx, selection, selection.hour));

    clock.start();

    for _ in 0..steps {
        cursor.changed().await?;
        let hour = *cursor.borrow_and_update();
        crowd_flow_cli_utils::set_hour(&bar, hour);
        bar.set_message(snapshot_summary(ctx, selection, hour));
    }

    clock.stop();
    bar.finish();

    Ok(())
}

fn snapshot_summary(ctx: &Context, selection: &Selection, hour: u32) -> String {
    let rows = hourly_snapshot(&ctx.dataset, &selection.date, hour, selection.hour_policy);
    let total: f64 = rows.iter().map(|o| o.people_count).sum();
    let focus = current_focus(&rows, &selection.location)
        .map_or_else(String::new, |f| format!(" | {} {:.0}", f.location_name, f.people_count));

    format!("{} sensors, {total:.0} people{focus}", rows.len())
}

/// Starts the API server over the loaded dataset. Without `options` the
/// user is prompted for the bind address and port.
///
/// # Errors
///
/// Returns an error if the server fails to start.
pub async fn serve(ctx: Context, options: Option<ServerOptions>) -> Result<(), Box<dyn Error>> {
    let state = AppState::new(ctx.dataset, ctx.config, current_hour())?;

    // The server uses actix-web's runtime, so we need to run it
    // in a blocking task to avoid nesting tokio runtimes.
    tokio::task::spawn_blocking(move || {
        let system = actix_web::rt::System::new();
        match options {
            Some(options) => system.block_on(crowd_flow_server::run_server(state, options)),
            None => system.block_on(crowd_flow_server::interactive::run(state)),
        }
    })
    .await??;

    Ok(())
}
